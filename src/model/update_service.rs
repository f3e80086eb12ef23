/*
 * SPDX-License-Identifier: MIT
 *
 * Permission is hereby granted, free of charge, to any person obtaining a
 * copy of this software and associated documentation files (the "Software"),
 * to deal in the Software without restriction, including without limitation
 * the rights to use, copy, modify, merge, publish, distribute, sublicense,
 * and/or sell copies of the Software, and to permit persons to whom the
 * Software is furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in
 * all copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL
 * THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
 * FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
 * DEALINGS IN THE SOFTWARE.
 */
use serde::{Deserialize, Serialize};

/// https://redfish.dmtf.org/schemas/v1/UpdateService.v1_14_0.json
/// Body of the UpdateService.SimpleUpdate action.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct SimpleUpdateRequest {
    #[serde(rename = "ImageURI")]
    pub image_uri: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub targets: Vec<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::SimpleUpdateRequest;

    // test_simple_update_body tests that the action body carries the
    // uppercase ImageURI key the schema requires, and no empty Targets.
    #[test]
    fn test_simple_update_body() {
        let body = SimpleUpdateRequest {
            image_uri: "/fwrepo/xd220v.hpm".to_string(),
            targets: vec![],
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"ImageURI": "/fwrepo/xd220v.hpm"})
        );
    }

    #[test]
    fn test_simple_update_body_with_targets() {
        let body = SimpleUpdateRequest {
            image_uri: "/fwrepo/xd665.hpm".to_string(),
            targets: vec!["/redfish/v1/UpdateService/FirmwareInventory/BMC".to_string()],
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "ImageURI": "/fwrepo/xd665.hpm",
                "Targets": ["/redfish/v1/UpdateService/FirmwareInventory/BMC"]
            })
        );
    }
}
