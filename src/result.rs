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
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::UpdateError;

/// What the remote service said about one operation. `ret` is the success
/// flag; anything else the service returned rides in `extra` so a failure
/// report never loses diagnostic fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperationResult {
    pub ret: bool,
    #[serde(default)]
    pub msg: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OperationResult {
    pub fn success(msg: &str) -> OperationResult {
        OperationResult {
            ret: true,
            msg: msg.to_string(),
            extra: Map::new(),
        }
    }

    pub fn failure(msg: &str) -> OperationResult {
        OperationResult {
            ret: false,
            msg: msg.to_string(),
            extra: Map::new(),
        }
    }

    /// Attach the raw fields the service returned alongside ret/msg.
    pub fn with_details(mut self, mut details: Map<String, Value>) -> OperationResult {
        // ret and msg live in the typed fields, keep the map free of duplicates
        details.remove("ret");
        details.remove("msg");
        self.extra = details;
        self
    }

    /// Success keeps only the message, which may be empty. Failure keeps the
    /// whole result so the caller sees every field the service sent back.
    pub fn into_outcome(self) -> Result<String, UpdateError> {
        if self.ret {
            Ok(self.msg)
        } else {
            Err(UpdateError::RemoteOperationFailed(self))
        }
    }
}

impl fmt::Display for OperationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    // test_failure_display tests that a failure renders every field the
    // remote returned, not just msg.
    #[test]
    fn test_failure_display() {
        let details = json!({"TaskId": "545", "Severity": "Critical"});
        let result = OperationResult::failure("bad image")
            .with_details(details.as_object().unwrap().clone());
        let text = result.to_string();
        assert!(text.contains("\"ret\":false"));
        assert!(text.contains("bad image"));
        assert!(text.contains("\"TaskId\":\"545\""));
    }

    #[test]
    fn test_success_outcome() {
        assert_eq!(OperationResult::success("ok").into_outcome().unwrap(), "ok");
    }

    #[test]
    fn test_failure_outcome() {
        let err = OperationResult::failure("bad image")
            .into_outcome()
            .unwrap_err();
        assert!(err.to_string().contains("bad image"));
    }

    // test_parse_remote_result tests the {ret, msg} wire shape with msg
    // absent, which some services omit on success.
    #[test]
    fn test_parse_remote_result() {
        let result: OperationResult =
            serde_json::from_str(r#"{"ret": true, "TaskId": "545"}"#).unwrap();
        assert!(result.ret);
        assert_eq!(result.msg, "");
        assert_eq!(result.extra.get("TaskId"), Some(&json!("545")));
    }
}
