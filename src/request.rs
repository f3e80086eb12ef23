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
use std::{fmt, time::Duration};

use crate::error::UpdateError;

/// Default per-operation HTTP timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_IMAGE_TYPE: &str = "HPM";

/// How to authenticate against the BMC, picked apart from the raw
/// username/password/token inputs once so every later layer sees exactly one
/// method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// No authentication at all. Some lab BMCs run wide open.
    Anonymous,
    UsernamePassword {
        username: String,
        password: Option<String>,
    },
    Token(String),
}

impl Credentials {
    /// Build from the three raw inputs. Empty strings count as absent.
    ///
    /// At most one method may be in play: a token next to a username, or a
    /// password without a username, is rejected rather than silently picking
    /// a winner.
    pub fn new(
        username: Option<String>,
        password: Option<String>,
        auth_token: Option<String>,
    ) -> Result<Credentials, UpdateError> {
        let username = username.filter(|s| !s.is_empty());
        let password = password.filter(|s| !s.is_empty());
        let auth_token = auth_token.filter(|s| !s.is_empty());
        match (username, password, auth_token) {
            (None, None, None) => Ok(Credentials::Anonymous),
            (Some(username), password, None) => {
                Ok(Credentials::UsernamePassword { username, password })
            }
            (None, None, Some(token)) => Ok(Credentials::Token(token)),
            (Some(_), _, Some(_)) => Err(UpdateError::InvalidCredentials(
                "both a username and an auth token were given",
            )),
            (None, Some(_), _) => Err(UpdateError::InvalidCredentials(
                "a password was given without a username",
            )),
        }
    }
}

/// Cray XD models the updater knows image paths for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerModel {
    Xd220v,
    Xd225v,
    Xd295v,
    Xd665,
    Xd670,
}

impl ServerModel {
    /// Pick the model out of the string a BMC reports, e.g. "HPE CRAY XD220V".
    /// Matching is case-insensitive because vendors do not agree on casing.
    pub fn from_model_name(model: &str) -> Option<ServerModel> {
        let model = model.to_uppercase();
        if model.contains("XD220V") {
            Some(ServerModel::Xd220v)
        } else if model.contains("XD225V") {
            Some(ServerModel::Xd225v)
        } else if model.contains("XD295V") {
            Some(ServerModel::Xd295v)
        } else if model.contains("XD665") {
            Some(ServerModel::Xd665)
        } else if model.contains("XD670") {
            Some(ServerModel::Xd670)
        } else {
            None
        }
    }
}

impl fmt::Display for ServerModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServerModel::Xd220v => "XD220v",
            ServerModel::Xd225v => "XD225v",
            ServerModel::Xd295v => "XD295v",
            ServerModel::Xd665 => "XD665",
            ServerModel::Xd670 => "XD670",
        };
        f.write_str(name)
    }
}

/// Everything a SystemFirmwareUpdate needs, normalized up front. Build one
/// with [`UpdateRequest::builder`]; only `baseuri` is required.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRequest {
    /// Hostname or IP address of the BMC Redfish API
    pub baseuri: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Firmware bundle format. Cray XD bundles ship as HPM.
    pub update_image_type: String,
    /// Redfish Targets entry for SimpleUpdate, when the image is meant for a
    /// single component
    pub update_target: Option<String>,
    /// Power state the host should be in when the update lands
    pub power_state: Option<String>,
    /// Members of /redfish/v1/Systems to update. Empty means whatever system
    /// the BMC lists first.
    pub resource_id: Vec<String>,
    pub update_image_path_xd220v: String,
    pub update_image_path_xd225v: String,
    pub update_image_path_xd295v: String,
    pub update_image_path_xd665: String,
    pub update_image_path_xd670: String,
    /// Where the remote service should write its update report, if it
    /// supports that
    pub output_file_name: String,
    pub timeout: Duration,
}

impl UpdateRequest {
    pub fn builder(baseuri: &str) -> UpdateRequestBuilder {
        UpdateRequestBuilder {
            request: UpdateRequest {
                baseuri: baseuri.to_string(),
                username: None,
                password: None,
                update_image_type: DEFAULT_IMAGE_TYPE.to_string(),
                update_target: None,
                power_state: None,
                resource_id: Vec::new(),
                update_image_path_xd220v: String::new(),
                update_image_path_xd225v: String::new(),
                update_image_path_xd295v: String::new(),
                update_image_path_xd665: String::new(),
                update_image_path_xd670: String::new(),
                output_file_name: String::new(),
                timeout: DEFAULT_TIMEOUT,
            },
        }
    }

    /// Image path for a model. An empty path means the model is not targeted.
    pub fn image_path(&self, model: ServerModel) -> Option<&str> {
        let path = match model {
            ServerModel::Xd220v => &self.update_image_path_xd220v,
            ServerModel::Xd225v => &self.update_image_path_xd225v,
            ServerModel::Xd295v => &self.update_image_path_xd295v,
            ServerModel::Xd665 => &self.update_image_path_xd665,
            ServerModel::Xd670 => &self.update_image_path_xd670,
        };
        if path.is_empty() {
            None
        } else {
            Some(path)
        }
    }
}

/// Builder for [`UpdateRequest`]. Every recognized field has a setter, so
/// there is no way to smuggle in an unknown option.
#[derive(Debug, Clone)]
pub struct UpdateRequestBuilder {
    request: UpdateRequest,
}

impl UpdateRequestBuilder {
    pub fn username(mut self, username: &str) -> UpdateRequestBuilder {
        self.request.username = Some(username.to_string());
        self
    }

    pub fn password(mut self, password: &str) -> UpdateRequestBuilder {
        self.request.password = Some(password.to_string());
        self
    }

    pub fn update_image_type(mut self, image_type: &str) -> UpdateRequestBuilder {
        self.request.update_image_type = image_type.to_string();
        self
    }

    pub fn update_target(mut self, target: &str) -> UpdateRequestBuilder {
        self.request.update_target = Some(target.to_string());
        self
    }

    pub fn power_state(mut self, power_state: &str) -> UpdateRequestBuilder {
        self.request.power_state = Some(power_state.to_string());
        self
    }

    pub fn resource_id(mut self, resource_id: Vec<String>) -> UpdateRequestBuilder {
        self.request.resource_id = resource_id;
        self
    }

    /// Firmware image path for one model. Repeat for every model in the fleet.
    pub fn image_path(mut self, model: ServerModel, path: &str) -> UpdateRequestBuilder {
        let field = match model {
            ServerModel::Xd220v => &mut self.request.update_image_path_xd220v,
            ServerModel::Xd225v => &mut self.request.update_image_path_xd225v,
            ServerModel::Xd295v => &mut self.request.update_image_path_xd295v,
            ServerModel::Xd665 => &mut self.request.update_image_path_xd665,
            ServerModel::Xd670 => &mut self.request.update_image_path_xd670,
        };
        *field = path.to_string();
        self
    }

    pub fn output_file_name(mut self, name: &str) -> UpdateRequestBuilder {
        self.request.output_file_name = name.to_string();
        self
    }

    /// Overwrites the timeout handed to the transport for every request
    pub fn timeout(mut self, timeout: Duration) -> UpdateRequestBuilder {
        self.request.timeout = timeout;
        self
    }

    pub fn build(self) -> UpdateRequest {
        self.request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_username_password() {
        let creds = Credentials::new(
            Some("admin".to_string()),
            Some("hunter2".to_string()),
            None,
        )
        .unwrap();
        assert_eq!(
            creds,
            Credentials::UsernamePassword {
                username: "admin".to_string(),
                password: Some("hunter2".to_string()),
            }
        );
    }

    #[test]
    fn test_credentials_username_only() {
        let creds = Credentials::new(Some("admin".to_string()), None, None).unwrap();
        assert_eq!(
            creds,
            Credentials::UsernamePassword {
                username: "admin".to_string(),
                password: None,
            }
        );
    }

    #[test]
    fn test_credentials_token() {
        let creds = Credentials::new(None, None, Some("c00lt0ken".to_string())).unwrap();
        assert_eq!(creds, Credentials::Token("c00lt0ken".to_string()));
    }

    // test_credentials_empty_strings tests that empty strings behave like
    // unset options, which is how they arrive from CLI parsers.
    #[test]
    fn test_credentials_empty_strings() {
        let creds = Credentials::new(Some(String::new()), Some(String::new()), None).unwrap();
        assert_eq!(creds, Credentials::Anonymous);
    }

    #[test]
    fn test_credentials_token_and_username_rejected() {
        let err = Credentials::new(
            Some("admin".to_string()),
            None,
            Some("c00lt0ken".to_string()),
        )
        .unwrap_err();
        assert!(matches!(err, UpdateError::InvalidCredentials(_)));
    }

    #[test]
    fn test_credentials_password_without_username_rejected() {
        let err = Credentials::new(None, Some("hunter2".to_string()), None).unwrap_err();
        assert!(matches!(err, UpdateError::InvalidCredentials(_)));
    }

    // test_model_matching tests the model strings Cray XD BMCs actually report.
    #[test]
    fn test_model_matching() {
        assert_eq!(
            ServerModel::from_model_name("HPE CRAY XD220V"),
            Some(ServerModel::Xd220v)
        );
        assert_eq!(
            ServerModel::from_model_name("HPE Cray XD665"),
            Some(ServerModel::Xd665)
        );
        assert_eq!(
            ServerModel::from_model_name("hpe cray xd670"),
            Some(ServerModel::Xd670)
        );
        assert_eq!(ServerModel::from_model_name("ProLiant DL380 Gen10"), None);
        assert_eq!(ServerModel::from_model_name(""), None);
    }

    #[test]
    fn test_builder_defaults() {
        let request = UpdateRequest::builder("10.1.1.1").build();
        assert_eq!(request.baseuri, "10.1.1.1");
        assert_eq!(request.update_image_type, "HPM");
        assert_eq!(request.timeout, Duration::from_secs(60));
        assert_eq!(request.username, None);
        assert!(request.resource_id.is_empty());
        assert!(request.update_image_path_xd220v.is_empty());
        assert!(request.output_file_name.is_empty());
    }

    #[test]
    fn test_image_path_selection() {
        let request = UpdateRequest::builder("10.1.1.1")
            .image_path(ServerModel::Xd220v, "/fwrepo/xd220v.hpm")
            .build();
        assert_eq!(
            request.image_path(ServerModel::Xd220v),
            Some("/fwrepo/xd220v.hpm")
        );
        assert_eq!(request.image_path(ServerModel::Xd665), None);
    }
}
