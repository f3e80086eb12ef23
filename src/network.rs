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
use std::time::Duration;

use reqwest::{
    blocking::Client as HttpClient, blocking::ClientBuilder as HttpClientBuilder,
    header::HeaderValue, header::ACCEPT, header::CONTENT_TYPE, header::LOCATION, Method,
    StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::{
    error::TransportError,
    model::{
        system::{ComputerSystem, Systems},
        update_service::SimpleUpdateRequest,
    },
    request::{Credentials, ServerModel, UpdateRequest},
    result::OperationResult,
    FirmwareClient, ServiceEndpoint,
};

/// Fixed resource path of the Redfish systems collection.
pub const SYSTEMS_PATH: &str = "/redfish/v1/Systems";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug)]
pub struct HttpFirmwareClientBuilder {
    timeout: Duration,
    accept_invalid_certs: bool,
}

impl HttpFirmwareClientBuilder {
    /// Prevents the client from accepting self signed certificates
    /// and other invalid certificates.
    ///
    /// By default self signed certificates will be accepted, since BMCs
    /// usually use those.
    pub fn reject_invalid_certs(mut self) -> HttpFirmwareClientBuilder {
        self.accept_invalid_certs = false;
        self
    }

    /// Overwrites the fallback timeout. The per-operation timeout carried by
    /// each endpoint still wins for individual requests.
    pub fn timeout(mut self, timeout: Duration) -> HttpFirmwareClientBuilder {
        self.timeout = timeout;
        self
    }

    /// Builds a firmware client backed by a reqwest connection pool
    pub fn build(&self) -> Result<HttpFirmwareClient, TransportError> {
        let builder = HttpClientBuilder::new();
        let http_client = builder
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .timeout(self.timeout)
            .build()
            .map_err(|e| TransportError::ClientBuild { source: e })?;

        Ok(HttpFirmwareClient { http_client })
    }
}

/// [`FirmwareClient`] that talks straight HTTP to the BMC: a couple of GETs
/// to find the target system, then one SimpleUpdate POST. No Redfish session
/// negotiation, no multipart upload, no task polling.
#[derive(Debug, Clone)]
pub struct HttpFirmwareClient {
    http_client: HttpClient,
}

impl HttpFirmwareClient {
    /// Returns Builder for configuring the HTTP connection pool
    pub fn builder() -> HttpFirmwareClientBuilder {
        HttpFirmwareClientBuilder {
            timeout: DEFAULT_TIMEOUT,
            // BMCs often have a self-signed cert, so usually this has to be true
            accept_invalid_certs: true,
        }
    }
}

impl FirmwareClient for HttpFirmwareClient {
    fn system_firmware_update(
        &self,
        endpoint: &ServiceEndpoint,
        request: &UpdateRequest,
    ) -> Result<OperationResult, TransportError> {
        if !endpoint.data_modification {
            return Err(TransportError::ReadOnlySession {
                operation: "SystemFirmwareUpdate",
            });
        }
        let session = UpdateSession {
            http_client: &self.http_client,
            endpoint,
        };
        session.system_firmware_update(request)
    }
}

/// One remote operation's worth of HTTP state. Constructed at the top of the
/// call and dropped on every exit path, so nothing lingers between commands.
struct UpdateSession<'a> {
    http_client: &'a HttpClient,
    endpoint: &'a ServiceEndpoint,
}

impl UpdateSession<'_> {
    fn system_firmware_update(
        &self,
        request: &UpdateRequest,
    ) -> Result<OperationResult, TransportError> {
        let system_path = match request.resource_id.first() {
            Some(id) => format!("{SYSTEMS_PATH}/{id}"),
            None => match self.first_system_member(request)? {
                Some(path) => path,
                None => {
                    return Ok(OperationResult::failure(
                        "No computer systems found on the target BMC",
                    ))
                }
            },
        };
        let system: ComputerSystem =
            self.get(&format!("https://{}{}", request.baseuri, system_path))?;
        let model_name = system.model.unwrap_or_default();
        let (model, image_path) = match resolve_image(&model_name, request) {
            Ok(target) => target,
            Err(result) => return Ok(result),
        };

        let action_uri = format!(
            "{}/Actions/UpdateService.SimpleUpdate",
            self.endpoint.service_uri
        );
        let body = SimpleUpdateRequest {
            image_uri: image_path.to_string(),
            targets: request.update_target.clone().into_iter().collect(),
        };
        let (status_code, response, location) =
            self.req::<Map<String, Value>, _>(Method::POST, &action_uri, Some(body))?;
        simple_update_result(model, status_code, response, location, &action_uri)
    }

    /// First member of the systems collection, if the BMC lists any.
    fn first_system_member(
        &self,
        request: &UpdateRequest,
    ) -> Result<Option<String>, TransportError> {
        let systems: Systems =
            self.get(&format!("https://{}{}", request.baseuri, SYSTEMS_PATH))?;
        Ok(systems.members.first().map(|m| m.odata_id.clone()))
    }

    fn get<T>(&self, url: &str) -> Result<T, TransportError>
    where
        T: DeserializeOwned + ::std::fmt::Debug,
    {
        let (status_code, resp_opt, _location) = self.req::<T, String>(Method::GET, url, None)?;
        if !status_code.is_success() {
            return Err(TransportError::HTTPErrorCode {
                url: url.to_string(),
                status_code,
            });
        }
        match resp_opt {
            Some(response_body) => Ok(response_body),
            None => Err(TransportError::NoContent),
        }
    }

    // All the HTTP requests happen from here.
    fn req<T, B>(
        &self,
        method: Method,
        url: &str,
        body: Option<B>,
    ) -> Result<(StatusCode, Option<T>, Option<String>), TransportError>
    where
        T: DeserializeOwned + ::std::fmt::Debug,
        B: Serialize + ::std::fmt::Debug,
    {
        let body_enc = match body {
            Some(b) => {
                let body_enc =
                    serde_json::to_string(&b).map_err(|e| TransportError::JsonSerializeError {
                        url: url.to_string(),
                        object_debug: format!("{b:?}"),
                        source: e,
                    })?;
                Some(body_enc)
            }
            None => None,
        };
        debug!(
            "TX {} {} {}",
            method,
            url,
            body_enc.as_deref().unwrap_or_default()
        );

        let mut req_b = match method {
            Method::GET => self.http_client.get(url),
            Method::POST => self.http_client.post(url),
            _ => unreachable!("Only GET and POST http methods are used."),
        };
        req_b = req_b
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        match &self.endpoint.credentials {
            Credentials::Anonymous => {}
            Credentials::UsernamePassword { username, password } => {
                req_b = req_b.basic_auth(username, password.as_ref());
            }
            Credentials::Token(token) => {
                let value =
                    HeaderValue::from_str(token).map_err(|_| TransportError::InvalidAuthToken)?;
                req_b = req_b.header("x-auth-token", value);
            }
        }
        req_b = req_b.timeout(self.endpoint.timeout);
        if let Some(b) = body_enc {
            req_b = req_b.body(b);
        }
        let response = req_b.send().map_err(|e| TransportError::NetworkError {
            url: url.to_string(),
            source: e,
        })?;
        let status_code = response.status();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        // read the body even if not status 2XX, because BMCs give useful error messages as JSON
        let response_body = response.text().map_err(|e| TransportError::NetworkError {
            url: url.to_string(),
            source: e,
        })?;
        let mut res = None;
        if !response_body.is_empty() {
            debug!("RX {status_code} {response_body}");
            match serde_json::from_str(&response_body) {
                Ok(v) => res.insert(v),
                Err(e) => {
                    return Err(TransportError::JsonDeserializeError {
                        url: url.to_string(),
                        body: response_body,
                        source: e,
                    });
                }
            };
        } else {
            debug!("RX {status_code}");
        }
        Ok((status_code, res, location))
    }
}

/// Match the reported model to an image path. An unsupported model, or a
/// supported model with no image path configured, is a structured failure;
/// the caller returns it without ever building the SimpleUpdate POST.
fn resolve_image<'a>(
    model_name: &str,
    request: &'a UpdateRequest,
) -> Result<(ServerModel, &'a str), OperationResult> {
    let Some(model) = ServerModel::from_model_name(model_name) else {
        return Err(OperationResult::failure(&format!(
            "Model '{model_name}' is not a supported Cray XD system"
        )));
    };
    let Some(image_path) = request.image_path(model) else {
        return Err(OperationResult::failure(&format!(
            "No {} image path was provided for model {model}",
            request.update_image_type
        )));
    };
    Ok((model, image_path))
}

/// Map the SimpleUpdate response onto an operation result. Acceptance names
/// the task monitor when the BMC announced one. A rejection with a JSON body
/// keeps the BMC's message and every body field; a bare status code is a
/// transport error.
fn simple_update_result(
    model: ServerModel,
    status_code: StatusCode,
    response: Option<Map<String, Value>>,
    location: Option<String>,
    action_uri: &str,
) -> Result<OperationResult, TransportError> {
    if status_code.is_success() {
        let msg = match location {
            Some(task) => format!("SystemFirmwareUpdate accepted, task monitor at {task}"),
            None => format!("SystemFirmwareUpdate accepted for model {model}"),
        };
        return Ok(OperationResult::success(&msg));
    }
    match response {
        Some(body) => {
            let msg = error_message(&body).unwrap_or_else(|| {
                format!("SystemFirmwareUpdate rejected with HTTP {status_code}")
            });
            Ok(OperationResult::failure(&msg).with_details(body))
        }
        None => Err(TransportError::HTTPErrorCode {
            url: action_uri.to_string(),
            status_code,
        }),
    }
}

/// Digs the human readable message out of a Redfish error body, which nests
/// it under error -> @Message.ExtendedInfo -> Message.
fn error_message(body: &Map<String, Value>) -> Option<String> {
    let error = body.get("error")?;
    if let Some(info) = error
        .get("@Message.ExtendedInfo")
        .and_then(|v| v.as_array())
    {
        if let Some(msg) = info
            .iter()
            .find_map(|e| e.get("Message").and_then(Value::as_str))
        {
            return Some(msg.to_string());
        }
    }
    error
        .get("message")
        .and_then(Value::as_str)
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    // test_error_message_extended_info tests that the nested error format
    // most BMCs use yields the human readable message.
    #[test]
    fn test_error_message_extended_info() {
        let body = json!({
            "error": {
                "code": "Base.1.8.GeneralError",
                "@Message.ExtendedInfo": [
                    {
                        "MessageId": "UpdateService.1.0.InvalidImage",
                        "Message": "The firmware image is invalid."
                    }
                ]
            }
        });
        let map = body.as_object().unwrap().clone();
        assert_eq!(
            error_message(&map).as_deref(),
            Some("The firmware image is invalid.")
        );
    }

    // test_error_message_plain tests the flat error format some BMCs use.
    #[test]
    fn test_error_message_plain() {
        let body = json!({"error": {"message": "A general error has occurred."}});
        let map = body.as_object().unwrap().clone();
        assert_eq!(
            error_message(&map).as_deref(),
            Some("A general error has occurred.")
        );
    }

    #[test]
    fn test_error_message_absent() {
        let body = json!({"TaskState": "Running"});
        let map = body.as_object().unwrap().clone();
        assert_eq!(error_message(&map), None);
    }

    fn xd665_request() -> UpdateRequest {
        UpdateRequest::builder("10.1.1.1")
            .image_path(ServerModel::Xd665, "/fwrepo/xd665.hpm")
            .build()
    }

    #[test]
    fn test_resolve_image() {
        let request = xd665_request();
        let (model, path) = resolve_image("HPE CRAY XD665", &request).unwrap();
        assert_eq!(model, ServerModel::Xd665);
        assert_eq!(path, "/fwrepo/xd665.hpm");
    }

    // test_resolve_image_unsupported_model tests that a system which is not
    // a Cray XD yields a structured failure instead of an update attempt.
    #[test]
    fn test_resolve_image_unsupported_model() {
        let request = xd665_request();
        let result = resolve_image("ProLiant DL380 Gen10", &request).unwrap_err();
        assert!(!result.ret);
        assert!(result.msg.contains("ProLiant DL380 Gen10"));
        assert!(result.msg.contains("not a supported Cray XD system"));
    }

    // test_resolve_image_missing_path tests that a supported model with no
    // image configured fails naming the model, and nothing gets updated.
    #[test]
    fn test_resolve_image_missing_path() {
        let request = xd665_request();
        let result = resolve_image("HPE CRAY XD220V", &request).unwrap_err();
        assert!(!result.ret);
        assert!(result.msg.contains("No HPM image path"));
        assert!(result.msg.contains("XD220v"));
    }

    const ACTION_URI: &str =
        "https://10.1.1.1/redfish/v1/UpdateService/Actions/UpdateService.SimpleUpdate";

    #[test]
    fn test_simple_update_accepted_with_task_monitor() {
        let result = simple_update_result(
            ServerModel::Xd665,
            StatusCode::ACCEPTED,
            None,
            Some("/redfish/v1/TaskService/Tasks/545".to_string()),
            ACTION_URI,
        )
        .unwrap();
        assert!(result.ret);
        assert_eq!(
            result.msg,
            "SystemFirmwareUpdate accepted, task monitor at /redfish/v1/TaskService/Tasks/545"
        );
    }

    #[test]
    fn test_simple_update_accepted_without_task_monitor() {
        let result =
            simple_update_result(ServerModel::Xd665, StatusCode::OK, None, None, ACTION_URI)
                .unwrap();
        assert!(result.ret);
        assert_eq!(result.msg, "SystemFirmwareUpdate accepted for model XD665");
    }

    // test_simple_update_rejected_with_body tests that a BMC rejection keeps
    // the extracted message and every field the BMC returned.
    #[test]
    fn test_simple_update_rejected_with_body() {
        let body = json!({
            "error": {
                "code": "Base.1.8.GeneralError",
                "@Message.ExtendedInfo": [
                    {
                        "MessageId": "UpdateService.1.0.InvalidImage",
                        "Message": "The firmware image is invalid."
                    }
                ]
            }
        });
        let result = simple_update_result(
            ServerModel::Xd665,
            StatusCode::BAD_REQUEST,
            Some(body.as_object().unwrap().clone()),
            None,
            ACTION_URI,
        )
        .unwrap();
        assert!(!result.ret);
        assert_eq!(result.msg, "The firmware image is invalid.");
        assert!(result.extra.contains_key("error"));
    }

    #[test]
    fn test_simple_update_rejected_body_without_message() {
        let body = json!({"TaskState": "Exception"});
        let result = simple_update_result(
            ServerModel::Xd665,
            StatusCode::BAD_REQUEST,
            Some(body.as_object().unwrap().clone()),
            None,
            ACTION_URI,
        )
        .unwrap();
        assert!(!result.ret);
        assert!(result.msg.contains("rejected with HTTP 400"));
        assert_eq!(result.extra.get("TaskState"), Some(&json!("Exception")));
    }

    // A rejection without any body has no diagnostics worth a structured
    // result, so it surfaces as a transport error.
    #[test]
    fn test_simple_update_rejected_without_body() {
        let err = simple_update_result(
            ServerModel::Xd665,
            StatusCode::INTERNAL_SERVER_ERROR,
            None,
            None,
            ACTION_URI,
        )
        .unwrap_err();
        assert!(matches!(err, TransportError::HTTPErrorCode { .. }));
    }

    // test_read_only_session_refused tests that a read-only endpoint can
    // never trigger an update. No network traffic happens before the check.
    #[test]
    fn test_read_only_session_refused() {
        let client = HttpFirmwareClient::builder().build().unwrap();
        let endpoint = ServiceEndpoint {
            service_uri: "https://10.1.1.1/redfish/v1/UpdateService".to_string(),
            credentials: Credentials::Anonymous,
            timeout: Duration::from_secs(60),
            data_modification: false,
        };
        let request = UpdateRequest::builder("10.1.1.1").build();
        let err = client
            .system_firmware_update(&endpoint, &request)
            .unwrap_err();
        assert!(matches!(err, TransportError::ReadOnlySession { .. }));
    }
}
