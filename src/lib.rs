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

pub mod model;

mod command;
mod dispatch;
mod error;
mod network;
mod request;
mod result;

pub use command::{validate, Category, Command, CATEGORY_COMMANDS};
pub use dispatch::{dispatch, run, RunMode, UPDATE_SERVICE_PATH};
pub use error::{TransportError, UpdateError};
pub use network::{HttpFirmwareClient, HttpFirmwareClientBuilder, SYSTEMS_PATH};
pub use request::{Credentials, ServerModel, UpdateRequest, UpdateRequestBuilder, DEFAULT_TIMEOUT};
pub use result::OperationResult;

/// Everything a [`FirmwareClient`] needs for exactly one remote operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoint {
    /// Full URI of the update service, e.g.
    /// `https://10.0.0.1/redfish/v1/UpdateService`
    pub service_uri: String,
    pub credentials: Credentials,
    /// Per-request timeout, enforced by the transport
    pub timeout: Duration,
    /// False promises the remote state will not be changed. A firmware update
    /// always sets this, and implementations must refuse to run without it.
    pub data_modification: bool,
}

/// Interface to the firmware update side of a BMC Redfish server. A call
/// includes one or more HTTP network calls.
pub trait FirmwareClient: Send + Sync + 'static {
    /// Run one SystemFirmwareUpdate against the endpoint.
    ///
    /// Whatever session or connection the implementation opens for this call
    /// is scoped to the call and released on every exit path, success, remote
    /// error or transport failure alike.
    fn system_firmware_update(
        &self,
        endpoint: &ServiceEndpoint,
        request: &UpdateRequest,
    ) -> Result<OperationResult, TransportError>;
}
