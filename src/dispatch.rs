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
use tracing::debug;

use crate::{
    command::{validate, Command},
    error::UpdateError,
    request::{Credentials, UpdateRequest},
    FirmwareClient, ServiceEndpoint,
};

/// Fixed resource path of the Redfish update service on every Cray XD BMC.
pub const UPDATE_SERVICE_PATH: &str = "/redfish/v1/UpdateService";

/// Whether this run may touch hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Normal,
    /// Dry-run requested by the caller. A firmware update has no safe
    /// dry-run, so this mode always refuses.
    Check,
}

/// Validate and run a category/command batch against one BMC.
///
/// Returns the last command's message on success. Check mode refuses before
/// anything is validated or dispatched.
pub fn run(
    mode: RunMode,
    category: &str,
    commands: &[String],
    credentials: &Credentials,
    request: &UpdateRequest,
    client: &dyn FirmwareClient,
) -> Result<String, UpdateError> {
    if mode == RunMode::Check {
        return Err(UpdateError::UnsupportedMode);
    }
    let (category, commands) = validate(category, commands)?;
    debug!("validated {} command(s) under category {category}", commands.len());
    dispatch(&commands, credentials, request, client)
}

/// Run already validated commands in order. Each command gets its own scoped
/// endpoint; the first failure stops the remaining commands cold.
pub fn dispatch(
    commands: &[Command],
    credentials: &Credentials,
    request: &UpdateRequest,
    client: &dyn FirmwareClient,
) -> Result<String, UpdateError> {
    let mut last_msg = String::new();
    for command in commands {
        let endpoint = ServiceEndpoint {
            service_uri: format!("https://{}{}", request.baseuri, UPDATE_SERVICE_PATH),
            credentials: credentials.clone(),
            timeout: request.timeout,
            // A firmware update mutates the target. Never present it as a read.
            data_modification: true,
        };
        debug!("dispatching {command} to {}", endpoint.service_uri);
        let result = match command {
            Command::SystemFirmwareUpdate => client.system_firmware_update(&endpoint, request)?,
        };
        last_msg = result.into_outcome()?;
    }
    Ok(last_msg)
}
