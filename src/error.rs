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
use reqwest::StatusCode;

use crate::command::Category;
use crate::result::OperationResult;

/// What went wrong while orchestrating an update. Every variant is terminal
/// for the invocation; nothing is retried at this layer.
#[derive(thiserror::Error, Debug)]
pub enum UpdateError {
    #[error("Invalid Category '{0}'. Valid Categories = {names:?}", names = Category::names())]
    InvalidCategory(String),

    #[error("Invalid Command '{command}'. Valid Commands = {:?}", .category.command_names())]
    InvalidCommand { category: Category, command: String },

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(&'static str),

    /// A firmware update has no safe dry-run, so check mode refuses instead
    /// of faking success.
    #[error("Check mode is not supported. A firmware update cannot be simulated")]
    UnsupportedMode,

    /// The remote service produced a structured result with ret=false. The
    /// display carries the whole result so no diagnostic field is lost.
    #[error("{0}")]
    RemoteOperationFailed(OperationResult),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Failures below the level of a structured result: the network, TLS, or the
/// shape of what the BMC sent back.
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error("Network error talking to BMC at {url}. {source}")]
    NetworkError { url: String, source: reqwest::Error },

    #[error("HTTP {status_code} at {url}. See debug logs for details.")]
    HTTPErrorCode {
        url: String,
        status_code: StatusCode,
    },

    #[error("Could not deserialize response from {url}. Body: {body}. {source}")]
    JsonDeserializeError {
        url: String,
        body: String,
        source: serde_json::Error,
    },

    #[error("Could not serialize request body for {url}. Obj: {object_debug}. {source}")]
    JsonSerializeError {
        url: String,
        object_debug: String,
        source: serde_json::Error,
    },

    #[error("Remote returned empty body")]
    NoContent,

    #[error("Auth token contains characters that cannot go into an HTTP header")]
    InvalidAuthToken,

    #[error("Could not build the HTTP client. {source}")]
    ClientBuild { source: reqwest::Error },

    #[error("Refusing to run {operation} on an endpoint that forbids data modification")]
    ReadOnlySession { operation: &'static str },
}
