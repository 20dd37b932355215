// Response envelope
//
// Every API response is expected to match the fixed wrapper
// `{ status, message?, data? }`. `data` must be present and structured
// whenever `status` signals success -- anything else is a malformed
// envelope, never a success.

use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiCode;

/// The raw wire envelope. `status` arrives as a bare integer and is only
/// promoted to [`ApiCode`] after validation.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub status: Option<u16>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// The decoded domain code, or `None` when `status` is missing or
    /// not a known value.
    pub fn code(&self) -> Option<ApiCode> {
        self.status.and_then(ApiCode::from_wire)
    }
}

/// Envelope validity check.
///
/// Valid iff a known domain code is present, and -- when that code is
/// `Success` -- `data` is a structured JSON value (object or array).
/// A success without structured data is treated as malformed.
pub fn is_api_response_valid(response: &ApiResponse<Value>) -> bool {
    let Some(code) = response.code() else {
        return false;
    };
    if code != ApiCode::Success {
        return true;
    }
    matches!(response.data, Some(Value::Object(_) | Value::Array(_)))
}
