//! Classification of backend responses.
//!
//! The backend reports failure in two ways:
//!
//! 1. Handlers that can fail return `{"error": "..."}` in place of a value.
//!    [`classify`] turns that into [`BackendError::Reported`].
//! 2. Action endpoints answer `{"success": false, "errorMessage": "...",
//!    "errorCode": "..."}`.  That is a well-formed answer the caller asked for,
//!    so it is *not* classified automatically; decode into
//!    [`SuccessResponse`] and call [`SuccessResponse::into_result`].
//!
//! Neither function shows anything to the user.  Presentation is the caller's
//! decision.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A failure the backend reported inside an otherwise valid response.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// The response carried an `error` field.
    #[error("backend error: {0}")]
    Reported(String),

    /// A `success: false` action response.
    #[error("backend action failed: {}", describe(.message, .code))]
    Unsuccessful {
        message: Option<String>,
        code: Option<String>,
    },
}

fn describe(message: &Option<String>, code: &Option<String>) -> String {
    match (message, code) {
        (Some(m), Some(c)) => format!("{m} ({c})"),
        (Some(m), None) => m.clone(),
        (None, Some(c)) => c.clone(),
        (None, None) => "no details".to_string(),
    }
}

/// Separates a backend-reported error from a successful payload.
///
/// Any JSON object with an `error` key is a failure; a non-string `error` is
/// stringified.  Every other value, including `null`, is returned unchanged.
///
/// # Examples
///
/// ```rust
/// use serde_json::json;
/// use wallet_bridge_core::{classify, BackendError};
///
/// assert_eq!(classify(json!([1, 2])), Ok(json!([1, 2])));
/// assert_eq!(
///     classify(json!({"error": "no device"})),
///     Err(BackendError::Reported("no device".into()))
/// );
/// ```
pub fn classify(response: Value) -> Result<Value, BackendError> {
    if let Value::Object(map) = &response {
        if let Some(error) = map.get("error") {
            let message = match error {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            return Err(BackendError::Reported(message));
        }
    }
    Ok(response)
}

/// The `{ success, errorMessage?, errorCode?, ... }` envelope of action endpoints.
///
/// Extra fields are flattened into `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(flatten)]
    pub data: T,
}

impl<T> SuccessResponse<T> {
    /// Converts `success: false` into [`BackendError::Unsuccessful`].
    pub fn into_result(self) -> Result<T, BackendError> {
        if self.success {
            Ok(self.data)
        } else {
            Err(BackendError::Unsuccessful {
                message: self.error_message.filter(|m| !m.is_empty()),
                code: self.error_code.filter(|c| !c.is_empty()),
            })
        }
    }
}
