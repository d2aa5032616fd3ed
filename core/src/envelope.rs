//! Normalization of the clinic API's response shapes.
//!
//! The backend is inconsistent about wrapping. A success body is either the
//! payload itself:
//!
//! ```text
//! [ { "id": "C001", ... }, ... ]
//! ```
//!
//! or the payload inside an envelope, with or without a `success` flag:
//!
//! ```text
//! { "success": true, "data": [ { "id": "C001", ... } ] }
//! ```
//!
//! Error bodies use `{ "success": false, "message": "...", "status": 422 }`,
//! optionally with an `errors` object of per-field validation messages.
//!
//! Call sites never look at either shape; they get the canonical payload from
//! [`unwrap_data`] and the message from [`ErrorEnvelope`].

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;

/// Decode a success body into `T`, accepting both the bare and the
/// `{ data: ... }` shape.
pub fn unwrap_data<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| ApiError::Deserialization(e.to_string()))?;

    let payload = match value {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    };

    serde_json::from_value(payload).map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// The error body the backend sends with non-2xx statuses.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub errors: Option<Value>,
}

impl ErrorEnvelope {
    /// Parse leniently. Returns `None` for empty or non-JSON bodies, which
    /// proxies and load balancers produce.
    pub fn parse(body: &str) -> Option<Self> {
        if body.trim().is_empty() {
            return None;
        }
        let mut envelope: ErrorEnvelope = serde_json::from_str(body).ok()?;
        envelope.message = envelope.message.filter(|m| !m.trim().is_empty());
        Some(envelope)
    }
}
