//! Error types for the clinic API client.
//!
//! # Design
//! The split that matters to callers is whether a structured HTTP response
//! was received at all. `Connectivity` means it was not (DNS, refused
//! connection, timeout, TLS, a body that could not be read) and reports
//! status `0`, matching the error envelope the web dashboard used. Every
//! other variant carries a real status from the server.
//!
//! 401 and 422 share `Unauthorized`: the backend answers 422 for a malformed
//! or expired bearer token, so both mean the stored credential is unusable.

use thiserror::Error;

use crate::envelope::ErrorEnvelope;

/// Message reported when no response reached the client.
pub const NETWORK_ERROR_MESSAGE: &str = "Network error - could not connect to server";

/// Fallback when the server rejected a request without a usable message.
pub const REQUEST_FAILED_MESSAGE: &str = "Request failed";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// No structured HTTP response was received.
    #[error("connectivity failure: {message}")]
    Connectivity { message: String },

    /// 401 or 422: the credential was rejected.
    #[error("HTTP {status}: {}", .message.as_deref().unwrap_or(REQUEST_FAILED_MESSAGE))]
    Unauthorized { status: u16, message: Option<String> },

    /// 404: the resource does not exist.
    #[error("resource not found")]
    NotFound { message: Option<String> },

    /// Any other non-success status.
    #[error("HTTP {status}: {}", .message.as_deref().unwrap_or(REQUEST_FAILED_MESSAGE))]
    Server { status: u16, message: Option<String> },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ApiError {
    pub fn connectivity(message: impl Into<String>) -> Self {
        ApiError::Connectivity {
            message: message.into(),
        }
    }

    /// Map a non-success response to the matching variant, pulling the
    /// server's message out of the error envelope when there is one.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = ErrorEnvelope::parse(body).and_then(|e| e.message);
        match status {
            401 | 422 => ApiError::Unauthorized { status, message },
            404 => ApiError::NotFound { message },
            _ => ApiError::Server { status, message },
        }
    }

    /// HTTP status of the failure, `0` when no response was received.
    pub fn status(&self) -> u16 {
        match self {
            ApiError::Connectivity { .. } => 0,
            ApiError::Unauthorized { status, .. } | ApiError::Server { status, .. } => *status,
            ApiError::NotFound { .. } => 404,
            // A body arrived with a success status but could not be used.
            ApiError::Deserialization(_) => 200,
            ApiError::Serialization(_) => 0,
        }
    }

    pub fn is_connectivity(&self) -> bool {
        matches!(self, ApiError::Connectivity { .. })
    }

    /// Whether the caller's stored credential should be dropped.
    pub fn invalidates_session(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    /// Text fit for the view: the server-provided message if there is one,
    /// otherwise `fallback`. Connectivity failures always read as
    /// [`NETWORK_ERROR_MESSAGE`]; the transport detail stays in `Display`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Connectivity { .. } => NETWORK_ERROR_MESSAGE.to_string(),
            ApiError::Unauthorized { message, .. }
            | ApiError::NotFound { message }
            | ApiError::Server { message, .. } => {
                message.clone().unwrap_or_else(|| fallback.to_string())
            }
            ApiError::Deserialization(_) | ApiError::Serialization(_) => fallback.to_string(),
        }
    }
}
