//! API error types
//!
//! Every failed request ends up as an [`ApiError`]. Callers only ever show
//! [`ApiError::user_message`] to the creator: the server's own `message`
//! when the error body carries one, a generic fallback otherwise.

use serde::Deserialize;
use thiserror::Error;

/// Shown when a failure carries no server message
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong, please try again.";

/// Errors that can occur while talking to the course API
#[derive(Debug, Error)]
pub enum ApiError {
    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Connection, timeout or body transfer failure
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("Request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    /// A success response whose body did not match the expected shape
    #[error("Unexpected response body: {0}")]
    Decode(String),
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

impl ApiError {
    /// Build a status error from a raw error body
    pub(crate) fn from_body(status: u16, body: &[u8]) -> Self {
        let message = serde_json::from_slice::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string());

        ApiError::Status { status, message }
    }

    /// Text to surface to the creator
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status { message, .. } => message.clone(),
            _ => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }

    /// HTTP status, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}
