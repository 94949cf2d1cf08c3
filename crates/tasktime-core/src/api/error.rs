use serde_json::Value;
use thiserror::Error;

/// Errors surfaced by the API layer.
///
/// Only `Transport` errors on reads are eligible for stale-cache substitution.
/// `Validation` errors are raised before any network call and pass through
/// the pipeline untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Request failed with status {status}: {message}")]
    Transport { status: u16, message: String },

    #[error("{0}")]
    Validation(String),

    #[error("Invalid response: {0}")]
    Decode(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Status reported when the transport failed without an HTTP response.
pub const NO_RESPONSE_STATUS: u16 = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let cut = (0..=MAX_ERROR_BODY_LENGTH)
                .rev()
                .find(|&i| body.is_char_boundary(i))
                .unwrap_or(0);
            format!("{}... (truncated, {} total bytes)", &body[..cut], body.len())
        }
    }

    /// Build an error from a non-success HTTP response.
    ///
    /// A JSON body with a string `message` field supplies the message;
    /// otherwise the (truncated) raw body is used.
    pub fn from_status(status: u16, body: &str) -> Self {
        let structured = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string));

        let message = match structured {
            Some(message) => message,
            None if body.trim().is_empty() => format!("HTTP {}", status),
            None => Self::truncate_body(body),
        };
        ApiError::Transport { status, message }
    }

    /// Build an error from a transport failure that may have no response.
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        ApiError::Transport {
            status: err.status().map(|s| s.as_u16()).unwrap_or(NO_RESPONSE_STATUS),
            message: err.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    /// HTTP-like status code; validation failures have none.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Transport { status, .. } => Some(*status),
            ApiError::Validation(_) | ApiError::Decode(_) => None,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ApiError::Transport { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport { .. })
    }
}
