//! # Gateway Error Types
//!
//! Error types for remote gateway operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  reqwest::Error / remote error body                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  GatewayError (this module) ← categorized: Timeout is distinct from     │
//! │       │                        transport failure, remote errors keep    │
//! │       ▼                        their structured code + message          │
//! │  AppError (loja-app) ← surfaced to the user as plain language           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::config::ConfigError;

/// Remote gateway operation errors.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Required configuration missing or invalid. Blocks startup.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A remote call did not resolve within its bounded wait.
    ///
    /// Kept distinct from [`GatewayError::Transport`] so the caller can show
    /// a "backend unreachable" status instead of an indefinite spinner.
    #[error("Remote call timed out")]
    Timeout,

    /// Connection-level failure (DNS, TLS, refused, reset).
    #[error("Transport error: {0}")]
    Transport(String),

    /// Structured failure returned by the gateway (constraint violation,
    /// malformed filter, missing table, ...).
    #[error("Remote error {status}: {message}")]
    Remote {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// The gateway rejected the credentials or session token.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The response body did not match the expected shape.
    #[error("Decode error: {0}")]
    Decode(String),
}

impl GatewayError {
    /// Creates a Remote error without a structured code.
    pub fn remote(status: u16, message: impl Into<String>) -> Self {
        GatewayError::Remote {
            status,
            code: None,
            message: message.into(),
        }
    }
}

/// Convert reqwest errors to GatewayError.
///
/// ## Error Mapping
/// ```text
/// is_timeout()  → GatewayError::Timeout
/// is_decode()   → GatewayError::Decode
/// anything else → GatewayError::Transport
/// ```
impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::Timeout
        } else if err.is_decode() {
            GatewayError::Decode(err.to_string())
        } else {
            GatewayError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::Decode(err.to_string())
    }
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_message() {
        let err = GatewayError::Remote {
            status: 409,
            code: Some("23505".to_string()),
            message: "duplicate key value".to_string(),
        };
        assert_eq!(err.to_string(), "Remote error 409: duplicate key value");
    }

    #[test]
    fn test_timeout_is_distinct() {
        assert!(matches!(GatewayError::Timeout, GatewayError::Timeout));
        assert_ne!(
            GatewayError::Timeout.to_string(),
            GatewayError::Transport("reset".to_string()).to_string()
        );
    }
}
