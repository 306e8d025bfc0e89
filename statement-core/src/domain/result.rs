//! Result and error types for the core library

use thiserror::Error;

/// Core library error type
///
/// The first three variants are the load-path taxonomy: a malformed payload,
/// a request that never reached the server, and a failure the server reported.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Normalization error: {0}")]
    Normalization(String),

    #[error("Transport aborted: {0}")]
    TransportAbort(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Banner text used when the server gives no message of its own
pub const GENERIC_SERVER_MESSAGE: &str = "Failed to load statement";

impl Error {
    /// Create a normalization error
    pub fn normalization(msg: impl Into<String>) -> Self {
        Self::Normalization(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a server error, falling back to the generic message when the
    /// response carried none
    pub fn server(status: u16, message: Option<String>) -> Self {
        let message = message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| GENERIC_SERVER_MESSAGE.to_string());
        Self::Server { status, message }
    }

    /// True when no response reached the server and a silent retry is allowed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransportAbort(_))
    }

    /// Message shown to the user, `None` for transient failures
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::TransportAbort(_) => None,
            Self::Server { message, .. } => Some(message.clone()),
            Self::Normalization(_) => Some("The statement data could not be read".to_string()),
            other => Some(other.to_string()),
        }
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_fallback_message() {
        let err = Error::server(500, None);
        assert_eq!(err.user_message(), Some(GENERIC_SERVER_MESSAGE.to_string()));

        let err = Error::server(500, Some("   ".to_string()));
        assert_eq!(err.user_message(), Some(GENERIC_SERVER_MESSAGE.to_string()));

        let err = Error::server(404, Some("Account not found".to_string()));
        assert_eq!(err.user_message(), Some("Account not found".to_string()));
    }

    #[test]
    fn test_transport_abort_is_silent() {
        let err = Error::TransportAbort("connection reset".to_string());
        assert!(err.is_transient());
        assert!(err.user_message().is_none());
        assert!(!Error::server(502, None).is_transient());
    }
}
