//! Error types for the chat client

use thiserror::Error;

/// Boxed cause carried by transport failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Chat client error types
#[derive(Error, Debug)]
pub enum AiError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Transport error: {0}")]
    Transport(#[source] BoxError),

    #[error("HTTP error ({status}): {message}")]
    Http { status: u16, message: String },

    /// Request body could not be serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AiError {
    /// Build a transport error from any cause
    pub fn transport(cause: impl Into<BoxError>) -> Self {
        Self::Transport(cause.into())
    }

    /// Whether the failure happened on the wire rather than before it.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Http { .. })
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

impl From<reqwest::Error> for AiError {
    fn from(error: reqwest::Error) -> Self {
        Self::Transport(Box::new(error))
    }
}

/// Result type alias for chat client operations
pub type Result<T> = std::result::Result<T, AiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_transport_error_keeps_cause() {
        let cause = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");
        let error = AiError::transport(cause);

        assert!(error.is_transport());
        assert!(error.to_string().contains("reset by peer"));
        assert!(error.source().is_some());
    }

    #[test]
    fn test_http_error_is_transport() {
        let error = AiError::Http {
            status: 401,
            message: "unauthorized".to_string(),
        };
        assert!(error.is_transport());
        assert!(!error.is_configuration());
        assert_eq!(error.to_string(), "HTTP error (401): unauthorized");
    }

    #[test]
    fn test_serialization_error_is_not_transport() {
        let result: Result<f32> =
            serde_json::from_str::<f32>("\"warm\"").map_err(AiError::from);
        let error = result.unwrap_err();
        assert!(matches!(error, AiError::Json(_)));
        assert!(!error.is_transport());
        assert!(!error.is_configuration());
    }

    #[test]
    fn test_configuration_error_is_not_transport() {
        let error = AiError::Configuration("API key is not set".to_string());
        assert!(error.is_configuration());
        assert!(!error.is_transport());
    }
}
