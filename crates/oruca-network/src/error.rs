//! Publish errors.

use oruca_protocol::ProtocolError;

/// Result type alias for publish operations.
pub type Result<T> = std::result::Result<T, PublishError>;

/// Why a presentation could not be delivered. None of these are retried.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// The exchange did not finish within the configured timeout.
    #[error("Publish timeout after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// The endpoint could not be reached.
    #[error("Connection to {endpoint} refused: {reason}")]
    ConnectionRefused { endpoint: String, reason: String },

    /// The envelope could not be encoded.
    #[error("Serialization failed: {0}")]
    SerializationFailed(#[from] ProtocolError),

    /// Transport failure after the connection was made.
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// The configured endpoint is unusable for the transport.
    #[error("Invalid endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
}

impl PublishError {
    pub fn timeout(duration_ms: u64) -> Self {
        Self::Timeout { duration_ms }
    }

    pub fn connection_refused(endpoint: impl Into<String>, reason: impl ToString) -> Self {
        Self::ConnectionRefused {
            endpoint: endpoint.into(),
            reason: reason.to_string(),
        }
    }

    pub fn transport(message: impl ToString) -> Self {
        Self::Transport {
            message: message.to_string(),
        }
    }

    pub fn invalid_endpoint(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEndpoint {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }
}
