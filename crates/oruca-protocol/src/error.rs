use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    /// JSON encoding or decoding failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
