//! Error types for reader operations.
//!
//! Two levels of failure exist. [`HardwareError`] means the reader session
//! itself is gone (unplugged reader, dead PC/SC service) and the caller must
//! reacquire the reader. [`TagReadError`] is scoped to a single card
//! interaction and is carried inside the tag handle, so the session keeps
//! running.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that end the current reader session.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Reader disconnected or its driver stopped responding.
    #[error("Reader session lost: {reason}")]
    SessionLost { reason: String },

    /// No reader is attached.
    #[error("No reader found")]
    NoReader,

    /// Reader could not be initialized.
    #[error("Initialization failed: {message}")]
    InitializationFailed { message: String },

    /// Reader communication error.
    #[error("Communication error: {message}")]
    CommunicationError { message: String },

    /// Invalid data supplied to or received from the reader.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },
}

impl HardwareError {
    /// Create a new session lost error.
    pub fn session_lost(reason: impl Into<String>) -> Self {
        Self::SessionLost {
            reason: reason.into(),
        }
    }

    /// Create a new initialization failed error.
    pub fn initialization_failed(message: impl Into<String>) -> Self {
        Self::InitializationFailed {
            message: message.into(),
        }
    }

    /// Create a new communication error.
    pub fn communication(message: impl Into<String>) -> Self {
        Self::CommunicationError {
            message: message.into(),
        }
    }

    /// Create a new invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }
}

/// Failure to read the identity block from a card that is in the field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TagReadError {
    /// Card is not a FeliCa Standard card.
    #[error("Unsupported card family: {family}")]
    UnsupportedCard { family: String },

    /// Card does not expose the expected system code.
    #[error("System code {system_code:#06X} not present on card")]
    SystemCodeMissing { system_code: u16 },

    /// Block read failed (card left mid-read, bad response status).
    #[error("Block read failed: {message}")]
    ReadFailed { message: String },
}

impl TagReadError {
    /// Create a new read failed error.
    pub fn read_failed(message: impl Into<String>) -> Self {
        Self::ReadFailed {
            message: message.into(),
        }
    }
}
