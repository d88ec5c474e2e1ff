use thiserror::Error;

/// Reasons a raw card block could not be turned into an identity.
///
/// Decode failures are local to one card interaction: they are logged and the
/// presentation is treated as "no card". None of them is retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Card payload is not valid UTF-8: {0}")]
    Encoding(String),

    #[error("Card payload too short: {len} chars, need at least {required}")]
    Truncated { len: usize, required: usize },

    #[error("Unknown role classification code: {code:?}")]
    UnknownRole { code: String },

    #[error("Invalid identifier {identifier:?}: {reason}")]
    InvalidIdentifier { identifier: String, reason: String },
}

pub type Result<T> = std::result::Result<T, DecodeError>;
