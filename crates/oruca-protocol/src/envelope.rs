//! The `log/write` envelope published for each settled card presentation.
//!
//! ```text
//! {
//!   "type": "log/write",
//!   "payload": {
//!     "result": true,
//!     "content": { "student_ID": "AB12345" },
//!     "message": "NFC card ID was read: AB12345"
//!   }
//! }
//! ```
//!
//! # Examples
//!
//! ```
//! use oruca_core::{IdentityRecord, Role, StudentId};
//! use oruca_protocol::PublishEnvelope;
//!
//! let record = IdentityRecord::new(Role::Student, StudentId::new("AB12345").unwrap());
//! let json = PublishEnvelope::log_write(&record).to_json().unwrap();
//!
//! let parsed = PublishEnvelope::from_json(&json).unwrap();
//! assert_eq!(parsed.student_id().as_str(), "AB12345");
//! ```

use oruca_core::{IdentityRecord, StudentId};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message_type::MessageType;

/// Prefix of the human-readable message attached to every `log/write`.
pub const LOG_WRITE_MESSAGE_PREFIX: &str = "NFC card ID was read: ";

/// Top-level wire message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishEnvelope {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub payload: LogWritePayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogWritePayload {
    pub result: bool,
    pub content: LogWriteContent,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogWriteContent {
    #[serde(rename = "student_ID")]
    pub student_id: StudentId,
}

impl PublishEnvelope {
    /// Build a fresh `log/write` envelope for an identity.
    pub fn log_write(record: &IdentityRecord) -> Self {
        let student_id = record.student_id.clone();
        Self {
            message_type: MessageType::LogWrite,
            payload: LogWritePayload {
                result: true,
                message: format!("{LOG_WRITE_MESSAGE_PREFIX}{student_id}"),
                content: LogWriteContent { student_id },
            },
        }
    }

    pub fn student_id(&self) -> &StudentId {
        &self.payload.content.student_id
    }

    /// Serialize to compact JSON text.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::Serialization` if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a `log/write` envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a well-formed envelope, the
    /// identifier fails validation, or the type tag is not `log/write`.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
