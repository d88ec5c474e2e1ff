use crate::{
    Result,
    constants::{IDENTIFIER_LENGTH, STAFF_ROLE_CODE, STUDENT_ROLE_CODES},
    error::DecodeError,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Role classification encoded in the first two characters of a card payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Staff,
    /// Present for display and serialization only. The decoder never yields
    /// this role: an unrecognized code is a decode failure.
    Unknown,
}

impl Role {
    /// Classify a two-character role code.
    ///
    /// # Errors
    /// Returns `DecodeError::UnknownRole` for any code other than
    /// `01`, `02` or `11`.
    ///
    /// # Examples
    ///
    /// ```
    /// use oruca_core::Role;
    ///
    /// assert_eq!(Role::from_code("02").unwrap(), Role::Student);
    /// assert_eq!(Role::from_code("11").unwrap(), Role::Staff);
    /// assert!(Role::from_code("21").is_err());
    /// ```
    pub fn from_code(code: &str) -> Result<Self> {
        if STUDENT_ROLE_CODES.contains(&code) {
            Ok(Role::Student)
        } else if code == STAFF_ROLE_CODE {
            Ok(Role::Staff)
        } else {
            Err(DecodeError::UnknownRole {
                code: code.to_string(),
            })
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Staff => "staff",
            Role::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Seven-character card holder identifier (ASCII alphanumeric).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StudentId(String);

impl StudentId {
    /// Create a new identifier with validation.
    ///
    /// # Errors
    /// Returns `DecodeError::InvalidIdentifier` if the identifier is not
    /// exactly 7 ASCII alphanumeric characters.
    pub fn new(id: &str) -> Result<Self> {
        let len = id.chars().count();
        if len != IDENTIFIER_LENGTH {
            return Err(DecodeError::InvalidIdentifier {
                identifier: id.to_string(),
                reason: format!("expected {IDENTIFIER_LENGTH} chars, got {len}"),
            });
        }

        if !id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(DecodeError::InvalidIdentifier {
                identifier: id.to_string(),
                reason: "must be ASCII alphanumeric".to_string(),
            });
        }

        Ok(StudentId(id.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for StudentId {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self> {
        StudentId::new(s)
    }
}

impl TryFrom<String> for StudentId {
    type Error = DecodeError;

    fn try_from(value: String) -> Result<Self> {
        StudentId::new(&value)
    }
}

impl From<StudentId> for String {
    fn from(id: StudentId) -> Self {
        id.0
    }
}

/// Decoded identity of the card holder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub role: Role,
    pub student_id: StudentId,
}

impl IdentityRecord {
    pub fn new(role: Role, student_id: StudentId) -> Self {
        Self { role, student_id }
    }
}

impl fmt::Display for IdentityRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.student_id, self.role)
    }
}

/// Bytes of the identity block as read from the card.
///
/// Produced by the hardware layer once per card interaction and handed to
/// [`decode`](crate::decode).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTagRecord(Vec<u8>);

impl RawTagRecord {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for RawTagRecord {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for RawTagRecord {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<&str> for RawTagRecord {
    fn from(text: &str) -> Self {
        Self(text.as_bytes().to_vec())
    }
}

/// Correlation id minted once per settled card presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresentationId(Uuid);

impl PresentationId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PresentationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PresentationId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Request to publish one settled presentation.
///
/// Emitted by the presence tracker on card release, consumed exactly once by
/// the publisher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishIntent {
    pub presentation_id: PresentationId,
    pub record: IdentityRecord,
}

impl PublishIntent {
    pub fn new(record: IdentityRecord) -> Self {
        Self {
            presentation_id: PresentationId::new(),
            record,
        }
    }
}
