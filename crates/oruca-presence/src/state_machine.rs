//! Two-state presence machine.
//!
//! # States
//!
//! - `Idle`: no card pending publication
//! - `Armed`: a decoded card is in the field, waiting for it to leave
//!
//! # Transitions
//!
//! | From  | Event             | To    | Emits          |
//! |-------|-------------------|-------|----------------|
//! | any   | connect, read ok  | Armed | nothing        |
//! | any   | connect, failure  | Idle  | nothing        |
//! | Armed | release           | Idle  | `PublishIntent`|
//! | Idle  | release           | Idle  | nothing        |
//!
//! A failed read while armed disarms, so a card that becomes unreadable is
//! never published with stale data.
//!
//! # Examples
//!
//! ```
//! use oruca_core::{IdentityRecord, Role, StudentId};
//! use oruca_presence::PresenceState;
//!
//! let record = IdentityRecord::new(Role::Student, StudentId::new("AB12345").unwrap());
//!
//! let armed = PresenceState::Idle.on_connect(Ok(record.clone()));
//! assert!(armed.intent.is_none());
//!
//! let released = armed.next.on_release();
//! assert_eq!(released.next, PresenceState::Idle);
//! assert_eq!(released.intent.unwrap().record, record);
//! ```

use std::fmt;

use oruca_core::{DecodeError, IdentityRecord, PublishIntent};
use oruca_hardware::TagReadError;
use serde::{Deserialize, Serialize};

/// Why a connect callback did not yield an identity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReadFailure {
    /// The card or the block on it could not be read.
    #[error("tag read failed: {0}")]
    Tag(#[from] TagReadError),

    /// The block was read but does not hold a valid identity.
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),
}

/// Presence state of the reader field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceState {
    /// No record waiting for publication.
    #[default]
    Idle,

    /// A record waiting for the card to leave the field.
    Armed(IdentityRecord),
}

/// Outcome of applying one event to a [`PresenceState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// State after the event.
    pub next: PresenceState,

    /// Publication requested by the event, if any.
    pub intent: Option<PublishIntent>,
}

impl Transition {
    fn to(next: PresenceState) -> Self {
        Self { next, intent: None }
    }
}

impl PresenceState {
    /// Apply a connect (or re-poll) event.
    ///
    /// A successful read arms the machine with the new record, replacing any
    /// record already armed. A failed read disarms. Never emits an intent.
    #[must_use]
    pub fn on_connect(self, read: Result<IdentityRecord, ReadFailure>) -> Transition {
        match read {
            Ok(record) => Transition::to(PresenceState::Armed(record)),
            Err(_) => Transition::to(PresenceState::Idle),
        }
    }

    /// Apply a release event.
    ///
    /// Emits one intent carrying the armed record and returns to `Idle`.
    /// Releasing while `Idle` is a no-op.
    #[must_use]
    pub fn on_release(self) -> Transition {
        match self {
            PresenceState::Armed(record) => Transition {
                next: PresenceState::Idle,
                intent: Some(PublishIntent::new(record)),
            },
            PresenceState::Idle => Transition::to(PresenceState::Idle),
        }
    }

    pub fn is_armed(&self) -> bool {
        matches!(self, PresenceState::Armed(_))
    }

    /// The record waiting for publication.
    pub fn armed_record(&self) -> Option<&IdentityRecord> {
        match self {
            PresenceState::Armed(record) => Some(record),
            PresenceState::Idle => None,
        }
    }
}

impl fmt::Display for PresenceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresenceState::Idle => f.write_str("Idle"),
            PresenceState::Armed(record) => write!(f, "Armed({})", record.student_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oruca_core::{Role, StudentId};
    use rstest::rstest;

    fn record(id: &str) -> IdentityRecord {
        IdentityRecord::new(Role::Student, StudentId::new(id).unwrap())
    }

    fn failure() -> ReadFailure {
        ReadFailure::Decode(DecodeError::UnknownRole {
            code: "99".to_string(),
        })
    }

    #[test]
    fn test_default_is_idle() {
        assert_eq!(PresenceState::default(), PresenceState::Idle);
        assert!(!PresenceState::default().is_armed());
    }

    #[rstest]
    #[case::from_idle(PresenceState::Idle)]
    #[case::from_armed(PresenceState::Armed(record("OLD0001")))]
    fn test_successful_connect_arms_with_new_record(#[case] start: PresenceState) {
        let transition = start.on_connect(Ok(record("AB12345")));

        assert_eq!(transition.next, PresenceState::Armed(record("AB12345")));
        assert!(transition.intent.is_none());
    }

    #[rstest]
    #[case::from_idle(PresenceState::Idle)]
    #[case::from_armed(PresenceState::Armed(record("AB12345")))]
    fn test_failed_connect_disarms(#[case] start: PresenceState) {
        let transition = start.on_connect(Err(failure()));

        assert_eq!(transition.next, PresenceState::Idle);
        assert!(transition.intent.is_none());
    }

    #[test]
    fn test_release_when_armed_emits_once() {
        let transition = PresenceState::Armed(record("AB12345")).on_release();

        assert_eq!(transition.next, PresenceState::Idle);
        let intent = transition.intent.unwrap();
        assert_eq!(intent.record, record("AB12345"));

        // The follow-up release has nothing left to emit.
        assert!(transition.next.on_release().intent.is_none());
    }

    #[test]
    fn test_release_when_idle_is_noop() {
        let transition = PresenceState::Idle.on_release();
        assert_eq!(transition.next, PresenceState::Idle);
        assert!(transition.intent.is_none());
    }

    #[test]
    fn test_each_settle_gets_its_own_presentation_id() {
        let first = PresenceState::Armed(record("AB12345")).on_release();
        let second = PresenceState::Armed(record("AB12345")).on_release();

        assert_ne!(
            first.intent.unwrap().presentation_id,
            second.intent.unwrap().presentation_id
        );
    }

    #[test]
    fn test_armed_record_accessor() {
        let state = PresenceState::Armed(record("AB12345"));
        assert_eq!(state.armed_record(), Some(&record("AB12345")));
        assert_eq!(PresenceState::Idle.armed_record(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(PresenceState::Idle.to_string(), "Idle");
        assert_eq!(
            PresenceState::Armed(record("AB12345")).to_string(),
            "Armed(AB12345)"
        );
    }

    #[test]
    fn test_state_serialization() {
        let state = PresenceState::Armed(record("AB12345"));
        let json = serde_json::to_string(&state).unwrap();
        let back: PresenceState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn test_read_failure_display() {
        let failure = ReadFailure::from(TagReadError::read_failed("timeout"));
        assert_eq!(failure.to_string(), "tag read failed: Block read failed: timeout");
    }
}
