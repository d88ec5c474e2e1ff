//! Presence tracker fed by reader callbacks.

use oruca_core::{IdentityRecord, PublishIntent, decode};
use oruca_hardware::TagHandle;

use crate::state_machine::{PresenceState, ReadFailure};

/// Event counters for one tracker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PresenceStats {
    /// Connect callbacks seen, re-polls included.
    pub connects: u64,

    /// Connects whose card could not be read or decoded.
    pub read_failures: u64,

    /// Releases that emitted a publish intent.
    pub settled: u64,

    /// Releases that found nothing armed.
    pub empty_releases: u64,
}

/// Turns connect/release callbacks into at most one publish intent per
/// card presentation.
///
/// The tracker is not shared: it lives inside the reader loop and is driven
/// from the reader's callbacks, which never run concurrently.
///
/// # Examples
///
/// ```
/// use oruca_hardware::TagHandle;
/// use oruca_presence::PresenceTracker;
///
/// let mut tracker = PresenceTracker::new();
/// let tag = TagHandle::felica("01AB12345");
///
/// // The reader re-polls the card while it stays in the field.
/// tracker.on_connect(&tag);
/// tracker.on_connect(&tag);
///
/// let intent = tracker.on_release().unwrap();
/// assert_eq!(intent.record.student_id.as_str(), "AB12345");
/// assert!(tracker.on_release().is_none());
/// ```
#[derive(Debug, Default)]
pub struct PresenceTracker {
    state: PresenceState,
    stats: PresenceStats,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &PresenceState {
        &self.state
    }

    pub fn is_armed(&self) -> bool {
        self.state.is_armed()
    }

    pub fn stats(&self) -> PresenceStats {
        self.stats
    }

    /// Handle a connect callback for `tag`.
    pub fn on_connect(&mut self, tag: &TagHandle) {
        let read = tag
            .identity_block()
            .map_err(ReadFailure::from)
            .and_then(|raw| decode(raw).map_err(ReadFailure::from));

        if let Err(failure) = &read {
            tracing::warn!(
                idm = %tag.idm_hex(),
                family = %tag.family,
                error = %failure,
                "Card could not be read"
            );
        }

        self.apply_read(read);
    }

    /// Apply the outcome of reading a card.
    ///
    /// Lower-level entry point for [`on_connect`](Self::on_connect).
    pub fn apply_read(&mut self, read: Result<IdentityRecord, ReadFailure>) {
        self.stats.connects += 1;

        match &read {
            Ok(record) => match self.state.armed_record() {
                Some(previous) if previous != record => tracing::debug!(
                    previous = %previous.student_id,
                    student_id = %record.student_id,
                    role = %record.role,
                    "Armed record replaced"
                ),
                Some(_) => tracing::trace!(student_id = %record.student_id, "Card re-polled"),
                None => tracing::debug!(
                    student_id = %record.student_id,
                    role = %record.role,
                    "Card armed"
                ),
            },
            Err(_) => {
                self.stats.read_failures += 1;
                if let Some(previous) = self.state.armed_record() {
                    tracing::debug!(student_id = %previous.student_id, "Armed record discarded");
                }
            }
        }

        let transition = std::mem::take(&mut self.state).on_connect(read);
        self.state = transition.next;
    }

    /// Handle a release callback.
    ///
    /// Returns the intent to publish if a record was armed. The tracker is
    /// idle afterwards whatever happens to the intent.
    pub fn on_release(&mut self) -> Option<PublishIntent> {
        let transition = std::mem::take(&mut self.state).on_release();
        self.state = transition.next;

        match &transition.intent {
            Some(intent) => {
                self.stats.settled += 1;
                tracing::info!(
                    presentation_id = %intent.presentation_id,
                    student_id = %intent.record.student_id,
                    role = %intent.record.role,
                    "Card presentation settled"
                );
            }
            None => {
                self.stats.empty_releases += 1;
                tracing::debug!("Release with nothing armed");
            }
        }

        transition.intent
    }

    /// Disarm without emitting.
    ///
    /// Returns the record that was discarded, if any.
    pub fn reset(&mut self) -> Option<IdentityRecord> {
        match std::mem::take(&mut self.state) {
            PresenceState::Armed(record) => Some(record),
            PresenceState::Idle => None,
        }
    }
}
