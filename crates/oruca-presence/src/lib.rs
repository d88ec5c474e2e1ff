//! Card presence tracking.
//!
//! Readers re-poll a card for as long as it stays in the field, so a single
//! physical presentation shows up as any number of connect callbacks followed
//! by one release. This crate collapses that sequence into exactly one
//! [`PublishIntent`](oruca_core::PublishIntent), emitted when the card leaves.
//!
//! ```text
//!            connect(ok)                     connect(ok)
//!   ┌──────┐ ─────────────► ┌─────────────┐ ◄──────┐
//!   │ Idle │                │ Armed(rec)  │ ───────┘
//!   └──────┘ ◄───────────── └─────────────┘
//!      ▲  connect(failure)        │
//!      │                          │ release ─► PublishIntent(rec)
//!      └──────────────────────────┘
//! ```
//!
//! [`PresenceState`] holds the pure transitions; [`PresenceTracker`] feeds it
//! from reader callbacks, logs, and keeps counters.

pub mod state_machine;
pub mod tracker;

pub use state_machine::{PresenceState, ReadFailure, Transition};
pub use tracker::{PresenceStats, PresenceTracker};
