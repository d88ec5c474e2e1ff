//! Wire protocol for the OruCa attendance API.
//!
//! The API speaks JSON objects of the form
//! `{"type": <message type>, "payload": {...}}` over WebSocket or HTTP.
//! This crate models the `log/write` envelope the reader sends when a card
//! presentation settles.

pub mod envelope;
pub mod error;
pub mod message_type;

pub use envelope::{LogWriteContent, LogWritePayload, PublishEnvelope};
pub use error::{ProtocolError, Result};
pub use message_type::MessageType;
