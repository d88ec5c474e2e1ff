//! Core types for the OruCa NFC attendance reader.
//!
//! This crate holds the identity data model shared by every other crate and
//! the tag decoder that turns the raw FeliCa block into an
//! [`IdentityRecord`].

pub mod constants;
pub mod decoder;
pub mod error;
pub mod types;

pub use decoder::decode;
pub use error::{DecodeError, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
