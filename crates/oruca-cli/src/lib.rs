//! OruCa attendance reader binary support.
//!
//! Everything the `oruca-nfc` binary needs besides `main`: argument parsing,
//! layered configuration, logging setup, the reader session loop and the
//! stdin-driven simulated reader.

#![forbid(unsafe_code)]

pub mod app;
pub mod cli;
pub mod config;
pub mod logging;
pub mod reader_loop;
pub mod simulated;

pub use config::Settings;
pub use reader_loop::{IntentSink, LoopStats, ReaderLoop, ReaderLoopConfig};
