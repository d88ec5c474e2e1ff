//! Mock reader for testing and simulation.
//!
//! The mock is driven programmatically; no physical hardware is needed.

pub mod reader;

pub use reader::{MockReader, MockReaderHandle};
