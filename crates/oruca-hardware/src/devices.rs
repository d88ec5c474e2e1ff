//! Enum wrapper for reader dispatch.
//!
//! Native `async fn` in traits is not object-safe, so `Box<dyn TagReader>` is
//! not available. [`AnyTagReader`] gives the binary a single concrete type to
//! hold whichever reader the configuration selected, with feature-gated
//! variants for real hardware.
//!
//! # Examples
//!
//! ```
//! use oruca_hardware::devices::AnyTagReader;
//! use oruca_hardware::mock::MockReader;
//! use oruca_hardware::traits::TagReader;
//!
//! #[tokio::main]
//! async fn main() -> oruca_hardware::Result<()> {
//!     let (reader, _handle) = MockReader::new();
//!     let mut reader = AnyTagReader::Mock(reader);
//!
//!     let info = reader.open().await?;
//!     assert_eq!(info.driver, "mock");
//!     Ok(())
//! }
//! ```

use crate::mock::MockReader;
use crate::traits::{TagEvents, TagReader};
use crate::{ReaderInfo, Result};

#[cfg(feature = "hardware-pcsc")]
use crate::pcsc::PcscReader;

/// Any supported reader.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyTagReader {
    /// Programmable reader for tests and simulation.
    Mock(MockReader),

    /// PC/SC reader (PaSoRi RC-S380 and compatible).
    #[cfg(feature = "hardware-pcsc")]
    Pcsc(PcscReader),
}

impl AnyTagReader {
    /// Short backend name, as reported in [`ReaderInfo::driver`].
    pub fn driver(&self) -> &'static str {
        match self {
            Self::Mock(_) => "mock",
            #[cfg(feature = "hardware-pcsc")]
            Self::Pcsc(_) => "pcsc",
        }
    }
}

impl TagReader for AnyTagReader {
    async fn open(&mut self) -> Result<ReaderInfo> {
        match self {
            Self::Mock(reader) => reader.open().await,
            #[cfg(feature = "hardware-pcsc")]
            Self::Pcsc(reader) => reader.open().await,
        }
    }

    async fn poll<E: TagEvents>(&mut self, events: &mut E) -> Result<bool> {
        match self {
            Self::Mock(reader) => reader.poll(events).await,
            #[cfg(feature = "hardware-pcsc")]
            Self::Pcsc(reader) => reader.poll(events).await,
        }
    }

    async fn close(&mut self) {
        match self {
            Self::Mock(reader) => reader.close().await,
            #[cfg(feature = "hardware-pcsc")]
            Self::Pcsc(reader) => reader.close().await,
        }
    }
}

impl From<MockReader> for AnyTagReader {
    fn from(reader: MockReader) -> Self {
        Self::Mock(reader)
    }
}

#[cfg(feature = "hardware-pcsc")]
impl From<PcscReader> for AnyTagReader {
    fn from(reader: PcscReader) -> Self {
        Self::Pcsc(reader)
    }
}
