//! Contactless reader abstraction for the OruCa attendance reader.
//!
//! This crate hides the physical FeliCa reader behind the [`TagReader`] trait
//! so the reader loop can run against a real PC/SC device or a programmable
//! mock with the same code.
//!
//! # Readers
//!
//! - [`MockReader`](mock::MockReader): driven through a
//!   [`MockReaderHandle`](mock::MockReaderHandle), used by tests and by the
//!   simulated reader mode of the binary.
//! - `PcscReader`: PC/SC driver for Sony PaSoRi and compatible readers.
//!   Requires the `hardware-pcsc` feature and a running `pcscd`.
//!
//! # Interaction model
//!
//! Each call to [`TagReader::poll`] performs at most one card interaction and
//! reports it through [`TagEvents`]:
//!
//! ```no_run
//! use oruca_hardware::mock::MockReader;
//! use oruca_hardware::traits::{TagEvents, TagHandle, TagReader};
//!
//! struct Log;
//!
//! impl TagEvents for Log {
//!     fn on_connect(&mut self, tag: &TagHandle) -> bool {
//!         println!("connect: {:?}", tag.identity_block());
//!         true
//!     }
//!
//!     fn on_release(&mut self, _tag: &TagHandle) -> bool {
//!         println!("release");
//!         true
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> oruca_hardware::Result<()> {
//!     let (mut reader, handle) = MockReader::new();
//!     reader.open().await?;
//!
//!     handle.present_payload("01AB12345").await?;
//!     handle.remove().await?;
//!
//!     reader.poll(&mut Log).await?;
//!     reader.poll(&mut Log).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Errors
//!
//! Session-level failures surface as [`HardwareError`] and end the session.
//! Failures to read a single card surface as [`TagReadError`] inside the
//! [`TagHandle`] and leave the session running.

pub mod devices;
pub mod error;
pub mod mock;
#[cfg(feature = "hardware-pcsc")]
pub mod pcsc;
pub mod traits;
pub mod types;

pub use devices::AnyTagReader;
pub use error::{HardwareError, Result, TagReadError};
pub use traits::{TagEvents, TagHandle, TagHandleBuilder, TagReader};
pub use types::{CardFamily, ReaderInfo};
