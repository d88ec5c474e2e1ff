//! Reader trait definitions.
//!
//! This module defines the contract between the reader loop and the
//! contactless hardware. A [`TagReader`] owns the physical session and, on
//! each [`poll`](TagReader::poll), performs one card interaction, reporting
//! it through the synchronous [`TagEvents`] callbacks:
//!
//! ```text
//! poll ─┬─ no card within the wait window ──────────────► Ok(true)
//!       └─ card detected ─► on_connect ─┬─ (re-polled) ─► on_connect ...
//!                                       └─ card left ───► on_release ─► Ok(..)
//! ```
//!
//! Callbacks run sequentially inside `poll`, never concurrently. Their return
//! value tells the reader whether to keep polling.
//!
//! All async methods use native `async fn` in traits (Edition 2024 RPITIT),
//! so the traits are not object-safe. Use generics, or
//! [`AnyTagReader`](crate::devices::AnyTagReader) for dispatch over concrete
//! readers.

#![allow(async_fn_in_trait)]

use oruca_core::RawTagRecord;
use oruca_core::constants::{FELICA_IDM_LENGTH, FELICA_SYSTEM_CODE};

use crate::error::{HardwareError, Result, TagReadError};
use crate::types::{CardFamily, ReaderInfo};

/// A card as seen by the reader during one interaction.
///
/// Carries the card metadata plus the outcome of reading the identity block.
/// A failed block read does not end the reader session; it is reported to
/// the callbacks through [`identity_block`](TagHandle::identity_block).
#[derive(Debug, Clone)]
pub struct TagHandle {
    /// FeliCa manufacture ID (8 bytes), empty if the reader could not get it.
    pub idm: Vec<u8>,

    /// Detected card family.
    pub family: CardFamily,

    /// System codes the card reported.
    pub system_codes: Vec<u16>,

    /// Timestamp when the card was detected.
    pub detected_at: chrono::DateTime<chrono::Utc>,

    block: std::result::Result<RawTagRecord, TagReadError>,
}

impl TagHandle {
    /// Create a builder for a tag of the given family.
    ///
    /// # Examples
    ///
    /// ```
    /// use oruca_hardware::traits::TagHandle;
    /// use oruca_hardware::types::CardFamily;
    ///
    /// let tag = TagHandle::builder(CardFamily::FelicaStandard)
    ///     .idm(vec![0x01, 0x2E, 0x4C, 0xD3, 0x8A, 0x11, 0x22, 0x33])
    ///     .block("01AB12345")
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(tag.idm_hex(), "012E4CD38A112233");
    /// assert!(tag.identity_block().is_ok());
    /// ```
    pub fn builder(family: CardFamily) -> TagHandleBuilder {
        TagHandleBuilder::new(family)
    }

    /// Shorthand for a FeliCa Standard card in the common area carrying
    /// `block` as its identity block.
    ///
    /// # Examples
    ///
    /// ```
    /// use oruca_hardware::traits::TagHandle;
    ///
    /// let tag = TagHandle::felica("01AB12345");
    /// assert_eq!(tag.identity_block().unwrap().as_bytes(), b"01AB12345");
    /// ```
    pub fn felica(block: impl Into<RawTagRecord>) -> Self {
        Self {
            idm: Vec::new(),
            family: CardFamily::FelicaStandard,
            system_codes: vec![FELICA_SYSTEM_CODE],
            detected_at: chrono::Utc::now(),
            block: Ok(block.into()),
        }
    }

    /// Get the IDm as an uppercase hexadecimal string.
    pub fn idm_hex(&self) -> String {
        self.idm.iter().map(|b| format!("{:02X}", b)).collect()
    }

    /// Get the identity block read from the card.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The card is not a FeliCa Standard card
    /// - The card does not expose system code `0xFE00`
    /// - The block read itself failed
    pub fn identity_block(&self) -> std::result::Result<&RawTagRecord, TagReadError> {
        if !self.family.is_supported() {
            return Err(TagReadError::UnsupportedCard {
                family: self.family.name().to_string(),
            });
        }

        if !self.system_codes.contains(&FELICA_SYSTEM_CODE) {
            return Err(TagReadError::SystemCodeMissing {
                system_code: FELICA_SYSTEM_CODE,
            });
        }

        self.block.as_ref().map_err(Clone::clone)
    }
}

/// Builder for constructing TagHandle with optional fields.
#[derive(Debug, Clone)]
pub struct TagHandleBuilder {
    family: CardFamily,
    idm: Vec<u8>,
    system_codes: Option<Vec<u16>>,
    detected_at: Option<chrono::DateTime<chrono::Utc>>,
    block: std::result::Result<RawTagRecord, TagReadError>,
}

impl TagHandleBuilder {
    /// Create a new builder. System codes default to `[0xFE00]` for FeliCa
    /// Standard cards and empty otherwise.
    pub fn new(family: CardFamily) -> Self {
        Self {
            family,
            idm: Vec::new(),
            system_codes: None,
            detected_at: None,
            block: Err(TagReadError::read_failed("identity block not read")),
        }
    }

    pub fn idm(mut self, idm: Vec<u8>) -> Self {
        self.idm = idm;
        self
    }

    pub fn system_codes(mut self, system_codes: Vec<u16>) -> Self {
        self.system_codes = Some(system_codes);
        self
    }

    pub fn detected_at(mut self, timestamp: chrono::DateTime<chrono::Utc>) -> Self {
        self.detected_at = Some(timestamp);
        self
    }

    /// Set the identity block contents.
    pub fn block(mut self, block: impl Into<RawTagRecord>) -> Self {
        self.block = Ok(block.into());
        self
    }

    /// Record that the identity block could not be read.
    pub fn read_error(mut self, error: TagReadError) -> Self {
        self.block = Err(error);
        self
    }

    /// Build the TagHandle with validation.
    ///
    /// # Errors
    ///
    /// Returns an error if an IDm was given that is not 8 bytes long.
    pub fn build(self) -> Result<TagHandle> {
        if !self.idm.is_empty() && self.idm.len() != FELICA_IDM_LENGTH {
            return Err(HardwareError::invalid_data(format!(
                "IDm must be {} bytes, got {}",
                FELICA_IDM_LENGTH,
                self.idm.len()
            )));
        }

        let system_codes = self.system_codes.unwrap_or_else(|| {
            if self.family == CardFamily::FelicaStandard {
                vec![FELICA_SYSTEM_CODE]
            } else {
                Vec::new()
            }
        });

        Ok(TagHandle {
            idm: self.idm,
            family: self.family,
            system_codes,
            detected_at: self.detected_at.unwrap_or_else(chrono::Utc::now),
            block: self.block,
        })
    }
}

/// Callbacks invoked by a reader during a card interaction.
///
/// Both callbacks return `true` to keep polling for the next interaction.
pub trait TagEvents: Send {
    /// A card entered the field, or the reader re-polled a card still in it.
    fn on_connect(&mut self, tag: &TagHandle) -> bool;

    /// The card that was last connected has left the field.
    fn on_release(&mut self, tag: &TagHandle) -> bool;
}

/// Contactless reader abstraction.
///
/// # Examples
///
/// ```no_run
/// use oruca_hardware::traits::{TagEvents, TagHandle, TagReader};
/// use oruca_hardware::error::Result;
///
/// struct Printer;
///
/// impl TagEvents for Printer {
///     fn on_connect(&mut self, tag: &TagHandle) -> bool {
///         println!("card {}", tag.idm_hex());
///         true
///     }
///
///     fn on_release(&mut self, _tag: &TagHandle) -> bool {
///         println!("card gone");
///         true
///     }
/// }
///
/// async fn watch<R: TagReader>(reader: &mut R) -> Result<()> {
///     reader.open().await?;
///     while reader.poll(&mut Printer).await? {}
///     reader.close().await;
///     Ok(())
/// }
/// ```
pub trait TagReader: Send {
    /// Acquire the reader and start a session.
    ///
    /// # Errors
    ///
    /// Returns an error if no reader is attached or it cannot be initialized.
    async fn open(&mut self) -> Result<ReaderInfo>;

    /// Perform at most one card interaction.
    ///
    /// Returns `Ok(true)` to continue polling, `Ok(false)` if a callback asked
    /// to stop. May return `Ok(true)` without invoking any callback when no
    /// card shows up within the reader's wait window.
    ///
    /// # Errors
    ///
    /// Returns an error if the session is lost (reader unplugged, driver
    /// gone). Card-level read failures are not errors here; they reach the
    /// callbacks through [`TagHandle::identity_block`].
    async fn poll<E: TagEvents>(&mut self, events: &mut E) -> Result<bool>;

    /// Release the reader. Idempotent.
    async fn close(&mut self);
}
