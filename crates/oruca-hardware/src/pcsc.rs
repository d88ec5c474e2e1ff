//! PC/SC reader for FeliCa cards.
//!
//! Talks to Sony PaSoRi (RC-S380) and compatible readers through `pcscd`
//! using the PC/SC pseudo-APDUs for contactless cards:
//!
//! ```text
//! GET DATA (IDm)    FF CA 00 00 00
//! SELECT FILE       FF A4 00 01 02 <service code, little endian>
//! READ BINARY       FF B0 00 <block> 10
//! ```
//!
//! PC/SC calls block, so every call runs inside
//! [`tokio::task::block_in_place`]. This requires the multi-threaded runtime.

use std::ffi::CString;
use std::time::Duration;

use oruca_core::RawTagRecord;
use oruca_core::constants::{
    FELICA_BLOCK_SIZE, FELICA_IDENTITY_BLOCK, FELICA_SERVICE_CODE, FELICA_SYSTEM_CODE,
};
use pcsc::{Attribute, Card, Context, Disposition, Protocols, ReaderState, Scope, ShareMode, State};

use crate::error::{HardwareError, Result, TagReadError};
use crate::traits::{TagEvents, TagHandle, TagReader};
use crate::types::{CardFamily, ReaderInfo};

/// Registered application provider identifier of PC/SC Part 3.
const PCSC_RID: [u8; 5] = [0xA0, 0x00, 0x00, 0x03, 0x06];

/// PC/SC Part 3 standard byte for FeliCa.
const STANDARD_FELICA: u8 = 0x11;

/// PC/SC Part 3 standard byte for ISO 14443 A part 3.
const STANDARD_ISO14443A: u8 = 0x03;

const SW_SUCCESS: [u8; 2] = [0x90, 0x00];
const SW_FILE_NOT_FOUND: [u8; 2] = [0x6A, 0x82];

/// Default wait for a card state change before `poll` yields.
pub const DEFAULT_STATUS_TIMEOUT: Duration = Duration::from_millis(1000);

/// PC/SC reader configuration.
#[derive(Debug, Clone)]
pub struct PcscConfig {
    /// Reader to use; the first reader found when `None`.
    pub reader_name: Option<String>,

    /// How long one status query may block.
    pub status_timeout: Duration,
}

impl Default for PcscConfig {
    fn default() -> Self {
        Self {
            reader_name: None,
            status_timeout: DEFAULT_STATUS_TIMEOUT,
        }
    }
}

struct Session {
    context: Context,
    reader: CString,
    last_state: State,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("reader", &self.reader)
            .field("last_state", &self.last_state)
            .finish_non_exhaustive()
    }
}

/// PC/SC contactless reader.
#[derive(Debug)]
pub struct PcscReader {
    config: PcscConfig,
    session: Option<Session>,
}

impl PcscReader {
    pub fn new(config: PcscConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    fn session_mut(&mut self) -> Result<&mut Session> {
        self.session
            .as_mut()
            .ok_or_else(|| HardwareError::session_lost("reader is not open"))
    }

    fn wait_for(&mut self, wanted: State) -> Result<bool> {
        let timeout = self.config.status_timeout;
        let session = self.session_mut()?;

        let mut states = [ReaderState::new(session.reader.clone(), session.last_state)];
        match tokio::task::block_in_place(|| session.context.get_status_change(timeout, &mut states))
        {
            Ok(()) => {}
            Err(pcsc::Error::Timeout) => return Ok(false),
            Err(error) => return Err(session_error(error)),
        }

        let event = states[0].event_state();
        let mut current = event;
        current.remove(State::CHANGED);
        session.last_state = current;

        if event.intersects(State::UNAVAILABLE | State::UNKNOWN | State::IGNORE) {
            return Err(HardwareError::session_lost(format!(
                "reader {} unavailable",
                session.reader.to_string_lossy()
            )));
        }

        Ok(event.contains(wanted))
    }

    fn read_tag(&mut self) -> Result<TagHandle> {
        let session = self.session_mut()?;

        let card = match tokio::task::block_in_place(|| {
            session
                .context
                .connect(&session.reader, ShareMode::Shared, Protocols::ANY)
        }) {
            Ok(card) => card,
            Err(error) => {
                let failure = Failure::from(error);
                return TagHandle::builder(CardFamily::Unknown(Vec::new()))
                    .read_error(failure.into_tag_error()?)
                    .build();
            }
        };

        let result = tokio::task::block_in_place(|| read_card(&card));

        if let Err((_, error)) =
            tokio::task::block_in_place(|| card.disconnect(Disposition::LeaveCard))
        {
            tracing::debug!(error = %error, "Card disconnect failed");
        }

        result
    }
}

impl TagReader for PcscReader {
    async fn open(&mut self) -> Result<ReaderInfo> {
        self.session = None;

        let context = tokio::task::block_in_place(|| Context::establish(Scope::User))
            .map_err(|e| HardwareError::initialization_failed(format!("PC/SC context: {e}")))?;

        let readers = match tokio::task::block_in_place(|| context.list_readers_owned()) {
            Ok(readers) => readers,
            Err(pcsc::Error::NoReadersAvailable) => return Err(HardwareError::NoReader),
            Err(error) => return Err(HardwareError::initialization_failed(error.to_string())),
        };

        let reader = match &self.config.reader_name {
            Some(wanted) => readers
                .into_iter()
                .find(|name| name.to_string_lossy().contains(wanted.as_str())),
            None => readers.into_iter().next(),
        }
        .ok_or(HardwareError::NoReader)?;

        let name = reader.to_string_lossy().into_owned();
        tracing::info!(reader = %name, "PC/SC reader acquired");

        self.session = Some(Session {
            context,
            reader,
            last_state: State::UNAWARE,
        });

        Ok(ReaderInfo::new(name, "pcsc"))
    }

    async fn poll<E: TagEvents>(&mut self, events: &mut E) -> Result<bool> {
        if !self.wait_for(State::PRESENT)? {
            return Ok(true);
        }

        let tag = self.read_tag()?;
        if !events.on_connect(&tag) {
            return Ok(false);
        }

        while !self.wait_for(State::EMPTY)? {
            tokio::task::yield_now().await;
        }

        Ok(events.on_release(&tag))
    }

    async fn close(&mut self) {
        if let Some(session) = self.session.take() {
            tracing::debug!(reader = %session.reader.to_string_lossy(), "PC/SC reader released");
        }
    }
}

/// Classification of a PC/SC failure.
enum Failure {
    Card(TagReadError),
    Session(HardwareError),
}

impl Failure {
    fn into_tag_error(self) -> Result<TagReadError> {
        match self {
            Self::Card(error) => Ok(error),
            Self::Session(error) => Err(error),
        }
    }
}

impl From<pcsc::Error> for Failure {
    fn from(error: pcsc::Error) -> Self {
        match error {
            pcsc::Error::RemovedCard
            | pcsc::Error::ResetCard
            | pcsc::Error::NoSmartcard
            | pcsc::Error::UnresponsiveCard
            | pcsc::Error::UnpoweredCard
            | pcsc::Error::UnsupportedCard
            | pcsc::Error::ProtoMismatch => Self::Card(TagReadError::read_failed(error.to_string())),
            other => Self::Session(session_error(other)),
        }
    }
}

fn session_error(error: pcsc::Error) -> HardwareError {
    match error {
        pcsc::Error::NoReadersAvailable
        | pcsc::Error::ReaderUnavailable
        | pcsc::Error::UnknownReader
        | pcsc::Error::NoService
        | pcsc::Error::ServiceStopped
        | pcsc::Error::InvalidHandle => HardwareError::session_lost(error.to_string()),
        other => HardwareError::communication(other.to_string()),
    }
}

/// Detect the card family from the ATR.
fn card_family(atr: &[u8]) -> CardFamily {
    let standard = atr
        .windows(PCSC_RID.len() + 1)
        .find(|w| w[..PCSC_RID.len()] == PCSC_RID)
        .map(|w| w[PCSC_RID.len()]);

    match standard {
        Some(STANDARD_FELICA) => CardFamily::FelicaStandard,
        Some(STANDARD_ISO14443A) => CardFamily::Iso14443A,
        _ => CardFamily::Unknown(atr.to_vec()),
    }
}

/// Response data on `90 00`, otherwise the status word.
type ApduResponse = std::result::Result<Vec<u8>, [u8; 2]>;

/// Send an APDU and strip the status word.
fn transmit(card: &Card, apdu: &[u8]) -> std::result::Result<ApduResponse, pcsc::Error> {
    let mut buffer = [0u8; pcsc::MAX_BUFFER_SIZE];
    let response = card.transmit(apdu, &mut buffer)?;

    if response.len() < 2 {
        return Ok(Err([0, 0]));
    }

    let (data, sw) = response.split_at(response.len() - 2);
    if sw == SW_SUCCESS {
        Ok(Ok(data.to_vec()))
    } else {
        Ok(Err([sw[0], sw[1]]))
    }
}

fn read_card(card: &Card) -> Result<TagHandle> {
    let atr = card
        .get_attribute_owned(Attribute::AtrString)
        .unwrap_or_default();
    let family = card_family(&atr);
    let builder = TagHandle::builder(family.clone());

    if !family.is_supported() {
        return builder.build();
    }

    match read_identity(card) {
        Ok(Identity {
            idm,
            system_codes,
            block,
        }) => {
            let builder = builder.idm(idm).system_codes(system_codes);
            match block {
                Ok(raw) => builder.block(raw).build(),
                Err(error) => builder.read_error(error).build(),
            }
        }
        Err(failure) => builder.read_error(failure.into_tag_error()?).build(),
    }
}

struct Identity {
    idm: Vec<u8>,
    system_codes: Vec<u16>,
    block: std::result::Result<RawTagRecord, TagReadError>,
}

fn read_identity(card: &Card) -> std::result::Result<Identity, Failure> {
    let idm = match transmit(card, &[0xFF, 0xCA, 0x00, 0x00, 0x00])? {
        Ok(idm) => idm,
        Err(_) => Vec::new(),
    };

    let [lsb, msb] = FELICA_SERVICE_CODE.to_le_bytes();
    let select = [0xFF, 0xA4, 0x00, 0x01, 0x02, lsb, msb];
    match transmit(card, &select)? {
        Ok(_) => {}
        Err(SW_FILE_NOT_FOUND) => {
            return Ok(Identity {
                idm,
                system_codes: Vec::new(),
                block: Err(TagReadError::SystemCodeMissing {
                    system_code: FELICA_SYSTEM_CODE,
                }),
            });
        }
        Err(sw) => {
            return Ok(Identity {
                idm,
                system_codes: vec![FELICA_SYSTEM_CODE],
                block: Err(TagReadError::read_failed(format!(
                    "select service {:#06X}: status {:02X}{:02X}",
                    FELICA_SERVICE_CODE, sw[0], sw[1]
                ))),
            });
        }
    }

    let read = [
        0xFF,
        0xB0,
        0x00,
        FELICA_IDENTITY_BLOCK,
        FELICA_BLOCK_SIZE as u8,
    ];
    let block = match transmit(card, &read)? {
        Ok(data) => Ok(RawTagRecord::new(data)),
        Err(sw) => Err(TagReadError::read_failed(format!(
            "read block {}: status {:02X}{:02X}",
            FELICA_IDENTITY_BLOCK, sw[0], sw[1]
        ))),
    };

    Ok(Identity {
        idm,
        system_codes: vec![FELICA_SYSTEM_CODE],
        block,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_family_from_felica_atr() {
        let atr = [
            0x3B, 0x8F, 0x80, 0x01, 0x80, 0x4F, 0x0C, 0xA0, 0x00, 0x00, 0x03, 0x06, 0x11, 0x00,
            0x3B, 0x00, 0x00, 0x00, 0x00, 0x42,
        ];
        assert_eq!(card_family(&atr), CardFamily::FelicaStandard);
    }

    #[test]
    fn test_card_family_from_mifare_atr() {
        let atr = [
            0x3B, 0x8F, 0x80, 0x01, 0x80, 0x4F, 0x0C, 0xA0, 0x00, 0x00, 0x03, 0x06, 0x03, 0x00,
            0x01, 0x00, 0x00, 0x00, 0x00, 0x6A,
        ];
        assert_eq!(card_family(&atr), CardFamily::Iso14443A);
    }

    #[test]
    fn test_card_family_unknown_atr() {
        let atr = [0x3B, 0x80, 0x80, 0x01, 0x01];
        assert_eq!(card_family(&atr), CardFamily::Unknown(atr.to_vec()));
    }

    #[test]
    fn test_card_errors_stay_in_session() {
        assert!(matches!(
            Failure::from(pcsc::Error::RemovedCard),
            Failure::Card(TagReadError::ReadFailed { .. })
        ));
    }

    #[test]
    fn test_reader_errors_end_session() {
        assert!(matches!(
            Failure::from(pcsc::Error::ReaderUnavailable),
            Failure::Session(HardwareError::SessionLost { .. })
        ));
        assert!(matches!(
            session_error(pcsc::Error::InsufficientBuffer),
            HardwareError::CommunicationError { .. }
        ));
    }
}
