//! Common types shared across reader implementations.

use serde::{Deserialize, Serialize};

/// Reader information.
///
/// Reported once per session when the reader is opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderInfo {
    /// Reader name (e.g., "Sony FeliCa Port/PaSoRi 3.0").
    pub name: String,

    /// Backend driving the reader (e.g., "pcsc", "mock").
    pub driver: String,

    /// List of supported card protocols (e.g., ["FeliCa"]).
    pub protocols: Vec<String>,
}

impl ReaderInfo {
    /// Create a new ReaderInfo.
    pub fn new(name: impl Into<String>, driver: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            driver: driver.into(),
            protocols: vec!["FeliCa".to_string()],
        }
    }
}

/// Card family detected in the reader field.
///
/// Only FeliCa Standard cards carry the identity service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum CardFamily {
    /// FeliCa Standard (multi-service, system code aware).
    FelicaStandard,

    /// ISO 14443 Type A card (Mifare and friends).
    Iso14443A,

    /// Unrecognized card with its ATR/ATS bytes.
    Unknown(Vec<u8>),
}

impl CardFamily {
    /// Get a human-readable name for the card family.
    pub fn name(&self) -> &str {
        match self {
            Self::FelicaStandard => "FeliCa Standard",
            Self::Iso14443A => "ISO 14443 Type A",
            Self::Unknown(_) => "Unknown",
        }
    }

    /// Check if this family can carry the identity service.
    pub fn is_supported(&self) -> bool {
        matches!(self, Self::FelicaStandard)
    }
}

impl std::fmt::Display for CardFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_info_defaults_to_felica() {
        let info = ReaderInfo::new("Mock", "mock");
        assert_eq!(info.protocols, vec!["FeliCa"]);
    }

    #[test]
    fn test_card_family_support() {
        assert!(CardFamily::FelicaStandard.is_supported());
        assert!(!CardFamily::Iso14443A.is_supported());
        assert!(!CardFamily::Unknown(vec![0x3B]).is_supported());
    }

    #[test]
    fn test_card_family_serialization() {
        let family = CardFamily::FelicaStandard;
        let json = serde_json::to_string(&family).unwrap();
        let deserialized: CardFamily = serde_json::from_str(&json).unwrap();
        assert_eq!(family, deserialized);
    }
}
