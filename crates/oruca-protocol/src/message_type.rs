//! Message type tag of API messages.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Value of the `type` field of an API message.
///
/// The reader sends `log/write` only. Any other tag fails to deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    #[serde(rename = "log/write")]
    LogWrite,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::LogWrite => "log/write",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_name_matches_as_str() {
        let json = serde_json::to_string(&MessageType::LogWrite).unwrap();
        assert_eq!(json, "\"log/write\"");
        assert_eq!(MessageType::LogWrite.to_string(), "log/write");
    }

    #[test]
    fn test_other_tags_do_not_parse() {
        assert!(serde_json::from_str::<MessageType>("\"ack\"").is_err());
    }
}
