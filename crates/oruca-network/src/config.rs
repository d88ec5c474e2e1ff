//! Publisher configuration.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Endpoint of the API inside the compose network.
pub const DEFAULT_ENDPOINT: &str = "ws://api:3000/log/write";

/// Bound on a single publish.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// How envelopes reach the endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// One WebSocket connection per publish.
    #[default]
    Socket,

    /// One HTTP request per publish.
    Request,
}

impl TransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::Socket => "socket",
            TransportKind::Request => "request",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration shared by every publisher.
///
/// # Example
///
/// ```
/// use oruca_network::{PublisherConfig, TransportKind};
/// use std::time::Duration;
///
/// let config = PublisherConfig {
///     endpoint: "http://127.0.0.1:3000/log/write".to_string(),
///     transport: TransportKind::Request,
///     timeout: Duration::from_millis(2000),
/// };
/// assert_eq!(config.transport.to_string(), "request");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublisherConfig {
    /// `ws://`/`wss://` URL for sockets, `http://`/`https://` for requests.
    pub endpoint: String,

    pub transport: TransportKind,

    /// Bound on the whole exchange: connect, send, and close or response.
    pub timeout: Duration,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            transport: TransportKind::Socket,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl PublisherConfig {
    pub fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PublisherConfig::default();
        assert_eq!(config.endpoint, "ws://api:3000/log/write");
        assert_eq!(config.transport, TransportKind::Socket);
        assert_eq!(config.timeout_ms(), 5000);
    }

    #[test]
    fn test_transport_serde_names() {
        assert_eq!(
            serde_json::to_string(&TransportKind::Socket).unwrap(),
            "\"socket\""
        );
        let parsed: TransportKind = serde_json::from_str("\"request\"").unwrap();
        assert_eq!(parsed, TransportKind::Request);
    }
}
