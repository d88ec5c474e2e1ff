//! Publisher trait and transport dispatch.

use std::future::Future;
use std::time::Duration;

use oruca_core::IdentityRecord;
use reqwest::Url;

use crate::config::{PublisherConfig, TransportKind};
use crate::error::{PublishError, Result};
use crate::http::HttpPublisher;
use crate::websocket::WebSocketPublisher;

/// Outcome of a successful publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    pub transport: TransportKind,

    /// HTTP status, for request transports.
    pub status: Option<u16>,

    /// Wall time of the whole exchange.
    pub elapsed: Duration,
}

impl PublishReceipt {
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Delivers one identity record per call.
///
/// The returned future is `Send` so publishers can be driven from a spawned
/// worker task.
pub trait Publisher: Send {
    /// Build the `log/write` envelope for `record` and deliver it.
    ///
    /// # Errors
    ///
    /// Returns an error on timeout, connection failure, transport failure or
    /// if the envelope cannot be encoded. The caller must not retry.
    fn publish(
        &mut self,
        record: &IdentityRecord,
    ) -> impl Future<Output = Result<PublishReceipt>> + Send;

    /// Configured endpoint.
    fn endpoint(&self) -> &str;
}

/// Publisher selected by [`TransportKind`].
///
/// # Example
///
/// ```
/// use oruca_network::{AnyPublisher, PublisherConfig};
///
/// let publisher = AnyPublisher::from_config(&PublisherConfig::default()).unwrap();
/// assert!(matches!(publisher, AnyPublisher::Socket(_)));
/// ```
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyPublisher {
    Socket(WebSocketPublisher),
    Request(HttpPublisher),
}

impl AnyPublisher {
    /// Build the publisher for `config.transport`.
    ///
    /// # Errors
    ///
    /// Returns `PublishError::InvalidEndpoint` if the endpoint does not parse
    /// or its scheme does not match the transport.
    pub fn from_config(config: &PublisherConfig) -> Result<Self> {
        match config.transport {
            TransportKind::Socket => WebSocketPublisher::new(config.clone()).map(Self::Socket),
            TransportKind::Request => HttpPublisher::new(config.clone()).map(Self::Request),
        }
    }

    pub fn transport(&self) -> TransportKind {
        match self {
            Self::Socket(_) => TransportKind::Socket,
            Self::Request(_) => TransportKind::Request,
        }
    }
}

impl Publisher for AnyPublisher {
    async fn publish(&mut self, record: &IdentityRecord) -> Result<PublishReceipt> {
        match self {
            Self::Socket(publisher) => publisher.publish(record).await,
            Self::Request(publisher) => publisher.publish(record).await,
        }
    }

    fn endpoint(&self) -> &str {
        match self {
            Self::Socket(publisher) => publisher.endpoint(),
            Self::Request(publisher) => publisher.endpoint(),
        }
    }
}

/// Parse `endpoint` and check its scheme is one of `schemes`.
pub(crate) fn parse_endpoint(endpoint: &str, schemes: &[&str]) -> Result<Url> {
    if endpoint.trim().is_empty() {
        return Err(PublishError::invalid_endpoint(endpoint, "endpoint is empty"));
    }

    let url = Url::parse(endpoint)
        .map_err(|e| PublishError::invalid_endpoint(endpoint, e.to_string()))?;

    if !schemes.contains(&url.scheme()) {
        return Err(PublishError::invalid_endpoint(
            endpoint,
            format!(
                "unsupported scheme {}, expected one of {}",
                url.scheme(),
                schemes.join(", ")
            ),
        ));
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("ws://api:3000/log/write", TransportKind::Socket)]
    #[case("wss://oruca.example/log/write", TransportKind::Socket)]
    #[case("http://api:3000/log/write", TransportKind::Request)]
    #[case("https://oruca.example/log/write", TransportKind::Request)]
    fn test_from_config_accepts(#[case] endpoint: &str, #[case] transport: TransportKind) {
        let config = PublisherConfig {
            endpoint: endpoint.to_string(),
            transport,
            ..Default::default()
        };

        let publisher = AnyPublisher::from_config(&config).unwrap();
        assert_eq!(publisher.transport(), transport);
        assert_eq!(publisher.endpoint(), endpoint);
    }

    #[rstest]
    #[case("", TransportKind::Socket)]
    #[case("not a url", TransportKind::Socket)]
    #[case("http://api:3000/log/write", TransportKind::Socket)]
    #[case("ws://api:3000/log/write", TransportKind::Request)]
    fn test_from_config_rejects(#[case] endpoint: &str, #[case] transport: TransportKind) {
        let config = PublisherConfig {
            endpoint: endpoint.to_string(),
            transport,
            ..Default::default()
        };

        assert!(matches!(
            AnyPublisher::from_config(&config),
            Err(PublishError::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn test_receipt_elapsed_ms() {
        let receipt = PublishReceipt {
            transport: TransportKind::Socket,
            status: None,
            elapsed: Duration::from_millis(42),
        };
        assert_eq!(receipt.elapsed_ms(), 42);
    }
}
