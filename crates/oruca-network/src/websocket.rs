//! WebSocket transport.
//!
//! Each publish is a short-lived connection:
//!
//! ```text
//! connect ──► send Text(envelope JSON) ──► close
//! └──────────────── bounded by timeout ────────┘
//! ```
//!
//! The send returning without error is success; the API's reply, if any, is
//! not awaited. A failed close is only logged.

use std::time::Instant;

use futures::SinkExt;
use oruca_core::IdentityRecord;
use oruca_protocol::PublishEnvelope;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, trace, warn};

use crate::config::{PublisherConfig, TransportKind};
use crate::error::{PublishError, Result};
use crate::publisher::{PublishReceipt, Publisher, parse_endpoint};

/// One-shot WebSocket publisher.
///
/// # Example
///
/// ```no_run
/// use oruca_core::{IdentityRecord, Role, StudentId};
/// use oruca_network::{Publisher, PublisherConfig, WebSocketPublisher};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut publisher = WebSocketPublisher::new(PublisherConfig::default())?;
///
/// let record = IdentityRecord::new(Role::Student, StudentId::new("AB12345")?);
/// let receipt = publisher.publish(&record).await?;
/// println!("published in {}ms", receipt.elapsed_ms());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct WebSocketPublisher {
    config: PublisherConfig,
}

impl WebSocketPublisher {
    /// Create a publisher for a `ws://` or `wss://` endpoint.
    ///
    /// # Errors
    ///
    /// Returns `PublishError::InvalidEndpoint` for any other endpoint.
    pub fn new(config: PublisherConfig) -> Result<Self> {
        parse_endpoint(&config.endpoint, &["ws", "wss"])?;
        debug!(endpoint = %config.endpoint, "Creating WebSocket publisher");
        Ok(Self { config })
    }

    async fn exchange(&self, text: String) -> Result<()> {
        let (mut stream, _response) = connect_async(self.config.endpoint.as_str())
            .await
            .map_err(|e| self.connect_error(e))?;
        trace!(endpoint = %self.config.endpoint, "WebSocket connected");

        stream
            .send(Message::Text(text))
            .await
            .map_err(PublishError::transport)?;

        if let Err(e) = stream.close(None).await {
            warn!(endpoint = %self.config.endpoint, error = %e, "WebSocket close failed");
        }

        Ok(())
    }

    fn connect_error(&self, error: tungstenite::Error) -> PublishError {
        match error {
            tungstenite::Error::Io(io) => {
                PublishError::connection_refused(self.config.endpoint.clone(), io)
            }
            tungstenite::Error::Url(url) => {
                PublishError::invalid_endpoint(self.config.endpoint.clone(), url.to_string())
            }
            other => PublishError::transport(other),
        }
    }
}

impl Publisher for WebSocketPublisher {
    async fn publish(&mut self, record: &IdentityRecord) -> Result<PublishReceipt> {
        let text = PublishEnvelope::log_write(record).to_json()?;
        let started = Instant::now();

        match timeout(self.config.timeout, self.exchange(text)).await {
            Ok(Ok(())) => Ok(PublishReceipt {
                transport: TransportKind::Socket,
                status: None,
                elapsed: started.elapsed(),
            }),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(PublishError::timeout(self.config.timeout_ms())),
        }
    }

    fn endpoint(&self) -> &str {
        &self.config.endpoint
    }
}
