//! HTTP request transport.
//!
//! One `POST` of the envelope JSON per publish. Any HTTP response counts as
//! delivered; the status is recorded and logged, never acted upon.

use std::time::Instant;

use oruca_core::IdentityRecord;
use oruca_protocol::PublishEnvelope;
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::{PublisherConfig, TransportKind};
use crate::error::{PublishError, Result};
use crate::publisher::{PublishReceipt, Publisher, parse_endpoint};

/// HTTP publisher.
#[derive(Debug, Clone)]
pub struct HttpPublisher {
    config: PublisherConfig,
    client: Client,
}

impl HttpPublisher {
    /// Create a publisher for an `http://` or `https://` endpoint.
    ///
    /// # Errors
    ///
    /// Returns `PublishError::InvalidEndpoint` for any other endpoint and
    /// `PublishError::Transport` if the HTTP client cannot be built.
    pub fn new(config: PublisherConfig) -> Result<Self> {
        parse_endpoint(&config.endpoint, &["http", "https"])?;

        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .build()
            .map_err(PublishError::transport)?;

        debug!(endpoint = %config.endpoint, "Creating HTTP publisher");
        Ok(Self { config, client })
    }

    fn classify(&self, error: reqwest::Error) -> PublishError {
        if error.is_timeout() {
            PublishError::timeout(self.config.timeout_ms())
        } else if error.is_connect() {
            PublishError::connection_refused(self.config.endpoint.clone(), error)
        } else {
            PublishError::transport(error)
        }
    }
}

impl Publisher for HttpPublisher {
    async fn publish(&mut self, record: &IdentityRecord) -> Result<PublishReceipt> {
        let envelope = PublishEnvelope::log_write(record);
        let body = envelope.to_json()?;
        let started = Instant::now();

        let response = self
            .client
            .post(self.config.endpoint.as_str())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                endpoint = %self.config.endpoint,
                status = status.as_u16(),
                "Endpoint answered with a non-success status"
            );
        }

        Ok(PublishReceipt {
            transport: TransportKind::Request,
            status: Some(status.as_u16()),
            elapsed: started.elapsed(),
        })
    }

    fn endpoint(&self) -> &str {
        &self.config.endpoint
    }
}
