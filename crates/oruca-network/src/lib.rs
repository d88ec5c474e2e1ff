//! Delivery of settled card presentations to the OruCa API.
//!
//! A [`Publisher`] turns an [`IdentityRecord`](oruca_core::IdentityRecord)
//! into a `log/write` envelope and sends it over one of two transports:
//!
//! - [`WebSocketPublisher`]: opens a WebSocket per publish, sends one text
//!   frame and closes.
//! - [`HttpPublisher`]: one JSON `POST` per publish.
//!
//! Publishes are never retried. A presentation is either reported or lost,
//! and the failure is only logged.
//!
//! # Architecture
//!
//! ```text
//! ReaderLoop ──submit──► PublishQueue ══(bounded mpsc)══► PublishWorker
//!                                                             │
//!                                                             └─► AnyPublisher ──► API
//! ```
//!
//! The [`PublishWorker`] drains the queue on a single task, so card detection
//! never waits on the network and at most one publish is in flight.

#![allow(async_fn_in_trait)]

pub mod config;
pub mod error;
pub mod http;
pub mod publisher;
pub mod websocket;
pub mod worker;

pub use config::{DEFAULT_ENDPOINT, DEFAULT_TIMEOUT, PublisherConfig, TransportKind};
pub use error::{PublishError, Result};
pub use http::HttpPublisher;
pub use publisher::{AnyPublisher, PublishReceipt, Publisher};
pub use websocket::WebSocketPublisher;
pub use worker::{PublishQueue, PublishWorker, PublishWorkerHandle, WorkerStats};
