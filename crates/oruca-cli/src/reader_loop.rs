//! Reader session lifecycle.
//!
//! A session runs from a successful `open` until the reader reports a
//! [`HardwareError`]. Between sessions the loop waits a fixed backoff and
//! tries again, forever, until the shutdown future resolves. Card callbacks
//! are forwarded to a [`PresenceTracker`]; settled presentations go to an
//! [`IntentSink`].

use std::future::Future;
use std::time::Duration;

use oruca_core::PublishIntent;
use oruca_hardware::{HardwareError, TagEvents, TagHandle, TagReader};
use oruca_network::PublishQueue;
use oruca_presence::PresenceTracker;
use tracing::{debug, info, warn};

/// Destination of settled presentations.
pub trait IntentSink {
    fn submit(&mut self, intent: PublishIntent);
}

impl IntentSink for PublishQueue {
    fn submit(&mut self, intent: PublishIntent) {
        // Drops are logged and counted by the queue.
        PublishQueue::submit(self, intent);
    }
}

impl IntentSink for Vec<PublishIntent> {
    fn submit(&mut self, intent: PublishIntent) {
        self.push(intent);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderLoopConfig {
    /// Pause between a lost session and the next `open`.
    pub reconnect_backoff: Duration,
}

impl ReaderLoopConfig {
    /// Backoff in whole milliseconds, saturating at `u64::MAX`.
    pub fn backoff_ms(&self) -> u64 {
        u64::try_from(self.reconnect_backoff.as_millis()).unwrap_or(u64::MAX)
    }
}

impl Default for ReaderLoopConfig {
    fn default() -> Self {
        Self {
            reconnect_backoff: Duration::from_millis(2000),
        }
    }
}

/// Session counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// Sessions that opened successfully.
    pub sessions: u64,

    /// Sessions that ended in an error, failed opens included.
    pub session_failures: u64,
}

/// Drives one reader and one tracker.
#[derive(Debug)]
pub struct ReaderLoop<R, S> {
    reader: R,
    tracker: PresenceTracker,
    sink: S,
    config: ReaderLoopConfig,
    stats: LoopStats,
}

impl<R, S> ReaderLoop<R, S>
where
    R: TagReader,
    S: IntentSink + Send,
{
    pub fn new(reader: R, sink: S, config: ReaderLoopConfig) -> Self {
        Self {
            reader,
            tracker: PresenceTracker::new(),
            sink,
            config,
            stats: LoopStats::default(),
        }
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    pub fn tracker(&self) -> &PresenceTracker {
        &self.tracker
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Run one session and return the error that ended it.
    pub async fn run_session(&mut self) -> HardwareError {
        let info = match self.reader.open().await {
            Ok(info) => info,
            Err(e) => {
                self.stats.session_failures += 1;
                warn!(error = %e, "Failed to open reader");
                return e;
            }
        };

        self.stats.sessions += 1;
        info!(
            reader = %info.name,
            driver = %info.driver,
            session = self.stats.sessions,
            "Reader session started"
        );

        let error = loop {
            let mut dispatcher = Dispatcher {
                tracker: &mut self.tracker,
                sink: &mut self.sink,
            };

            if let Err(e) = self.reader.poll(&mut dispatcher).await {
                break e;
            }
        };

        self.end_session();
        self.reader.close().await;
        self.stats.session_failures += 1;
        warn!(error = %error, "Reader session lost");

        error
    }

    /// Run sessions until `shutdown` resolves.
    ///
    /// The reader is closed and the tracker disarmed on return. A card still
    /// armed at that point is not published.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let backoff = self.config.reconnect_backoff;

        loop {
            tokio::select! {
                biased;
                () = &mut shutdown => break,
                _ = self.run_session() => {}
            }

            debug!(
                backoff_ms = self.config.backoff_ms(),
                "Waiting before reopening reader"
            );

            tokio::select! {
                biased;
                () = &mut shutdown => break,
                () = tokio::time::sleep(backoff) => {}
            }
        }

        self.end_session();
        self.reader.close().await;
        info!(
            sessions = self.stats.sessions,
            session_failures = self.stats.session_failures,
            "Reader loop stopped"
        );
    }

    fn end_session(&mut self) {
        if let Some(record) = self.tracker.reset() {
            warn!(
                student_id = %record.student_id,
                role = %record.role,
                "Armed card discarded without publishing"
            );
        }
    }
}

/// Forwards reader callbacks into the tracker and the sink.
struct Dispatcher<'a, S> {
    tracker: &'a mut PresenceTracker,
    sink: &'a mut S,
}

impl<S: IntentSink + Send> TagEvents for Dispatcher<'_, S> {
    fn on_connect(&mut self, tag: &TagHandle) -> bool {
        self.tracker.on_connect(tag);
        true
    }

    fn on_release(&mut self, _tag: &TagHandle) -> bool {
        if let Some(intent) = self.tracker.on_release() {
            self.sink.submit(intent);
        }
        true
    }
}
