//! Bounded publish queue and its single worker task.
//!
//! Intents are delivered in the order they were submitted, one at a time.
//! Submitting never waits: when the queue is full the intent is dropped and
//! logged, keeping the at-most-once guarantee without stalling the reader.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use oruca_core::PublishIntent;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::publisher::Publisher;

/// Delivery counters of a worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Intents delivered.
    pub published: u64,

    /// Intents whose publish failed.
    pub failed: u64,

    /// Intents rejected because the queue was full or closed.
    pub dropped: u64,
}

#[derive(Debug, Default)]
struct Counters {
    published: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> WorkerStats {
        WorkerStats {
            published: self.published.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Sending side of the publish queue.
#[derive(Debug, Clone)]
pub struct PublishQueue {
    tx: mpsc::Sender<PublishIntent>,
    counters: Arc<Counters>,
}

impl PublishQueue {
    /// Queue an intent without waiting.
    ///
    /// Returns `false` if the intent was dropped.
    pub fn submit(&self, intent: PublishIntent) -> bool {
        match self.tx.try_send(intent) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(intent)) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(
                    presentation_id = %intent.presentation_id,
                    student_id = %intent.record.student_id,
                    "Publish queue full, presentation dropped"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(intent)) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(
                    presentation_id = %intent.presentation_id,
                    student_id = %intent.record.student_id,
                    "Publish worker stopped, presentation dropped"
                );
                false
            }
        }
    }

    pub fn stats(&self) -> WorkerStats {
        self.counters.snapshot()
    }
}

/// Handle to a running worker.
#[derive(Debug)]
pub struct PublishWorkerHandle {
    task: JoinHandle<()>,
    shutdown_tx: oneshot::Sender<()>,
    counters: Arc<Counters>,
}

impl PublishWorkerHandle {
    pub fn stats(&self) -> WorkerStats {
        self.counters.snapshot()
    }

    /// Stop accepting intents, deliver the ones already queued, and wait for
    /// the worker to finish.
    pub async fn shutdown(self) -> WorkerStats {
        // The worker may already be gone if every queue was dropped.
        let _ = self.shutdown_tx.send(());

        if let Err(e) = self.task.await {
            warn!(error = %e, "Publish worker task failed");
        }

        self.counters.snapshot()
    }
}

/// Spawns the worker task.
pub struct PublishWorker;

impl PublishWorker {
    /// Start draining a queue of `capacity` intents into `publisher`.
    ///
    /// Must be called from within a Tokio runtime. A `capacity` of zero is
    /// raised to one.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use oruca_network::{AnyPublisher, PublishWorker, PublisherConfig};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let publisher = AnyPublisher::from_config(&PublisherConfig::default())?;
    /// let (queue, worker) = PublishWorker::spawn(publisher, 32);
    ///
    /// // hand `queue` to the reader loop ...
    /// drop(queue);
    ///
    /// let stats = worker.shutdown().await;
    /// println!("published {}", stats.published);
    /// # Ok(())
    /// # }
    /// ```
    pub fn spawn<P>(publisher: P, capacity: usize) -> (PublishQueue, PublishWorkerHandle)
    where
        P: Publisher + 'static,
    {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let counters = Arc::new(Counters::default());

        let task = tokio::spawn(run(publisher, rx, shutdown_rx, Arc::clone(&counters)));

        let queue = PublishQueue {
            tx,
            counters: Arc::clone(&counters),
        };

        let handle = PublishWorkerHandle {
            task,
            shutdown_tx,
            counters,
        };

        (queue, handle)
    }
}

async fn run<P: Publisher>(
    mut publisher: P,
    mut rx: mpsc::Receiver<PublishIntent>,
    mut shutdown_rx: oneshot::Receiver<()>,
    counters: Arc<Counters>,
) {
    debug!(endpoint = %publisher.endpoint(), "Publish worker started");

    loop {
        let intent = tokio::select! {
            biased;
            intent = rx.recv() => intent,
            _ = &mut shutdown_rx => {
                rx.close();
                rx.recv().await
            }
        };

        let Some(intent) = intent else {
            break;
        };

        deliver(&mut publisher, intent, &counters).await;
    }

    debug!("Publish worker stopped");
}

async fn deliver<P: Publisher>(publisher: &mut P, intent: PublishIntent, counters: &Counters) {
    match publisher.publish(&intent.record).await {
        Ok(receipt) => {
            counters.published.fetch_add(1, Ordering::Relaxed);
            info!(
                presentation_id = %intent.presentation_id,
                student_id = %intent.record.student_id,
                transport = %receipt.transport,
                status = ?receipt.status,
                elapsed_ms = receipt.elapsed_ms(),
                "Presentation published"
            );
        }
        Err(e) => {
            counters.failed.fetch_add(1, Ordering::Relaxed);
            warn!(
                presentation_id = %intent.presentation_id,
                student_id = %intent.record.student_id,
                endpoint = %publisher.endpoint(),
                error = %e,
                "Publish failed, presentation dropped"
            );
        }
    }
}
