//! Mock FeliCa reader implementation.
//!
//! The reader side implements [`TagReader`]; the [`MockReaderHandle`] side
//! scripts what happens in the field. Commands are queued on a channel and
//! consumed one interaction at a time by [`TagReader::poll`].

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::mpsc;

use crate::error::{HardwareError, Result};
use crate::traits::{TagEvents, TagHandle, TagReader};
use crate::types::ReaderInfo;

/// Mock reader for testing and development.
///
/// # Examples
///
/// ```
/// use oruca_hardware::mock::MockReader;
/// use oruca_hardware::traits::{TagEvents, TagHandle, TagReader};
///
/// struct Count(usize);
///
/// impl TagEvents for Count {
///     fn on_connect(&mut self, _tag: &TagHandle) -> bool {
///         self.0 += 1;
///         true
///     }
///     fn on_release(&mut self, _tag: &TagHandle) -> bool {
///         true
///     }
/// }
///
/// #[tokio::main]
/// async fn main() -> oruca_hardware::Result<()> {
///     let (mut reader, handle) = MockReader::new();
///     reader.open().await?;
///
///     handle.present_payload("01AB12345").await?;
///
///     let mut count = Count(0);
///     reader.poll(&mut count).await?;
///     assert_eq!(count.0, 1);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockReader {
    command_rx: mpsc::Receiver<Command>,
    name: String,
    opened: bool,
    current: Option<TagHandle>,
    counters: Arc<Counters>,
}

#[derive(Debug, Default)]
struct Counters {
    opens: AtomicUsize,
    failing_opens: AtomicUsize,
}

/// Scripted field events.
#[derive(Debug)]
enum Command {
    Present(TagHandle),
    Repoll(Option<TagHandle>),
    Remove,
    Disconnect(String),
}

impl MockReader {
    /// Create a new mock reader with the default name.
    pub fn new() -> (Self, MockReaderHandle) {
        Self::with_name("Mock FeliCa Reader")
    }

    /// Create a new mock reader with a custom name.
    pub fn with_name(name: impl Into<String>) -> (Self, MockReaderHandle) {
        let (command_tx, command_rx) = mpsc::channel(64);
        let counters = Arc::new(Counters::default());

        let reader = Self {
            command_rx,
            name: name.into(),
            opened: false,
            current: None,
            counters: Arc::clone(&counters),
        };

        let handle = MockReaderHandle {
            command_tx,
            counters,
        };

        (reader, handle)
    }

    /// Whether a session is currently open.
    pub fn is_open(&self) -> bool {
        self.opened
    }

    /// The card currently in the field, if any.
    pub fn current_tag(&self) -> Option<&TagHandle> {
        self.current.as_ref()
    }
}

impl TagReader for MockReader {
    async fn open(&mut self) -> Result<ReaderInfo> {
        self.counters.opens.fetch_add(1, Ordering::SeqCst);

        let failing = self.counters.failing_opens.load(Ordering::SeqCst);
        if failing > 0 {
            self.counters
                .failing_opens
                .store(failing - 1, Ordering::SeqCst);
            return Err(HardwareError::initialization_failed(
                "mock reader configured to fail",
            ));
        }

        if self.command_rx.is_closed() && self.command_rx.is_empty() {
            return Err(HardwareError::NoReader);
        }

        self.opened = true;
        self.current = None;
        tracing::debug!(name = %self.name, "Mock reader opened");

        Ok(ReaderInfo::new(self.name.clone(), "mock"))
    }

    async fn poll<E: TagEvents>(&mut self, events: &mut E) -> Result<bool> {
        if !self.opened {
            return Err(HardwareError::session_lost("reader is not open"));
        }

        loop {
            let Some(command) = self.command_rx.recv().await else {
                self.opened = false;
                self.current = None;
                return Err(HardwareError::session_lost("mock reader channel closed"));
            };

            match command {
                Command::Present(tag) => {
                    let keep = events.on_connect(&tag);
                    self.current = Some(tag);
                    return Ok(keep);
                }
                Command::Repoll(replacement) => {
                    if self.current.is_none() {
                        tracing::debug!("Re-poll with no card in the field, ignored");
                        continue;
                    }
                    if let Some(tag) = replacement {
                        self.current = Some(tag);
                    }
                    if let Some(tag) = &self.current {
                        return Ok(events.on_connect(tag));
                    }
                }
                Command::Remove => match self.current.take() {
                    Some(tag) => return Ok(events.on_release(&tag)),
                    None => {
                        tracing::debug!("Remove with no card in the field, ignored");
                    }
                },
                Command::Disconnect(reason) => {
                    self.opened = false;
                    self.current = None;
                    return Err(HardwareError::session_lost(reason));
                }
            }
        }
    }

    async fn close(&mut self) {
        if self.opened {
            tracing::debug!(name = %self.name, "Mock reader closed");
        }
        self.opened = false;
        self.current = None;
    }
}

/// Handle for scripting a [`MockReader`].
///
/// Cloning the handle shares the same reader; the reader sees the session as
/// lost once every handle is dropped.
#[derive(Debug, Clone)]
pub struct MockReaderHandle {
    command_tx: mpsc::Sender<Command>,
    counters: Arc<Counters>,
}

impl MockReaderHandle {
    /// Bring a card into the field.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader has been dropped.
    pub async fn present(&self, tag: TagHandle) -> Result<()> {
        self.send(Command::Present(tag)).await
    }

    /// Bring a FeliCa Standard card whose identity block holds `payload`.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader has been dropped.
    pub async fn present_payload(&self, payload: &str) -> Result<()> {
        self.present(TagHandle::felica(payload)).await
    }

    /// Re-poll the card already in the field without it leaving.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader has been dropped.
    pub async fn repoll(&self) -> Result<()> {
        self.send(Command::Repoll(None)).await
    }

    /// Re-poll, with the card now reading as `tag`.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader has been dropped.
    pub async fn repoll_with(&self, tag: TagHandle) -> Result<()> {
        self.send(Command::Repoll(Some(tag))).await
    }

    /// Take the card out of the field.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader has been dropped.
    pub async fn remove(&self) -> Result<()> {
        self.send(Command::Remove).await
    }

    /// Simulate the reader being unplugged.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader has been dropped.
    pub async fn disconnect(&self, reason: impl Into<String>) -> Result<()> {
        self.send(Command::Disconnect(reason.into())).await
    }

    /// Make the next `count` calls to `open` fail.
    pub fn fail_next_opens(&self, count: usize) {
        self.counters.failing_opens.store(count, Ordering::SeqCst);
    }

    /// Number of `open` attempts so far, failed ones included.
    pub fn open_count(&self) -> usize {
        self.counters.opens.load(Ordering::SeqCst)
    }

    /// Whether the reader has taken every queued command.
    pub fn is_idle(&self) -> bool {
        self.command_tx.capacity() == self.command_tx.max_capacity()
    }

    /// Wait until the reader has taken every queued command.
    pub async fn wait_idle(&self) {
        while !self.is_idle() {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| HardwareError::session_lost("mock reader dropped"))
    }
}
