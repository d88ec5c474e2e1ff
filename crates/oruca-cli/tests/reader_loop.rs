//! Reader loop across lost sessions, with the clock paused so the reconnect
//! backoff elapses instantly.

use oruca_cli::{ReaderLoop, ReaderLoopConfig, simulated};
use oruca_core::{IdentityRecord, PublishIntent};
use oruca_hardware::TagHandle;
use oruca_hardware::mock::{MockReader, MockReaderHandle};
use oruca_network::{
    PublishError, PublishReceipt, PublishWorker, Publisher, TransportKind, WorkerStats,
};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

type Loop = ReaderLoop<MockReader, Vec<PublishIntent>>;

fn new_loop() -> (Loop, MockReaderHandle) {
    let (reader, handle) = MockReader::new();
    let lp = ReaderLoop::new(reader, Vec::new(), ReaderLoopConfig::default());
    (lp, handle)
}

/// Run `lp` while `script` drives the mock, then stop it.
async fn run_script<F>(lp: &mut Loop, handle: &MockReaderHandle, script: F)
where
    F: Future<Output = ()>,
{
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let driver = async {
        script.await;
        handle.wait_idle().await;
        let _ = stop_tx.send(());
    };

    let shutdown = async {
        let _ = stop_rx.await;
    };

    tokio::join!(lp.run(shutdown), driver);
}

fn ids(intents: &[PublishIntent]) -> Vec<&str> {
    intents.iter().map(|i| i.record.student_id.as_str()).collect()
}

#[tokio::test(start_paused = true)]
async fn test_reopens_after_disconnect() {
    let (mut lp, handle) = new_loop();

    run_script(&mut lp, &handle, async {
        handle.present_payload("01AB12345").await.unwrap();
        handle.remove().await.unwrap();
        handle.disconnect("usb unplugged").await.unwrap();
        handle.present_payload("02CD67890").await.unwrap();
        handle.remove().await.unwrap();
    })
    .await;

    assert_eq!(ids(lp.sink()), vec!["AB12345", "CD67890"]);
    assert_eq!(lp.stats().sessions, 2);
    assert_eq!(lp.stats().session_failures, 1);
    assert_eq!(handle.open_count(), 2);
    assert!(!lp.reader().is_open());
}

#[tokio::test(start_paused = true)]
async fn test_armed_card_lost_with_session() {
    let (mut lp, handle) = new_loop();

    run_script(&mut lp, &handle, async {
        handle.present_payload("01AB12345").await.unwrap();
        handle.disconnect("usb unplugged").await.unwrap();
        // The card is released only after the reader came back.
        handle.remove().await.unwrap();
    })
    .await;

    assert!(lp.sink().is_empty());
    assert!(!lp.tracker().is_armed());
}

#[tokio::test(start_paused = true)]
async fn test_retries_failed_opens() {
    let (mut lp, handle) = new_loop();
    handle.fail_next_opens(2);

    let started = tokio::time::Instant::now();
    run_script(&mut lp, &handle, async {
        handle.present_payload("11ST00001").await.unwrap();
        handle.remove().await.unwrap();
    })
    .await;

    assert_eq!(handle.open_count(), 3);
    assert_eq!(lp.stats().session_failures, 2);
    assert_eq!(lp.stats().sessions, 1);
    assert_eq!(ids(lp.sink()), vec!["ST00001"]);
    assert!(started.elapsed() >= ReaderLoopConfig::default().reconnect_backoff * 2);
}

#[tokio::test(start_paused = true)]
async fn test_failed_card_between_good_ones() {
    let (mut lp, handle) = new_loop();

    run_script(&mut lp, &handle, async {
        handle.present_payload("01AB12345").await.unwrap();
        handle.remove().await.unwrap();
        handle.present_payload("01AB").await.unwrap();
        handle.remove().await.unwrap();
        handle.present_payload("02CD67890").await.unwrap();
        handle.repoll().await.unwrap();
        handle.remove().await.unwrap();
    })
    .await;

    assert_eq!(ids(lp.sink()), vec!["AB12345", "CD67890"]);

    let stats = lp.tracker().stats();
    assert_eq!(stats.read_failures, 1);
    assert_eq!(stats.settled, 2);
    assert_eq!(stats.empty_releases, 1);
}

#[tokio::test(start_paused = true)]
async fn test_simulated_input_drives_loop() {
    let (mut lp, handle) = new_loop();

    let input = b"# morning\npresent 01AB12345\nrepoll\nremove\nwave\nunreadable\nremove\npresent 11ST00001\nremove\n";

    run_script(&mut lp, &handle, async {
        simulated::drive(&input[..], &handle).await.unwrap();
    })
    .await;

    assert_eq!(ids(lp.sink()), vec!["AB12345", "ST00001"]);
    assert_eq!(lp.tracker().stats().read_failures, 1);
}

/// Publisher whose first delivery times out.
struct FailFirstPublisher {
    calls: Arc<Mutex<Vec<String>>>,
}

impl Publisher for FailFirstPublisher {
    async fn publish(&mut self, record: &IdentityRecord) -> oruca_network::Result<PublishReceipt> {
        let first = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(record.student_id.as_str().to_string());
            calls.len() == 1
        };

        if first {
            return Err(PublishError::timeout(5000));
        }
        Ok(PublishReceipt {
            transport: TransportKind::Socket,
            status: None,
            elapsed: Duration::ZERO,
        })
    }

    fn endpoint(&self) -> &str {
        "fail-first://"
    }
}

#[tokio::test(start_paused = true)]
async fn test_failed_publish_does_not_disturb_later_cards() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let publisher = FailFirstPublisher {
        calls: Arc::clone(&calls),
    };
    let (queue, worker) = PublishWorker::spawn(publisher, 8);

    let (reader, handle) = MockReader::new();
    let mut lp = ReaderLoop::new(reader, queue, ReaderLoopConfig::default());
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let driver = async {
        // Delivered first and times out.
        handle.present_payload("01AAAAAAA").await.unwrap();
        handle.remove().await.unwrap();

        // Replaced by an unknown role before release: nothing to publish.
        handle.present_payload("02BBBBBBB").await.unwrap();
        handle
            .repoll_with(TagHandle::felica("99CCCCCCC"))
            .await
            .unwrap();
        handle.remove().await.unwrap();

        handle.present_payload("11DDDDDDD").await.unwrap();
        handle.remove().await.unwrap();

        handle.wait_idle().await;
        let _ = stop_tx.send(());
    };
    let shutdown = async {
        let _ = stop_rx.await;
    };

    tokio::join!(lp.run(shutdown), driver);
    drop(lp);

    let stats = worker.shutdown().await;

    assert_eq!(*calls.lock().unwrap(), vec!["AAAAAAA", "DDDDDDD"]);
    assert_eq!(
        stats,
        WorkerStats {
            published: 1,
            failed: 1,
            dropped: 0,
        }
    );
}
