//! Wiring of reader, tracker and publisher.

use std::future::{Future, pending};

use anyhow::Context;
use oruca_hardware::AnyTagReader;
use oruca_hardware::mock::{MockReader, MockReaderHandle};
use oruca_network::{AnyPublisher, Publisher, PublishWorker};
use tokio::io::BufReader;
use tracing::{info, warn};

use crate::config::{ReaderKind, Settings};
use crate::reader_loop::ReaderLoop;
use crate::simulated;

/// Build the configured reader.
///
/// The mock handle is returned for the simulated reader only.
///
/// # Errors
///
/// Returns an error if the PC/SC reader is selected in a build without the
/// `hardware-pcsc` feature.
pub fn build_reader(
    settings: &Settings,
) -> anyhow::Result<(AnyTagReader, Option<MockReaderHandle>)> {
    match settings.reader.kind {
        ReaderKind::Simulated => {
            let (reader, handle) = MockReader::with_name("Simulated FeliCa Reader");
            Ok((AnyTagReader::Mock(reader), Some(handle)))
        }
        ReaderKind::Pcsc => pcsc_reader(settings).map(|reader| (reader, None)),
    }
}

#[cfg(feature = "hardware-pcsc")]
fn pcsc_reader(settings: &Settings) -> anyhow::Result<AnyTagReader> {
    use oruca_hardware::pcsc::{PcscConfig, PcscReader};

    let config = PcscConfig {
        reader_name: settings.reader.name.clone(),
        status_timeout: std::time::Duration::from_millis(settings.reader.status_timeout_ms),
    };
    Ok(AnyTagReader::Pcsc(PcscReader::new(config)))
}

#[cfg(not(feature = "hardware-pcsc"))]
fn pcsc_reader(_settings: &Settings) -> anyhow::Result<AnyTagReader> {
    anyhow::bail!(
        "PC/SC reader support not compiled in; rebuild with --features hardware-pcsc \
         or set reader.kind = \"simulated\""
    )
}

/// Run until Ctrl-C, or until simulated input ends.
///
/// # Errors
///
/// Returns an error if the reader or publisher cannot be built.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let publisher = AnyPublisher::from_config(&settings.publisher_config())
        .context("Failed to configure publisher")?;
    let (reader, mock) = build_reader(&settings)?;

    info!(
        endpoint = %publisher.endpoint(),
        transport = %publisher.transport(),
        reader = %reader.driver(),
        "OruCa reader starting"
    );

    let (queue, worker) = PublishWorker::spawn(publisher, settings.publisher.queue_capacity);
    let mut reader_loop = ReaderLoop::new(reader, queue, settings.reader_loop_config());

    reader_loop.run(shutdown_signal(mock)).await;
    drop(reader_loop);

    let stats = worker.shutdown().await;
    info!(
        published = stats.published,
        failed = stats.failed,
        dropped = stats.dropped,
        "OruCa reader stopped"
    );

    Ok(())
}

fn shutdown_signal(mock: Option<MockReaderHandle>) -> impl Future<Output = ()> {
    async move {
        let simulation = async {
            match mock {
                Some(handle) => {
                    let stdin = BufReader::new(tokio::io::stdin());
                    if let Err(e) = simulated::drive(stdin, &handle).await {
                        warn!(error = %e, "Simulated reader input failed");
                    }
                    handle.wait_idle().await;
                    info!("Simulated input finished");
                }
                None => pending().await,
            }
        };

        let ctrl_c = async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Received Ctrl-C, shutting down"),
                Err(e) => {
                    warn!(error = %e, "Failed to listen for Ctrl-C");
                    pending::<()>().await;
                }
            }
        };

        tokio::select! {
            () = ctrl_c => {}
            () = simulation => {}
        }
    }
}
