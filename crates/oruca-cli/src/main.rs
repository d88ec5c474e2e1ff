//! # oruca-nfc
//!
//! Attendance card reader for the OruCa system. Watches a FeliCa reader,
//! decodes the student card in the field, and reports each completed
//! presentation to the OruCa API when the card is taken away.
//!
//! ## Running
//!
//! ```bash
//! # PaSoRi reader through pcscd
//! cargo run --package oruca-cli --features hardware-pcsc
//!
//! # No hardware: type `present 01AB12345` then `remove` on stdin
//! cargo run --package oruca-cli -- --reader simulated --endpoint http://localhost:3000/log/write --transport request
//! ```

#![forbid(unsafe_code)]

use clap::Parser;
use oruca_cli::cli::Cli;
use oruca_cli::config::Settings;
use oruca_cli::{app, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(&cli)?;

    logging::init(&settings.logging)?;

    tracing::info!(version = oruca_core::VERSION, "Starting oruca-nfc");

    app::run(settings).await
}
