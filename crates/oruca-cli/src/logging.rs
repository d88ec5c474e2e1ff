//! Logging initialization.
//!
//! `RUST_LOG` wins over the configured level when set. Output goes to stdout,
//! which the container runtime or systemd journal collects.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{LogFormat, LoggingSettings};

/// Install the global subscriber.
///
/// # Errors
///
/// Returns an error if the filter directive cannot be parsed or a global
/// subscriber is already installed.
pub fn init(settings: &LoggingSettings) -> anyhow::Result<()> {
    let env_filter = filter(&settings.level)?;
    let registry = tracing_subscriber::registry().with(env_filter);

    match settings.format {
        LogFormat::Compact => registry
            .with(tracing_subscriber::fmt::layer().compact().with_target(true))
            .try_init()?,
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init()?,
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(false),
            )
            .try_init()?,
    }

    Ok(())
}

fn filter(level: &str) -> anyhow::Result<EnvFilter> {
    Ok(EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_accepts_directives() {
        assert!(EnvFilter::try_new("info").is_ok());
        assert!(EnvFilter::try_new("oruca_network=debug,warn").is_ok());
    }

    #[test]
    fn test_filter_rejects_garbage() {
        assert!(EnvFilter::try_new("oruca_cli=loud").is_err());
    }
}
