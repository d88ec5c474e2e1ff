//! Layered configuration.
//!
//! Sources, lowest precedence first:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config`, else `./oruca.toml` when present)
//! 3. Environment, `ORUCA_` prefix and `__` between sections, e.g.
//!    `ORUCA_PUBLISHER__TIMEOUT_MS=3000`
//! 4. Command-line flags
//!
//! ```toml
//! [publisher]
//! endpoint = "ws://api:3000/log/write"
//! transport = "socket"
//! timeout_ms = 5000
//! queue_capacity = 32
//!
//! [reader]
//! kind = "pcsc"
//! reconnect_backoff_ms = 2000
//!
//! [logging]
//! level = "info"
//! format = "compact"
//! ```

use std::path::PathBuf;
use std::time::Duration;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat, Map};
use oruca_network::{DEFAULT_ENDPOINT, PublisherConfig, TransportKind};
use serde::{Deserialize, Serialize};

use crate::cli::Cli;
use crate::reader_loop::ReaderLoopConfig;

/// Configuration file read when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "oruca.toml";

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "ORUCA";

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A source could not be read or deserialized.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A value is out of range.
    #[error("Invalid configuration value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Complete runtime configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub publisher: PublisherSettings,
    pub reader: ReaderSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublisherSettings {
    pub endpoint: String,
    pub transport: TransportKind,
    pub timeout_ms: u64,

    /// Settled presentations waiting for delivery before new ones are dropped.
    pub queue_capacity: usize,
}

impl Default for PublisherSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            transport: TransportKind::Socket,
            timeout_ms: 5000,
            queue_capacity: 32,
        }
    }
}

/// Reader backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReaderKind {
    /// PC/SC reader (needs the `hardware-pcsc` feature).
    #[default]
    Pcsc,

    /// Mock reader driven from stdin.
    Simulated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderSettings {
    pub kind: ReaderKind,

    /// PC/SC reader name to match; first reader when unset.
    pub name: Option<String>,

    /// How long one PC/SC status query may block.
    pub status_timeout_ms: u64,

    /// Pause before reacquiring a lost reader.
    pub reconnect_backoff_ms: u64,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            kind: ReaderKind::Pcsc,
            name: None,
            status_timeout_ms: 1000,
            reconnect_backoff_ms: 2000,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

impl Settings {
    /// Load settings from every source.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly given file is missing, a source
    /// cannot be parsed, or a value fails validation.
    pub fn load(cli: &Cli) -> Result<Self> {
        let (path, required) = match &cli.config {
            Some(path) => (path.clone(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        let builder = Config::builder()
            .add_source(
                File::from(path.as_path())
                    .format(FileFormat::Toml)
                    .required(required),
            )
            .add_source(environment(None));

        Self::build(apply_cli(builder, cli)?)
    }

    /// Load settings from TOML text, the environment map and flags only.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load).
    pub fn from_sources(toml: &str, env: Map<String, String>, cli: &Cli) -> Result<Self> {
        let builder = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .add_source(environment(Some(env)));

        Self::build(apply_cli(builder, cli)?)
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.publisher.endpoint.trim().is_empty() {
            return Err(ConfigError::invalid("publisher.endpoint", "must not be empty"));
        }
        if self.publisher.timeout_ms == 0 {
            return Err(ConfigError::invalid("publisher.timeout_ms", "must be positive"));
        }
        if self.publisher.queue_capacity == 0 {
            return Err(ConfigError::invalid(
                "publisher.queue_capacity",
                "must be positive",
            ));
        }
        if self.reader.status_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "reader.status_timeout_ms",
                "must be positive",
            ));
        }
        Ok(())
    }

    pub fn publisher_config(&self) -> PublisherConfig {
        PublisherConfig {
            endpoint: self.publisher.endpoint.clone(),
            transport: self.publisher.transport,
            timeout: Duration::from_millis(self.publisher.timeout_ms),
        }
    }

    pub fn reader_loop_config(&self) -> ReaderLoopConfig {
        ReaderLoopConfig {
            reconnect_backoff: Duration::from_millis(self.reader.reconnect_backoff_ms),
        }
    }
}

fn environment(source: Option<Map<String, String>>) -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .source(source)
}

fn apply_cli(
    builder: ConfigBuilder<DefaultState>,
    cli: &Cli,
) -> Result<ConfigBuilder<DefaultState>> {
    Ok(builder
        .set_override_option("publisher.endpoint", cli.endpoint.clone())?
        .set_override_option("publisher.transport", cli.transport.clone())?
        .set_override_option("publisher.timeout_ms", cli.timeout_ms)?
        .set_override_option("reader.kind", cli.reader.clone())?
        .set_override_option("reader.name", cli.reader_name.clone())?
        .set_override_option("logging.level", cli.log_level.clone())?
        .set_override_option("logging.format", cli.log_format.clone())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn env(pairs: &[(&str, &str)]) -> Map<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_sources("", Map::new(), &Cli::default()).unwrap();

        assert_eq!(settings, Settings::default());
        assert_eq!(settings.publisher.endpoint, "ws://api:3000/log/write");
        assert_eq!(settings.publisher.timeout_ms, 5000);
        assert_eq!(settings.reader.reconnect_backoff_ms, 2000);
    }

    #[test]
    fn test_toml_file() {
        let toml = r#"
            [publisher]
            endpoint = "http://localhost:3000/log/write"
            transport = "request"
            timeout_ms = 1500

            [reader]
            kind = "simulated"

            [logging]
            format = "json"
        "#;

        let settings = Settings::from_sources(toml, Map::new(), &Cli::default()).unwrap();

        assert_eq!(settings.publisher.transport, TransportKind::Request);
        assert_eq!(settings.publisher.timeout_ms, 1500);
        assert_eq!(settings.publisher.queue_capacity, 32);
        assert_eq!(settings.reader.kind, ReaderKind::Simulated);
        assert_eq!(settings.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_environment_overrides_file() {
        let toml = "[publisher]\ntimeout_ms = 1500\n";
        let env = env(&[
            ("ORUCA_PUBLISHER__TIMEOUT_MS", "3000"),
            ("ORUCA_READER__KIND", "simulated"),
        ]);

        let settings = Settings::from_sources(toml, env, &Cli::default()).unwrap();

        assert_eq!(settings.publisher.timeout_ms, 3000);
        assert_eq!(settings.reader.kind, ReaderKind::Simulated);
    }

    #[test]
    fn test_flags_override_environment() {
        let env = env(&[("ORUCA_PUBLISHER__ENDPOINT", "ws://env:3000/log/write")]);
        let cli = Cli {
            endpoint: Some("ws://flag:3000/log/write".to_string()),
            timeout_ms: Some(750),
            ..Default::default()
        };

        let settings = Settings::from_sources("", env, &cli).unwrap();

        assert_eq!(settings.publisher.endpoint, "ws://flag:3000/log/write");
        assert_eq!(settings.publisher.timeout_ms, 750);
    }

    #[rstest]
    #[case("[publisher]\nendpoint = \"\"\n", "publisher.endpoint")]
    #[case("[publisher]\ntimeout_ms = 0\n", "publisher.timeout_ms")]
    #[case("[publisher]\nqueue_capacity = 0\n", "publisher.queue_capacity")]
    #[case("[reader]\nstatus_timeout_ms = 0\n", "reader.status_timeout_ms")]
    fn test_validation(#[case] toml: &str, #[case] expected: &str) {
        let error = Settings::from_sources(toml, Map::new(), &Cli::default()).unwrap_err();
        assert!(matches!(error, ConfigError::Invalid { field, .. } if field == expected));
    }

    #[test]
    fn test_unknown_transport_is_rejected() {
        let toml = "[publisher]\ntransport = \"carrier_pigeon\"\n";
        let error = Settings::from_sources(toml, Map::new(), &Cli::default()).unwrap_err();
        assert!(matches!(error, ConfigError::Load(_)));
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let cli = Cli {
            config: Some(PathBuf::from("/nonexistent/oruca.toml")),
            ..Default::default()
        };
        assert!(Settings::load(&cli).is_err());
    }

    #[test]
    fn test_publisher_config_conversion() {
        let settings = Settings::default();
        let config = settings.publisher_config();

        assert_eq!(config.endpoint, "ws://api:3000/log/write");
        assert_eq!(config.timeout, Duration::from_millis(5000));
        assert_eq!(
            settings.reader_loop_config().reconnect_backoff,
            Duration::from_millis(2000)
        );
    }
}
