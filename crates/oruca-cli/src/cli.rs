//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Reads FeliCa student cards and reports each presentation to the OruCa API.
#[derive(Debug, Default, Parser)]
#[command(name = "oruca-nfc", version)]
#[command(about = "Reads FeliCa student cards and reports each presentation to the OruCa API")]
pub struct Cli {
    /// TOML configuration file (default: ./oruca.toml if present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Endpoint receiving log/write messages
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Transport used to reach the endpoint
    #[arg(long, value_parser = ["socket", "request"])]
    pub transport: Option<String>,

    /// Publish timeout in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Reader backend
    #[arg(long, value_parser = ["pcsc", "simulated"])]
    pub reader: Option<String>,

    /// PC/SC reader name (substring match)
    #[arg(long)]
    pub reader_name: Option<String>,

    /// Log level or filter directive, overridden by RUST_LOG
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(long, value_parser = ["compact", "pretty", "json"])]
    pub log_format: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_arguments() {
        let cli = Cli::try_parse_from(["oruca-nfc"]).unwrap();
        assert!(cli.config.is_none());
        assert!(cli.endpoint.is_none());
    }

    #[test]
    fn test_all_arguments() {
        let cli = Cli::try_parse_from([
            "oruca-nfc",
            "--config",
            "/etc/oruca/reader.toml",
            "--endpoint",
            "http://api:3000/log/write",
            "--transport",
            "request",
            "--timeout-ms",
            "3000",
            "--reader",
            "simulated",
            "--log-format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("/etc/oruca/reader.toml")));
        assert_eq!(cli.transport.as_deref(), Some("request"));
        assert_eq!(cli.timeout_ms, Some(3000));
        assert_eq!(cli.reader.as_deref(), Some("simulated"));
    }

    #[test]
    fn test_rejects_unknown_transport() {
        assert!(Cli::try_parse_from(["oruca-nfc", "--transport", "carrier-pigeon"]).is_err());
    }
}
