//! Shared client wiring and error types for the CLI.

use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use airbox_transfer::{
    FileTransfer, HttpTransferClient, NotificationSink, Timeouts, TransferConfig, TransferError,
};
use anyhow::anyhow;
use url::Url;

use crate::cli::Cli;
use crate::terminal::TerminalNotifier;

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

impl From<TransferError> for CliError {
    fn from(err: TransferError) -> Self {
        let message = err.detail();
        match err {
            TransferError::ClientBuild { .. } | TransferError::InvalidTransition { .. } => {
                Self::failure(anyhow!(message))
            }
            TransferError::InvalidFileName { .. }
            | TransferError::InvalidTimeout { .. }
            | TransferError::EmptySelection
            | TransferError::ReadFile { .. }
            | TransferError::InvalidConfig { .. }
            | TransferError::ConfigIo { .. }
            | TransferError::ConfigParse { .. } => Self::validation(message),
        }
    }
}

/// Application context passed to command handlers.
#[derive(Clone)]
pub(crate) struct AppContext {
    pub(crate) transfer: Arc<dyn FileTransfer>,
    pub(crate) notifier: Arc<dyn NotificationSink>,
    pub(crate) timeouts: Timeouts,
    pub(crate) base_url: Url,
}

impl AppContext {
    /// Build the HTTP-backed context for one invocation.
    pub(crate) fn from_config(config: &TransferConfig, request_id: Option<&str>) -> CliResult<Self> {
        let client = HttpTransferClient::from_config(config, request_id)?;
        Ok(Self {
            transfer: Arc::new(client),
            notifier: Arc::new(TerminalNotifier),
            timeouts: config.timeouts()?,
            base_url: config.base_url()?,
        })
    }
}

/// Layer the config file (if any) and flag/env overrides into one configuration.
pub(crate) fn resolve_config(cli: &Cli) -> CliResult<TransferConfig> {
    let mut config = match &cli.config {
        Some(path) => TransferConfig::from_json_file(path)?,
        None => TransferConfig::default(),
    };

    if let Some(api_url) = &cli.api_url {
        config.base_url.clone_from(api_url);
    }
    if let Some(value) = cli.upload_timeout_ms {
        config.upload_timeout_ms = value;
    }
    if let Some(value) = cli.list_timeout_ms {
        config.list_timeout_ms = value;
    }
    if let Some(value) = cli.delete_timeout_ms {
        config.delete_timeout_ms = value;
    }
    if let Some(value) = cli.download_timeout_ms {
        config.download_timeout_ms = value;
    }

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn transfer_errors_map_to_exit_codes() {
        assert_eq!(CliError::from(TransferError::EmptySelection).exit_code(), 2);
        let read = TransferError::ReadFile {
            path: PathBuf::from("missing.txt"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(CliError::from(read).exit_code(), 2);
        assert_eq!(CliError::failure(anyhow!("boom")).exit_code(), 3);
        assert_eq!(
            CliError::from(TransferError::EmptySelection).display_message(),
            "No file selected!"
        );
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("airbox.json");
        std::fs::write(
            &path,
            r#"{"base_url": "http://files.example/api", "list_timeout_ms": 2000, "upload_timeout_ms": 9000}"#,
        )
        .expect("write config");

        let cli = Cli::try_parse_from([
            "airbox",
            "--config",
            path.to_str().expect("utf-8 path"),
            "--list-timeout-ms",
            "500",
            "ls",
        ])
        .expect("parse");
        let config = resolve_config(&cli).expect("resolve");

        assert_eq!(config.base_url, "http://files.example/api");
        assert_eq!(config.list_timeout_ms, 500);
        assert_eq!(config.upload_timeout_ms, 9_000);
    }

    #[test]
    fn zero_timeout_is_a_validation_error() {
        let cli = Cli::try_parse_from(["airbox", "--delete-timeout-ms", "0", "ls"]).expect("parse");
        let err = resolve_config(&cli).expect_err("zero timeout");
        assert_eq!(err.exit_code(), 2);
        assert!(err.display_message().contains("delete_timeout_ms"));
    }
}
