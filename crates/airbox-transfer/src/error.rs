//! Error types for the transfer layer.
//!
//! # Design
//!
//! - Constant error messages; context lives in structured fields.
//! - Transport failures are not represented here: they are normalised into
//!   [`TransferOutcome`](crate::outcome::TransferOutcome) at the client boundary.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::job::JobId;

/// Result alias for transfer-layer operations that can fail before any request is issued.
pub type TransferResult<T> = Result<T, TransferError>;

/// Errors raised while building requests, loading inputs, or mutating job state.
#[derive(Debug, Error)]
pub enum TransferError {
    /// A file name failed validation.
    #[error("invalid file name")]
    InvalidFileName {
        /// Offending value.
        value: String,
        /// Static reason for the failure.
        reason: &'static str,
    },
    /// A timeout was zero.
    #[error("invalid transfer timeout")]
    InvalidTimeout {
        /// Offending value in milliseconds.
        value_ms: u64,
    },
    /// No file was selected for upload.
    #[error("no file selected")]
    EmptySelection,
    /// A local file could not be read into a payload.
    #[error("failed to read local file")]
    ReadFile {
        /// Path that failed to load.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// A job transition would move a job backwards or out of a terminal state.
    #[error("invalid upload job transition")]
    InvalidTransition {
        /// Job that rejected the transition.
        job_id: JobId,
        /// State the job was in.
        from: &'static str,
        /// State that was requested.
        to: &'static str,
    },
    /// A configuration field held an invalid value.
    #[error("invalid configuration field")]
    InvalidConfig {
        /// Field that failed validation.
        field: &'static str,
        /// Offending value when available.
        value: Option<String>,
        /// Static reason for the failure.
        reason: &'static str,
    },
    /// The configuration file could not be read.
    #[error("failed to read configuration file")]
    ConfigIo {
        /// Configuration file path.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The configuration file was not valid JSON for [`TransferConfig`](crate::config::TransferConfig).
    #[error("failed to parse configuration file")]
    ConfigParse {
        /// Configuration file path.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client")]
    ClientBuild {
        /// Underlying reqwest error.
        source: reqwest::Error,
    },
}

impl TransferError {
    /// Human-readable description including the structured context.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::InvalidFileName { value, reason } => format!("invalid file name '{value}': {reason}"),
            Self::InvalidTimeout { value_ms } => {
                format!("timeout must be a positive number of milliseconds (got {value_ms})")
            }
            Self::EmptySelection => "No file selected!".to_string(),
            Self::ReadFile { path, source } => {
                format!("failed to read '{}': {source}", path.display())
            }
            Self::InvalidTransition { job_id, from, to } => {
                format!("upload job {job_id} cannot move from {from} to {to}")
            }
            Self::InvalidConfig {
                field,
                value,
                reason,
            } => value.as_ref().map_or_else(
                || format!("configuration field '{field}' {reason}"),
                |value| format!("configuration field '{field}' {reason} (got '{value}')"),
            ),
            Self::ConfigIo { path, source } => {
                format!("failed to read configuration '{}': {source}", path.display())
            }
            Self::ConfigParse { path, source } => {
                format!("failed to parse configuration '{}': {source}", path.display())
            }
            Self::ClientBuild { source } => format!("failed to build HTTP client: {source}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_includes_structured_context() {
        let err = TransferError::InvalidConfig {
            field: "base_url",
            value: Some("ftp://example".into()),
            reason: "must use http or https",
        };
        assert_eq!(
            err.detail(),
            "configuration field 'base_url' must use http or https (got 'ftp://example')"
        );
        assert_eq!(err.to_string(), "invalid configuration field");
        assert_eq!(TransferError::EmptySelection.detail(), "No file selected!");
    }
}
