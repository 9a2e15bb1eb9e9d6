//! Client configuration: defaults, file loading, and validation.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{TransferError, TransferResult};
use crate::model::TransferTimeout;

/// Default service base URL.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5500/api";
/// Default upload deadline (1 minute).
pub const DEFAULT_UPLOAD_TIMEOUT_MS: u64 = 60_000;
/// Default listing deadline.
pub const DEFAULT_LIST_TIMEOUT_MS: u64 = 10_000;
/// Default delete deadline.
pub const DEFAULT_DELETE_TIMEOUT_MS: u64 = 10_000;
/// Default download deadline.
pub const DEFAULT_DOWNLOAD_TIMEOUT_MS: u64 = 30_000;

/// Raw configuration as loaded from a file or assembled from CLI flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransferConfig {
    /// Service base URL; endpoint paths are appended to it.
    pub base_url: String,
    /// Upload deadline in milliseconds.
    pub upload_timeout_ms: u64,
    /// Listing deadline in milliseconds.
    pub list_timeout_ms: u64,
    /// Delete deadline in milliseconds.
    pub delete_timeout_ms: u64,
    /// Download deadline in milliseconds.
    pub download_timeout_ms: u64,
    /// Directory downloads are saved into.
    pub download_dir: PathBuf,
    /// `user-agent` header value.
    pub user_agent: String,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            upload_timeout_ms: DEFAULT_UPLOAD_TIMEOUT_MS,
            list_timeout_ms: DEFAULT_LIST_TIMEOUT_MS,
            delete_timeout_ms: DEFAULT_DELETE_TIMEOUT_MS,
            download_timeout_ms: DEFAULT_DOWNLOAD_TIMEOUT_MS,
            download_dir: PathBuf::from("."),
            user_agent: default_user_agent(),
        }
    }
}

/// `airbox/<crate version>`.
#[must_use]
pub fn default_user_agent() -> String {
    format!("airbox/{}", env!("CARGO_PKG_VERSION"))
}

/// Per-operation deadlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Upload deadline.
    pub upload: TransferTimeout,
    /// Listing deadline.
    pub list: TransferTimeout,
    /// Delete deadline.
    pub delete: TransferTimeout,
    /// Download deadline.
    pub download: TransferTimeout,
}

impl TransferConfig {
    /// Load a configuration file; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::ConfigIo`] when the file cannot be read and
    /// [`TransferError::ConfigParse`] when it is not valid JSON for this type.
    pub fn from_json_file(path: &Path) -> TransferResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| TransferError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| TransferError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse and check the base URL.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::InvalidConfig`] for unparsable URLs, non-HTTP
    /// schemes, and URLs carrying a query or fragment.
    pub fn base_url(&self) -> TransferResult<Url> {
        let url = Url::parse(self.base_url.trim()).map_err(|_| TransferError::InvalidConfig {
            field: "base_url",
            value: Some(self.base_url.clone()),
            reason: "is not a valid URL",
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(TransferError::InvalidConfig {
                field: "base_url",
                value: Some(self.base_url.clone()),
                reason: "must use http or https",
            });
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(TransferError::InvalidConfig {
                field: "base_url",
                value: Some(self.base_url.clone()),
                reason: "must not carry a query or fragment",
            });
        }
        Ok(url)
    }

    /// Convert every deadline into a [`TransferTimeout`].
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::InvalidConfig`] naming the first zero deadline.
    pub fn timeouts(&self) -> TransferResult<Timeouts> {
        Ok(Timeouts {
            upload: timeout_field("upload_timeout_ms", self.upload_timeout_ms)?,
            list: timeout_field("list_timeout_ms", self.list_timeout_ms)?,
            delete: timeout_field("delete_timeout_ms", self.delete_timeout_ms)?,
            download: timeout_field("download_timeout_ms", self.download_timeout_ms)?,
        })
    }

    /// Validate the whole configuration.
    ///
    /// # Errors
    ///
    /// Returns the first [`TransferError::InvalidConfig`] encountered.
    pub fn validate(&self) -> TransferResult<()> {
        self.base_url()?;
        self.timeouts()?;
        if self.user_agent.trim().is_empty() {
            return Err(TransferError::InvalidConfig {
                field: "user_agent",
                value: None,
                reason: "must not be empty",
            });
        }
        if self.download_dir.as_os_str().is_empty() {
            return Err(TransferError::InvalidConfig {
                field: "download_dir",
                value: None,
                reason: "must not be empty",
            });
        }
        Ok(())
    }
}

fn timeout_field(field: &'static str, value_ms: u64) -> TransferResult<TransferTimeout> {
    TransferTimeout::from_millis(value_ms).map_err(|_| TransferError::InvalidConfig {
        field,
        value: Some(value_ms.to_string()),
        reason: "must be a positive number of milliseconds",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = TransferConfig::default();
        config.validate().expect("defaults are valid");
        let timeouts = config.timeouts().expect("timeouts");
        assert_eq!(timeouts.upload.as_millis(), DEFAULT_UPLOAD_TIMEOUT_MS);
        assert_eq!(timeouts.list.as_millis(), DEFAULT_LIST_TIMEOUT_MS);
        assert!(config.user_agent.starts_with("airbox/"));
    }

    #[test]
    fn zero_timeout_names_the_field() {
        let config = TransferConfig {
            delete_timeout_ms: 0,
            ..TransferConfig::default()
        };
        match config.validate() {
            Err(TransferError::InvalidConfig { field, .. }) => {
                assert_eq!(field, "delete_timeout_ms");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn base_url_rejects_other_schemes() {
        let config = TransferConfig {
            base_url: "ftp://files.example/api".into(),
            ..TransferConfig::default()
        };
        assert!(matches!(
            config.base_url(),
            Err(TransferError::InvalidConfig {
                field: "base_url",
                ..
            })
        ));

        let config = TransferConfig {
            base_url: "not a url".into(),
            ..TransferConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("airbox.json");
        std::fs::write(
            &path,
            r#"{"base_url": "https://files.example/api", "upload_timeout_ms": 1500}"#,
        )
        .expect("write config");

        let config = TransferConfig::from_json_file(&path).expect("load");
        assert_eq!(config.base_url, "https://files.example/api");
        assert_eq!(config.upload_timeout_ms, 1_500);
        assert_eq!(config.list_timeout_ms, DEFAULT_LIST_TIMEOUT_MS);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("airbox.json");
        std::fs::write(&path, r#"{"base_uri": "https://files.example"}"#).expect("write config");

        assert!(matches!(
            TransferConfig::from_json_file(&path),
            Err(TransferError::ConfigParse { .. })
        ));
        assert!(matches!(
            TransferConfig::from_json_file(&dir.path().join("missing.json")),
            Err(TransferError::ConfigIo { .. })
        ));
    }
}
