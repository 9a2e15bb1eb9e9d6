//! File names, payloads, requests, and wire DTOs.

use std::borrow::Cow;
use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{TransferError, TransferResult};

/// Name of a file as known to the remote service.
///
/// The same type names upload targets, listing rows, and delete/download
/// targets, so escaping is applied in exactly one place.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FileName(String);

impl FileName {
    /// Validate and wrap a file name.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::InvalidFileName`] for empty or whitespace-only names
    /// and names containing NUL.
    pub fn new(raw: impl Into<String>) -> TransferResult<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(TransferError::InvalidFileName {
                value: raw,
                reason: "must not be empty",
            });
        }
        if raw.contains('\0') {
            return Err(TransferError::InvalidFileName {
                value: raw,
                reason: "must not contain NUL",
            });
        }
        Ok(Self(raw))
    }

    /// Derive the name from the final component of a local path.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::InvalidFileName`] when the path has no UTF-8 file name.
    pub fn from_path(path: &Path) -> TransferResult<Self> {
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| TransferError::InvalidFileName {
                value: path.display().to_string(),
                reason: "path has no UTF-8 file name",
            })?;
        Self::new(name)
    }

    /// Borrow the raw name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Percent-encode every byte except ASCII alphanumerics and `-_.~`.
    #[must_use]
    pub fn escaped(&self) -> Cow<'_, str> {
        urlencoding::encode(&self.0)
    }

    /// Text after the final `.`, when there is one and it is non-empty.
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        self.0
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty())
    }

    /// Name without its extension.
    #[must_use]
    pub fn stem(&self) -> &str {
        match self.0.rsplit_once('.') {
            Some((stem, ext)) if !ext.is_empty() => stem,
            _ => &self.0,
        }
    }

    /// Whether the name can be used as a single path component for local saves.
    #[must_use]
    pub fn is_safe_local_name(&self) -> bool {
        let name = self.0.as_str();
        name != "."
            && name != ".."
            && !name.contains(['/', '\\'])
            && !name.contains('\0')
    }
}

impl Display for FileName {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.pad(&self.0)
    }
}

impl TryFrom<String> for FileName {
    type Error = TransferError;

    fn try_from(raw: String) -> TransferResult<Self> {
        Self::new(raw)
    }
}

impl From<FileName> for String {
    fn from(name: FileName) -> Self {
        name.0
    }
}

impl AsRef<str> for FileName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// File contents queued for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePayload {
    /// Name sent as the multipart file name.
    pub name: FileName,
    /// File contents.
    pub bytes: Bytes,
}

impl FilePayload {
    /// Construct a payload from a name and bytes.
    #[must_use]
    pub fn new(name: FileName, bytes: impl Into<Bytes>) -> Self {
        Self {
            name,
            bytes: bytes.into(),
        }
    }

    /// Read a local file into memory.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::ReadFile`] when the file cannot be read and
    /// [`TransferError::InvalidFileName`] when the path has no usable name.
    pub async fn from_path(path: &Path) -> TransferResult<Self> {
        let name = FileName::from_path(path)?;
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| TransferError::ReadFile {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::new(name, bytes))
    }

    /// Size of the payload in bytes.
    #[must_use]
    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Same contents under a different name.
    #[must_use]
    pub fn renamed(self, name: FileName) -> Self {
        Self {
            name,
            bytes: self.bytes,
        }
    }
}

/// Positive deadline applied to a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransferTimeout(Duration);

impl TransferTimeout {
    /// Build a timeout from milliseconds.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::InvalidTimeout`] when `millis` is zero.
    pub fn from_millis(millis: u64) -> TransferResult<Self> {
        if millis == 0 {
            return Err(TransferError::InvalidTimeout { value_ms: millis });
        }
        Ok(Self(Duration::from_millis(millis)))
    }

    /// Deadline as a [`Duration`].
    #[must_use]
    pub const fn as_duration(self) -> Duration {
        self.0
    }

    /// Deadline in whole milliseconds.
    #[must_use]
    pub fn as_millis(self) -> u64 {
        u64::try_from(self.0.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Operation carried by a [`TransferRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferOperation {
    /// `POST {base}/upload`
    Upload,
    /// `GET {base}/files`
    List,
    /// `DELETE {base}/delete/{name}`
    Delete,
    /// `GET {base}/download/{name}`
    Download,
}

impl TransferOperation {
    /// Stable label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::List => "list",
            Self::Delete => "delete",
            Self::Download => "download",
        }
    }
}

impl Display for TransferOperation {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// A single request as issued; immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    operation: TransferOperation,
    target: Option<FileName>,
    timeout: TransferTimeout,
}

impl TransferRequest {
    /// Upload request for `target`.
    #[must_use]
    pub const fn upload(target: FileName, timeout: TransferTimeout) -> Self {
        Self {
            operation: TransferOperation::Upload,
            target: Some(target),
            timeout,
        }
    }

    /// Listing request.
    #[must_use]
    pub const fn list(timeout: TransferTimeout) -> Self {
        Self {
            operation: TransferOperation::List,
            target: None,
            timeout,
        }
    }

    /// Delete request for `target`.
    #[must_use]
    pub const fn delete(target: FileName, timeout: TransferTimeout) -> Self {
        Self {
            operation: TransferOperation::Delete,
            target: Some(target),
            timeout,
        }
    }

    /// Download request for `target`.
    #[must_use]
    pub const fn download(target: FileName, timeout: TransferTimeout) -> Self {
        Self {
            operation: TransferOperation::Download,
            target: Some(target),
            timeout,
        }
    }

    /// Operation kind.
    #[must_use]
    pub const fn operation(&self) -> TransferOperation {
        self.operation
    }

    /// Target file, when the operation has one.
    #[must_use]
    pub const fn target(&self) -> Option<&FileName> {
        self.target.as_ref()
    }

    /// Deadline for the request.
    #[must_use]
    pub const fn timeout(&self) -> TransferTimeout {
        self.timeout
    }

    /// Endpoint path relative to the service base URL.
    #[must_use]
    pub fn path(&self) -> String {
        match (self.operation, &self.target) {
            (TransferOperation::Upload, _) => "upload".to_string(),
            (TransferOperation::List, _) => "files".to_string(),
            (TransferOperation::Delete, Some(name)) => format!("delete/{}", name.escaped()),
            (TransferOperation::Download, Some(name)) => format!("download/{}", name.escaped()),
            (TransferOperation::Delete, None) => "delete/".to_string(),
            (TransferOperation::Download, None) => "download/".to_string(),
        }
    }

    /// Label for logs: the target name or `-`.
    #[must_use]
    pub fn target_label(&self) -> &str {
        self.target.as_ref().map_or("-", FileName::as_str)
    }
}

/// Body returned by upload and delete endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerMessage {
    /// Message surfaced to the user.
    pub message: String,
}

/// One row of the remote listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteFileEntry {
    /// Remote file name.
    pub name: FileName,
}

impl RemoteFileEntry {
    /// Wrap a file name.
    #[must_use]
    pub const fn new(name: FileName) -> Self {
        Self { name }
    }
}

/// Result of a completed download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedFile {
    /// Remote name the file was saved under.
    pub name: FileName,
    /// Final local path.
    pub path: PathBuf,
    /// Bytes written.
    pub size_bytes: u64,
}
