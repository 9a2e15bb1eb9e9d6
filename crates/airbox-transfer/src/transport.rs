//! Transport seam shared by the coordinators.

use std::sync::Arc;

use async_trait::async_trait;

use crate::model::{FileName, FilePayload, RemoteFileEntry, SavedFile, ServerMessage, TransferTimeout};
use crate::outcome::TransferOutcome;
use crate::progress::ProgressSink;

/// Outbound file operations with deadline and cancellation semantics.
///
/// Implementations enforce `timeout` themselves and normalise every transport
/// error into a [`TransferOutcome`]; they never retry.
#[async_trait]
pub trait FileTransfer: Send + Sync {
    /// Upload `file`, reporting monotonic progress to `progress` until the call resolves.
    async fn upload(
        &self,
        file: &FilePayload,
        progress: Arc<dyn ProgressSink>,
        timeout: TransferTimeout,
    ) -> TransferOutcome<ServerMessage>;

    /// Fetch the remote listing.
    async fn list(&self, timeout: TransferTimeout) -> TransferOutcome<Vec<RemoteFileEntry>>;

    /// Delete a remote file.
    async fn delete(&self, name: &FileName, timeout: TransferTimeout)
    -> TransferOutcome<ServerMessage>;

    /// Download a remote file and save it locally under `name`.
    async fn download(&self, name: &FileName, timeout: TransferTimeout)
    -> TransferOutcome<SavedFile>;
}
