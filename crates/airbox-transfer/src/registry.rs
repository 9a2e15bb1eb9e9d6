//! Remote file listing with confirmed deletes and downloads.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};
use url::Url;

use crate::config::Timeouts;
use crate::model::{FileName, RemoteFileEntry, SavedFile, ServerMessage, TransferRequest};
use crate::notify::{NotificationSink, Severity};
use crate::outcome::TransferOutcome;
use crate::prompt::ConfirmationPrompt;
use crate::transport::FileTransfer;

/// Title of the delete confirmation.
pub const DELETE_PROMPT_TITLE: &str = "Delete File";

/// Result of a delete request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteResult {
    /// The user declined; nothing was sent.
    Declined,
    /// The request was sent and resolved.
    Completed(TransferOutcome<ServerMessage>),
}

impl DeleteResult {
    /// Whether the file was deleted.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        matches!(self, Self::Completed(TransferOutcome::Success(_)))
    }
}

/// Owns the locally rendered view of the remote listing.
pub struct FileRegistryView {
    transfer: Arc<dyn FileTransfer>,
    notifier: Arc<dyn NotificationSink>,
    prompt: Arc<dyn ConfirmationPrompt>,
    timeouts: Timeouts,
    base_url: Url,
    entries: Vec<RemoteFileEntry>,
}

/// Serializable row for renderers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryView {
    /// Remote file name.
    pub name: FileName,
    /// Direct download link.
    pub download_url: String,
}

impl FileRegistryView {
    /// Empty view; call [`Self::refresh`] to populate it.
    #[must_use]
    pub fn new(
        transfer: Arc<dyn FileTransfer>,
        notifier: Arc<dyn NotificationSink>,
        prompt: Arc<dyn ConfirmationPrompt>,
        timeouts: Timeouts,
        base_url: Url,
    ) -> Self {
        Self {
            transfer,
            notifier,
            prompt,
            timeouts,
            base_url,
            entries: Vec::new(),
        }
    }

    /// Rows in server order. Duplicate names are kept as separate rows.
    #[must_use]
    pub fn entries(&self) -> &[RemoteFileEntry] {
        &self.entries
    }

    /// Rows paired with their download links.
    #[must_use]
    pub fn entry_views(&self) -> Vec<EntryView> {
        self.entries
            .iter()
            .map(|entry| EntryView {
                name: entry.name.clone(),
                download_url: self.download_url(&entry.name),
            })
            .collect()
    }

    /// Direct link to `{base}/download/{escaped name}`.
    #[must_use]
    pub fn download_url(&self, name: &FileName) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        let request = TransferRequest::download(name.clone(), self.timeouts.download);
        format!("{base}/{}", request.path())
    }

    /// Replace the rows with a fresh listing; returns the new row count.
    ///
    /// On failure the previous rows are kept and an error notification is raised.
    pub async fn refresh(&mut self) -> TransferOutcome<usize> {
        match self.transfer.list(self.timeouts.list).await {
            TransferOutcome::Success(entries) => {
                self.entries = entries;
                debug!(entries = self.entries.len(), "file listing refreshed");
                TransferOutcome::Success(self.entries.len())
            }
            TransferOutcome::Failure(failure) => {
                self.notifier.notify(
                    &format!("Error fetching files: {}", failure.detail),
                    Severity::Error,
                );
                TransferOutcome::Failure(failure)
            }
            TransferOutcome::TimedOut => {
                self.notifier.notify(
                    "Fetching files timed out. Please try again or check your connection.",
                    Severity::Error,
                );
                TransferOutcome::TimedOut
            }
        }
    }

    /// Ask for confirmation, then delete `name` remotely.
    ///
    /// On success the first matching row is removed without a refresh.
    pub async fn request_delete(&mut self, name: &FileName) -> DeleteResult {
        let message = format!("Are you sure you want to delete '{name}'?");
        if !self.prompt.confirm(DELETE_PROMPT_TITLE, &message).await {
            debug!(file = %name, "delete declined");
            return DeleteResult::Declined;
        }

        let outcome = self.transfer.delete(name, self.timeouts.delete).await;
        match &outcome {
            TransferOutcome::Success(reply) => {
                if let Some(index) = self.entries.iter().position(|entry| &entry.name == name) {
                    self.entries.remove(index);
                }
                info!(file = %name, "file deleted");
                self.notifier.notify(&reply.message, Severity::Success);
            }
            TransferOutcome::Failure(failure) => self.notifier.notify(
                &format!("Error deleting file: {}", failure.detail),
                Severity::Error,
            ),
            TransferOutcome::TimedOut => self.notifier.notify(
                "Deleting file timed out. Please try again or check your connection.",
                Severity::Error,
            ),
        }
        DeleteResult::Completed(outcome)
    }

    /// Download `name` into the client's download directory.
    ///
    /// The rows are never modified.
    pub async fn request_download(&self, name: &FileName) -> TransferOutcome<SavedFile> {
        let outcome = self.transfer.download(name, self.timeouts.download).await;
        match &outcome {
            TransferOutcome::Success(_) => self.notifier.notify(
                &format!("Successfully downloaded '{name}'"),
                Severity::Success,
            ),
            TransferOutcome::Failure(failure) => self.notifier.notify(
                &format!("An error occurred: {}", failure.detail),
                Severity::Error,
            ),
            TransferOutcome::TimedOut => self.notifier.notify(
                "Downloading file timed out. Please try again or check your connection.",
                Severity::Error,
            ),
        }
        outcome
    }
}
