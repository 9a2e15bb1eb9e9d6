#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls
)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

//! Asynchronous transfer layer for the airbox file manager.
//!
//! Layout:
//! - `model.rs`: file names, payloads, requests, and wire DTOs
//! - `outcome.rs`: the `TransferOutcome` result taxonomy
//! - `transport.rs`: the `FileTransfer` seam consumed by the coordinators
//! - `http.rs`: reqwest-backed `HttpTransferClient` (deadlines, progress, part files)
//! - `coordinator.rs` / `job.rs` / `naming.rs`: batch upload lifecycle
//! - `registry.rs`: remote listing, confirmed deletes, downloads
//! - `notify.rs` / `progress.rs` / `prompt.rs`: presentation collaborators
//! - `preview.rs`: local file classification for previews
//! - `config.rs` / `error.rs`: configuration and error types

pub mod config;
pub mod coordinator;
pub mod error;
pub mod http;
pub mod job;
pub mod model;
pub mod naming;
pub mod notify;
pub mod outcome;
pub mod preview;
pub mod progress;
pub mod prompt;
pub mod registry;
pub mod transport;

mod save;

pub use config::{Timeouts, TransferConfig};
pub use coordinator::{BatchReport, JobPresenter, JobResult, SelectedFile, UploadCoordinator};
pub use error::{TransferError, TransferResult};
pub use http::HttpTransferClient;
pub use job::{JobFailure, JobId, JobState, UploadJob};
pub use model::{
    FileName, FilePayload, RemoteFileEntry, SavedFile, ServerMessage, TransferOperation,
    TransferRequest, TransferTimeout,
};
pub use notify::{Notification, NotificationLog, NotificationSink, Severity};
pub use outcome::{FailureKind, TransferFailure, TransferOutcome};
pub use preview::{Preview, PreviewKind};
pub use progress::{NoProgress, Percent, ProgressSink};
pub use prompt::{AssumeYes, ConfirmationPrompt};
pub use registry::{DeleteResult, EntryView, FileRegistryView};
pub use transport::FileTransfer;
