//! Batch upload coordination.
//!
//! # Design
//!
//! - A selection replaces the batch wholesale; every file becomes a pending
//!   [`UploadJob`] named once, at selection time.
//! - Jobs are dispatched one at a time in selection order. A job's terminal
//!   transition and notification happen before the next request is issued.
//! - Failures are per job; the batch always runs to the end.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use async_stream::stream;
use futures_util::{Stream, StreamExt};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{TransferError, TransferResult};
use crate::job::{JobFailure, JobId, JobState, UploadJob};
use crate::model::{FileName, FilePayload, ServerMessage, TransferTimeout};
use crate::naming::upload_name;
use crate::notify::{NotificationSink, Severity};
use crate::outcome::TransferOutcome;
use crate::progress::{Percent, ProgressSink};
use crate::transport::FileTransfer;

/// Observes job lifecycle changes, typically to render them.
pub trait JobPresenter: Send + Sync {
    /// Sink receiving live progress for `job` while its upload is in flight.
    fn progress_sink(&self, job: &UploadJob) -> Arc<dyn ProgressSink>;

    /// Called after `job` was created or changed state.
    fn state_changed(&self, job: &UploadJob);

    /// Called after a job left the batch.
    fn removed(&self, _id: JobId) {}
}

/// A file chosen for upload with an optional replacement base name.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    /// File contents and original name.
    pub payload: FilePayload,
    /// Base name to upload under; the original extension is kept.
    pub override_base: Option<String>,
}

impl SelectedFile {
    /// Select a file under its own name.
    #[must_use]
    pub const fn new(payload: FilePayload) -> Self {
        Self {
            payload,
            override_base: None,
        }
    }

    /// Upload under `base` plus the original extension.
    #[must_use]
    pub fn with_override(mut self, base: impl Into<String>) -> Self {
        self.override_base = Some(base.into());
        self
    }
}

/// Outcome of one job in a submitted batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobResult {
    /// Job the outcome belongs to.
    pub job_id: JobId,
    /// Name the file was uploaded under.
    pub file_name: FileName,
    /// Transfer outcome.
    pub outcome: TransferOutcome<ServerMessage>,
}

/// Tally of a completed batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Jobs the server accepted.
    pub succeeded: usize,
    /// Jobs that failed before the deadline.
    pub failed: usize,
    /// Jobs that hit the deadline.
    pub timed_out: usize,
}

impl BatchReport {
    fn record<T>(&mut self, outcome: &TransferOutcome<T>) {
        match outcome {
            TransferOutcome::Success(_) => self.succeeded += 1,
            TransferOutcome::Failure(_) => self.failed += 1,
            TransferOutcome::TimedOut => self.timed_out += 1,
        }
    }

    /// Number of jobs that ran.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.succeeded + self.failed + self.timed_out
    }

    /// Whether every job succeeded.
    #[must_use]
    pub const fn all_succeeded(&self) -> bool {
        self.failed == 0 && self.timed_out == 0
    }
}

struct Entry {
    job: UploadJob,
    payload: FilePayload,
}

/// Owns the current upload batch and drives it through a [`FileTransfer`].
pub struct UploadCoordinator {
    transfer: Arc<dyn FileTransfer>,
    notifier: Arc<dyn NotificationSink>,
    presenter: Arc<dyn JobPresenter>,
    timeout: TransferTimeout,
    entries: Vec<Entry>,
    next_id: u64,
}

impl UploadCoordinator {
    /// Coordinator with an empty batch.
    #[must_use]
    pub fn new(
        transfer: Arc<dyn FileTransfer>,
        notifier: Arc<dyn NotificationSink>,
        presenter: Arc<dyn JobPresenter>,
        timeout: TransferTimeout,
    ) -> Self {
        Self {
            transfer,
            notifier,
            presenter,
            timeout,
            entries: Vec::new(),
            next_id: 1,
        }
    }

    /// Replace the batch with `files`, one pending job each.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::EmptySelection`] (after an error notification)
    /// when `files` is empty, and [`TransferError::InvalidFileName`] when a
    /// rename produces an invalid name. The previous batch is kept on error.
    pub fn select(&mut self, files: Vec<SelectedFile>) -> TransferResult<Vec<JobId>> {
        if files.is_empty() {
            return Err(self.empty_selection());
        }

        let mut entries = Vec::with_capacity(files.len());
        let mut next_id = self.next_id;
        for file in files {
            let original = file.payload.name.clone();
            let target = upload_name(&original, file.override_base.as_deref())?;
            let id = JobId::new(next_id);
            next_id += 1;
            let job = UploadJob::new(id, target.clone(), original, file.payload.size_bytes());
            entries.push(Entry {
                job,
                payload: file.payload.renamed(target),
            });
        }

        self.clear();
        self.next_id = next_id;
        self.entries = entries;
        for entry in &self.entries {
            self.presenter.state_changed(&entry.job);
        }
        info!(jobs = self.entries.len(), "upload batch selected");
        Ok(self.entries.iter().map(|entry| entry.job.id).collect())
    }

    /// Jobs of the current batch in selection order.
    pub fn jobs(&self) -> impl Iterator<Item = &UploadJob> + '_ {
        self.entries.iter().map(|entry| &entry.job)
    }

    /// Look up a job.
    #[must_use]
    pub fn job(&self, id: JobId) -> Option<&UploadJob> {
        self.jobs().find(|job| job.id == id)
    }

    /// Number of jobs in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the batch is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop one job from the batch. Returns whether it existed.
    pub fn remove(&mut self, id: JobId) -> bool {
        let Some(index) = self.entries.iter().position(|entry| entry.job.id == id) else {
            return false;
        };
        self.entries.remove(index);
        self.presenter.removed(id);
        true
    }

    /// Drop every job.
    pub fn clear(&mut self) {
        for entry in self.entries.drain(..) {
            self.presenter.removed(entry.job.id);
        }
    }

    /// Upload every pending job sequentially, yielding each outcome as it resolves.
    ///
    /// Nothing is sent until the stream is polled.
    pub fn submit_batch(&mut self) -> impl Stream<Item = JobResult> + Send + '_ {
        let this = self;
        stream! {
            let pending: Vec<JobId> = this
                .jobs()
                .filter(|job| matches!(job.state(), JobState::Pending))
                .map(|job| job.id)
                .collect();
            for id in pending {
                if let Some(result) = this.run_job(id).await {
                    yield result;
                }
            }
        }
    }

    /// Drive [`Self::submit_batch`] to completion.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::EmptySelection`] (after an error notification)
    /// when no job is pending.
    pub async fn run_batch(&mut self) -> TransferResult<BatchReport> {
        if !self
            .jobs()
            .any(|job| matches!(job.state(), JobState::Pending))
        {
            return Err(self.empty_selection());
        }

        let mut report = BatchReport::default();
        {
            let mut results = std::pin::pin!(self.submit_batch());
            while let Some(result) = results.next().await {
                report.record(&result.outcome);
            }
        }
        info!(
            succeeded = report.succeeded,
            failed = report.failed,
            timed_out = report.timed_out,
            "upload batch finished"
        );
        Ok(report)
    }

    fn empty_selection(&self) -> TransferError {
        let err = TransferError::EmptySelection;
        self.notifier.notify(&err.detail(), Severity::Error);
        err
    }

    async fn run_job(&mut self, id: JobId) -> Option<JobResult> {
        let transfer = Arc::clone(&self.transfer);
        let timeout = self.timeout;
        let entry = self.entries.iter_mut().find(|entry| entry.job.id == id)?;

        if let Err(err) = entry.job.start() {
            warn!(job = %id, error = %err.detail(), "skipping upload job");
            return None;
        }
        self.presenter.state_changed(&entry.job);

        let progress = Arc::new(JobProgress::new(self.presenter.progress_sink(&entry.job)));
        let sink: Arc<dyn ProgressSink> = progress.clone();
        let outcome = transfer.upload(&entry.payload, sink, timeout).await;

        match entry.job.record_progress(progress.latest()) {
            Ok(true) => self.presenter.state_changed(&entry.job),
            Ok(false) => {}
            Err(err) => warn!(job = %id, error = %err.detail(), "dropping late upload progress"),
        }

        let file_name = entry.job.file_name.clone();
        let (transition, message, severity) = match &outcome {
            TransferOutcome::Success(reply) => (
                entry.job.succeed(reply.message.clone()),
                format!("Upload successful ({file_name}): {}", reply.message),
                Severity::Success,
            ),
            TransferOutcome::Failure(failure) => (
                entry.job.fail(JobFailure::Rejected {
                    kind: failure.kind,
                    detail: failure.detail.clone(),
                }),
                format!("Upload failed ({file_name}): {}", failure.detail),
                Severity::Error,
            ),
            TransferOutcome::TimedOut => (
                entry.job.fail(JobFailure::TimedOut),
                format!(
                    "Upload timed out ({file_name}). Please try again or check your connection."
                ),
                Severity::Error,
            ),
        };
        if let Err(err) = transition {
            warn!(job = %id, error = %err.detail(), "upload job transition rejected");
        }
        self.presenter.state_changed(&entry.job);
        self.notifier.notify(&message, severity);

        Some(JobResult {
            job_id: id,
            file_name,
            outcome,
        })
    }
}

/// Per-job progress relay that only forwards increases.
struct JobProgress {
    inner: Arc<dyn ProgressSink>,
    latest: AtomicU8,
}

impl JobProgress {
    fn new(inner: Arc<dyn ProgressSink>) -> Self {
        Self {
            inner,
            latest: AtomicU8::new(0),
        }
    }

    fn latest(&self) -> Percent {
        Percent::new(self.latest.load(Ordering::Acquire))
    }
}

impl ProgressSink for JobProgress {
    fn update(&self, percent: Percent) {
        let previous = self.latest.fetch_max(percent.value(), Ordering::AcqRel);
        if percent.value() > previous {
            self.inner.update(percent);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Mutex, PoisonError};

    use super::*;
    use crate::outcome::FailureKind;

    #[derive(Default)]
    struct Seen(Mutex<Vec<u8>>);

    impl ProgressSink for Seen {
        fn update(&self, percent: Percent) {
            self.0
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(percent.value());
        }
    }

    #[test]
    fn job_progress_forwards_increases_only() {
        let seen = Arc::new(Seen::default());
        let relay = JobProgress::new(seen.clone());
        for value in [10, 5, 10, 60, 100, 90] {
            relay.update(Percent::new(value));
        }
        assert_eq!(*seen.0.lock().expect("lock"), vec![10, 60, 100]);
        assert_eq!(relay.latest(), Percent::COMPLETE);
    }

    #[test]
    fn batch_report_counts_each_variant() {
        let mut report = BatchReport::default();
        report.record(&TransferOutcome::Success(()));
        report.record::<()>(&TransferOutcome::failure(FailureKind::Network, "down"));
        report.record::<()>(&TransferOutcome::TimedOut);
        report.record(&TransferOutcome::Success(()));

        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.timed_out, 1);
        assert_eq!(report.total(), 4);
        assert!(!report.all_succeeded());
    }
}
