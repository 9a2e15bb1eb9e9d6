//! Scripted collaborators for exercising the coordinators without a network.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use airbox_transfer::{
    ConfirmationPrompt, FailureKind, FilePayload, FileName, FileTransfer, JobId, JobPresenter,
    JobState, Percent, ProgressSink, RemoteFileEntry, SavedFile, ServerMessage, TransferOutcome,
    TransferTimeout, UploadJob,
};
use async_trait::async_trait;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One call observed by [`ScriptedTransfer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferCall {
    /// `upload` with the name and size that were sent.
    Upload {
        /// Multipart file name.
        name: FileName,
        /// Payload size.
        size_bytes: u64,
    },
    /// `list`.
    List,
    /// `delete` of a name.
    Delete(FileName),
    /// `download` of a name.
    Download(FileName),
}

/// Scripted behaviour for one upload.
#[derive(Debug, Clone)]
pub struct ScriptedUpload {
    /// Percentages reported before resolving.
    pub progress: Vec<u8>,
    /// Optional latency before resolving; exceeding the timeout yields `TimedOut`.
    pub delay: Option<Duration>,
    /// Outcome returned when the delay fits the deadline.
    pub outcome: TransferOutcome<ServerMessage>,
}

impl ScriptedUpload {
    /// Successful upload reporting 50% then 100%.
    #[must_use]
    pub fn ok(message: &str) -> Self {
        Self {
            progress: vec![50, 100],
            delay: None,
            outcome: TransferOutcome::Success(ServerMessage {
                message: message.to_string(),
            }),
        }
    }

    /// Upload rejected with `kind`.
    #[must_use]
    pub fn fail(kind: FailureKind, detail: &str) -> Self {
        Self {
            progress: vec![100],
            delay: None,
            outcome: TransferOutcome::failure(kind, detail),
        }
    }

    /// Upload that never answers within the deadline.
    #[must_use]
    pub fn timeout() -> Self {
        Self {
            progress: vec![10],
            delay: None,
            outcome: TransferOutcome::TimedOut,
        }
    }

    /// Resolve only after `delay`.
    #[must_use]
    pub const fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// [`FileTransfer`] that replays queued outcomes and records every call.
///
/// Unscripted calls resolve with sensible defaults: uploads succeed, listings
/// are empty, deletes and downloads fail with an input error.
#[derive(Debug, Default)]
pub struct ScriptedTransfer {
    uploads: Mutex<VecDeque<ScriptedUpload>>,
    lists: Mutex<VecDeque<TransferOutcome<Vec<RemoteFileEntry>>>>,
    deletes: Mutex<VecDeque<TransferOutcome<ServerMessage>>>,
    downloads: Mutex<VecDeque<TransferOutcome<SavedFile>>>,
    calls: Mutex<Vec<TransferCall>>,
}

impl ScriptedTransfer {
    /// Empty script.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue the next upload behaviour.
    pub fn push_upload(&self, upload: ScriptedUpload) {
        lock(&self.uploads).push_back(upload);
    }

    /// Queue the next listing outcome.
    pub fn push_list(&self, outcome: TransferOutcome<Vec<RemoteFileEntry>>) {
        lock(&self.lists).push_back(outcome);
    }

    /// Queue the next delete outcome.
    pub fn push_delete(&self, outcome: TransferOutcome<ServerMessage>) {
        lock(&self.deletes).push_back(outcome);
    }

    /// Queue the next download outcome.
    pub fn push_download(&self, outcome: TransferOutcome<SavedFile>) {
        lock(&self.downloads).push_back(outcome);
    }

    /// Every call so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<TransferCall> {
        lock(&self.calls).clone()
    }

    /// Names passed to `upload`, in order.
    #[must_use]
    pub fn uploaded_names(&self) -> Vec<String> {
        lock(&self.calls)
            .iter()
            .filter_map(|call| match call {
                TransferCall::Upload { name, .. } => Some(name.as_str().to_string()),
                _ => None,
            })
            .collect()
    }

    /// Number of `delete` calls.
    #[must_use]
    pub fn delete_calls(&self) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|call| matches!(call, TransferCall::Delete(_)))
            .count()
    }

    fn record(&self, call: TransferCall) {
        lock(&self.calls).push(call);
    }
}

#[async_trait]
impl FileTransfer for ScriptedTransfer {
    async fn upload(
        &self,
        file: &FilePayload,
        progress: Arc<dyn ProgressSink>,
        timeout: TransferTimeout,
    ) -> TransferOutcome<ServerMessage> {
        self.record(TransferCall::Upload {
            name: file.name.clone(),
            size_bytes: file.size_bytes(),
        });
        let script = lock(&self.uploads)
            .pop_front()
            .unwrap_or_else(|| ScriptedUpload::ok("uploaded"));

        for value in &script.progress {
            progress.update(Percent::new(*value));
        }
        if let Some(delay) = script.delay {
            if delay > timeout.as_duration() {
                tokio::time::sleep(timeout.as_duration()).await;
                return TransferOutcome::TimedOut;
            }
            tokio::time::sleep(delay).await;
        }
        script.outcome
    }

    async fn list(&self, _timeout: TransferTimeout) -> TransferOutcome<Vec<RemoteFileEntry>> {
        self.record(TransferCall::List);
        lock(&self.lists)
            .pop_front()
            .unwrap_or(TransferOutcome::Success(Vec::new()))
    }

    async fn delete(
        &self,
        name: &FileName,
        _timeout: TransferTimeout,
    ) -> TransferOutcome<ServerMessage> {
        self.record(TransferCall::Delete(name.clone()));
        lock(&self.deletes).pop_front().unwrap_or_else(|| {
            TransferOutcome::failure(FailureKind::Input, "no scripted delete outcome")
        })
    }

    async fn download(&self, name: &FileName, _timeout: TransferTimeout) -> TransferOutcome<SavedFile> {
        self.record(TransferCall::Download(name.clone()));
        lock(&self.downloads).pop_front().unwrap_or_else(|| {
            TransferOutcome::failure(FailureKind::Input, "no scripted download outcome")
        })
    }
}

/// [`ConfirmationPrompt`] answering from a queue, then with a default.
#[derive(Debug)]
pub struct ScriptedPrompt {
    answers: Mutex<VecDeque<bool>>,
    default: bool,
    asked: Mutex<Vec<(String, String)>>,
}

impl ScriptedPrompt {
    /// Prompt that always answers `answer`.
    #[must_use]
    pub fn always(answer: bool) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(VecDeque::new()),
            default: answer,
            asked: Mutex::new(Vec::new()),
        })
    }

    /// Prompt answering `answers` in order, then declining.
    #[must_use]
    pub fn answers(answers: &[bool]) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(answers.iter().copied().collect()),
            default: false,
            asked: Mutex::new(Vec::new()),
        })
    }

    /// `(title, message)` pairs presented so far.
    #[must_use]
    pub fn asked(&self) -> Vec<(String, String)> {
        lock(&self.asked).clone()
    }
}

#[async_trait]
impl ConfirmationPrompt for ScriptedPrompt {
    async fn confirm(&self, title: &str, message: &str) -> bool {
        lock(&self.asked).push((title.to_string(), message.to_string()));
        lock(&self.answers).pop_front().unwrap_or(self.default)
    }
}

/// [`ProgressSink`] that keeps every update.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    values: Mutex<Vec<Percent>>,
}

impl RecordingProgress {
    /// Empty recorder.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Updates received so far.
    #[must_use]
    pub fn values(&self) -> Vec<Percent> {
        lock(&self.values).clone()
    }
}

impl ProgressSink for RecordingProgress {
    fn update(&self, percent: Percent) {
        lock(&self.values).push(percent);
    }
}

/// Event observed by [`RecordingPresenter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenterEvent {
    /// A job was created or changed state.
    State {
        /// Job identifier.
        id: JobId,
        /// State after the change.
        state: JobState,
    },
    /// A job left the batch.
    Removed(JobId),
}

/// [`JobPresenter`] that records lifecycle events and per-job progress.
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    events: Mutex<Vec<PresenterEvent>>,
    progress: Mutex<HashMap<JobId, Arc<RecordingProgress>>>,
}

impl RecordingPresenter {
    /// Empty recorder.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Events so far, in order.
    #[must_use]
    pub fn events(&self) -> Vec<PresenterEvent> {
        lock(&self.events).clone()
    }

    /// States recorded for `id`, in order.
    #[must_use]
    pub fn states_of(&self, id: JobId) -> Vec<JobState> {
        lock(&self.events)
            .iter()
            .filter_map(|event| match event {
                PresenterEvent::State { id: seen, state } if *seen == id => Some(state.clone()),
                _ => None,
            })
            .collect()
    }

    /// Progress forwarded to `id`'s sink.
    #[must_use]
    pub fn progress_of(&self, id: JobId) -> Vec<Percent> {
        lock(&self.progress)
            .get(&id)
            .map(|recorder| recorder.values())
            .unwrap_or_default()
    }
}

impl JobPresenter for RecordingPresenter {
    fn progress_sink(&self, job: &UploadJob) -> Arc<dyn ProgressSink> {
        let mut progress = lock(&self.progress);
        let recorder = progress.entry(job.id).or_insert_with(RecordingProgress::new);
        Arc::clone(recorder) as Arc<dyn ProgressSink>
    }

    fn state_changed(&self, job: &UploadJob) {
        lock(&self.events).push(PresenterEvent::State {
            id: job.id,
            state: job.state().clone(),
        });
    }

    fn removed(&self, id: JobId) {
        lock(&self.events).push(PresenterEvent::Removed(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{payload, timeout_ms};

    #[tokio::test]
    async fn scripted_upload_times_out_when_delay_exceeds_deadline() {
        let transfer = ScriptedTransfer::new();
        transfer.push_upload(ScriptedUpload::ok("late").delayed(Duration::from_millis(200)));
        let progress = RecordingProgress::new();

        let outcome = transfer
            .upload(&payload("a.txt", b"abc"), progress.clone(), timeout_ms(20))
            .await;

        assert!(outcome.is_timed_out());
        assert_eq!(transfer.uploaded_names(), ["a.txt"]);
    }

    #[tokio::test]
    async fn scripted_prompt_falls_back_to_default() {
        let prompt = ScriptedPrompt::answers(&[true]);
        assert!(prompt.confirm("t", "m").await);
        assert!(!prompt.confirm("t", "m").await);
        assert_eq!(prompt.asked().len(), 2);
    }
}
