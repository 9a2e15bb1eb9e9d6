//! Upload job state machine.
//!
//! Jobs move forward only: `Pending -> InProgress -> Succeeded | Failed`, with
//! `Pending` allowed to jump straight to a terminal state. Progress never
//! decreases while a job is in flight.

use std::fmt::{self, Display, Formatter};

use serde::Serialize;

use crate::error::{TransferError, TransferResult};
use crate::model::FileName;
use crate::outcome::FailureKind;
use crate::progress::Percent;

/// Identifier of a job within the coordinator that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct JobId(u64);

impl JobId {
    /// Wrap a raw identifier.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw identifier.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl Display for JobId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "#{}", self.0)
    }
}

/// Why a job failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum JobFailure {
    /// The upload deadline elapsed.
    TimedOut,
    /// The request failed or the server rejected it.
    Rejected {
        /// Failure classification.
        kind: FailureKind,
        /// Human-readable detail.
        detail: String,
    },
}

impl JobFailure {
    /// Human-readable reason.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::TimedOut => "upload timed out".to_string(),
            Self::Rejected { detail, .. } => detail.clone(),
        }
    }
}

/// Lifecycle state of an upload job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobState {
    /// Selected, not yet submitted.
    Pending,
    /// Request in flight.
    InProgress {
        /// Latest reported progress.
        percent: Percent,
    },
    /// Server accepted the file.
    Succeeded {
        /// Server message.
        message: String,
    },
    /// The upload did not succeed.
    Failed {
        /// Failure reason.
        failure: JobFailure,
    },
}

impl JobState {
    /// Short label used in logs and errors.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress { .. } => "in_progress",
            Self::Succeeded { .. } => "succeeded",
            Self::Failed { .. } => "failed",
        }
    }

    /// Whether no further transitions are allowed.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded { .. } | Self::Failed { .. })
    }
}

/// One file in the current upload batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadJob {
    /// Job identifier.
    pub id: JobId,
    /// Name the file is uploaded under.
    pub file_name: FileName,
    /// Name of the file as selected.
    pub original_name: FileName,
    /// Payload size.
    pub size_bytes: u64,
    state: JobState,
}

impl UploadJob {
    /// Create a pending job.
    #[must_use]
    pub const fn new(id: JobId, file_name: FileName, original_name: FileName, size_bytes: u64) -> Self {
        Self {
            id,
            file_name,
            original_name,
            size_bytes,
            state: JobState::Pending,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &JobState {
        &self.state
    }

    /// Whether the job reached `Succeeded` or `Failed`.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Move `Pending` to `InProgress` at 0%.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::InvalidTransition`] unless the job is pending.
    pub fn start(&mut self) -> TransferResult<()> {
        match self.state {
            JobState::Pending => {
                self.state = JobState::InProgress {
                    percent: Percent::ZERO,
                };
                Ok(())
            }
            _ => Err(self.invalid("in_progress")),
        }
    }

    /// Record progress; returns whether the visible percentage advanced.
    ///
    /// Lower or equal values are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::InvalidTransition`] unless the job is in progress.
    pub fn record_progress(&mut self, percent: Percent) -> TransferResult<bool> {
        match &mut self.state {
            JobState::InProgress { percent: current } => {
                if percent > *current {
                    *current = percent;
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            _ => Err(self.invalid("in_progress")),
        }
    }

    /// Mark the job as accepted by the server.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::InvalidTransition`] from a terminal state.
    pub fn succeed(&mut self, message: impl Into<String>) -> TransferResult<()> {
        if self.is_terminal() {
            return Err(self.invalid("succeeded"));
        }
        self.state = JobState::Succeeded {
            message: message.into(),
        };
        Ok(())
    }

    /// Mark the job as failed.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::InvalidTransition`] from a terminal state.
    pub fn fail(&mut self, failure: JobFailure) -> TransferResult<()> {
        if self.is_terminal() {
            return Err(self.invalid("failed"));
        }
        self.state = JobState::Failed { failure };
        Ok(())
    }

    const fn invalid(&self, to: &'static str) -> TransferError {
        TransferError::InvalidTransition {
            job_id: self.id,
            from: self.state.label(),
            to,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> UploadJob {
        let name = FileName::new("photo.png").expect("name");
        UploadJob::new(JobId::new(1), name.clone(), name, 42)
    }

    #[test]
    fn progress_only_moves_forward() {
        let mut job = job();
        job.start().expect("start");
        assert!(job.record_progress(Percent::new(40)).expect("progress"));
        assert!(!job.record_progress(Percent::new(10)).expect("progress"));
        assert!(!job.record_progress(Percent::new(40)).expect("progress"));
        assert_eq!(
            job.state(),
            &JobState::InProgress {
                percent: Percent::new(40)
            }
        );
    }

    #[test]
    fn terminal_states_reject_transitions() {
        let mut job = job();
        job.start().expect("start");
        job.succeed("ok").expect("succeed");

        assert!(matches!(
            job.fail(JobFailure::TimedOut),
            Err(TransferError::InvalidTransition {
                from: "succeeded",
                to: "failed",
                ..
            })
        ));
        assert!(job.start().is_err());
        assert!(job.record_progress(Percent::COMPLETE).is_err());
        assert_eq!(
            job.state(),
            &JobState::Succeeded {
                message: "ok".into()
            }
        );
    }

    #[test]
    fn pending_job_can_fail_directly() {
        let mut job = job();
        assert!(job.record_progress(Percent::new(5)).is_err());
        job.fail(JobFailure::Rejected {
            kind: FailureKind::Network,
            detail: "connection refused".into(),
        })
        .expect("fail");
        assert!(job.is_terminal());
    }

    #[test]
    fn state_serialises_with_tag() {
        let value = serde_json::to_value(JobState::Failed {
            failure: JobFailure::TimedOut,
        })
        .expect("serialise");
        assert_eq!(value["state"], "failed");
        assert_eq!(value["failure"]["reason"], "timed_out");
    }
}
