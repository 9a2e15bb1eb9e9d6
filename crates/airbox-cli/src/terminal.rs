//! Terminal implementations of the presentation collaborators.
//!
//! Everything here writes to stderr so stdout carries only command output.

use std::io::{self, BufRead, IsTerminal, Write};
use std::sync::Arc;

use airbox_transfer::{
    ConfirmationPrompt, JobPresenter, JobState, NotificationSink, Percent, ProgressSink,
    Severity, UploadJob,
};
use async_trait::async_trait;

use crate::output::format_bytes;

/// Prints notifications as `[SEVERITY] message`.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct TerminalNotifier;

impl NotificationSink for TerminalNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        eprintln!("{}", notification_line(message, severity));
    }
}

fn notification_line(message: &str, severity: Severity) -> String {
    format!("[{}] {message}", severity.as_str().to_ascii_uppercase())
}

/// Prints one line per job transition and progress step.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct TerminalPresenter;

impl JobPresenter for TerminalPresenter {
    fn progress_sink(&self, job: &UploadJob) -> Arc<dyn ProgressSink> {
        Arc::new(ProgressLine {
            label: job.file_name.as_str().to_string(),
        })
    }

    fn state_changed(&self, job: &UploadJob) {
        match job.state() {
            JobState::Pending => eprintln!(
                "queued {} ({})",
                job.file_name,
                format_bytes(job.size_bytes)
            ),
            JobState::InProgress { percent } if *percent == Percent::ZERO => {
                eprintln!("uploading {}", job.file_name);
            }
            JobState::InProgress { .. } | JobState::Succeeded { .. } | JobState::Failed { .. } => {}
        }
    }
}

struct ProgressLine {
    label: String,
}

impl ProgressSink for ProgressLine {
    fn update(&self, percent: Percent) {
        eprintln!("  {}: {percent}", self.label);
    }
}

/// Reads a yes/no answer from stdin; declines when stdin is not a terminal.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct StdinPrompt;

#[async_trait]
impl ConfirmationPrompt for StdinPrompt {
    async fn confirm(&self, title: &str, message: &str) -> bool {
        if !io::stdin().is_terminal() {
            tracing::warn!("stdin is not a terminal; declining confirmation (pass --yes to skip)");
            return false;
        }

        let question = format!("{title}: {message} [y/N] ");
        let answer = tokio::task::spawn_blocking(move || {
            let mut stderr = io::stderr();
            write!(stderr, "{question}").and_then(|()| stderr.flush())?;
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            Ok::<_, io::Error>(line)
        })
        .await;

        match answer {
            Ok(Ok(line)) => is_affirmative(&line),
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "failed to read confirmation");
                false
            }
            Err(err) => {
                tracing::warn!(error = %err, "confirmation task failed");
                false
            }
        }
    }
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_lines_carry_severity() {
        assert_eq!(
            notification_line("deleted", Severity::Success),
            "[SUCCESS] deleted"
        );
        assert_eq!(
            notification_line("No file selected!", Severity::Error),
            "[ERROR] No file selected!"
        );
    }

    #[test]
    fn only_explicit_yes_confirms() {
        assert!(is_affirmative("y\n"));
        assert!(is_affirmative(" YES "));
        assert!(!is_affirmative("\n"));
        assert!(!is_affirmative("no"));
        assert!(!is_affirmative("yep"));
    }
}
