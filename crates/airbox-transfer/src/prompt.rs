//! Yes/no confirmation before destructive actions.

use async_trait::async_trait;

/// Asks the user to confirm an action.
///
/// Each call resolves exactly once; `false` means the user declined.
#[async_trait]
pub trait ConfirmationPrompt: Send + Sync {
    /// Present `title`/`message` and wait for a decision.
    async fn confirm(&self, title: &str, message: &str) -> bool;
}

/// Prompt that always confirms, for non-interactive `--yes` runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

#[async_trait]
impl ConfirmationPrompt for AssumeYes {
    async fn confirm(&self, _title: &str, _message: &str) -> bool {
        true
    }
}
