//! User-facing notifications.

use std::fmt::{self, Display, Formatter};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Notification severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Neutral information.
    Info,
    /// A user action completed.
    Success,
    /// A user action failed.
    Error,
}

impl Severity {
    /// Lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl Display for Severity {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Fire-and-forget consumer of status messages.
pub trait NotificationSink: Send + Sync {
    /// Surface `message` to the user.
    fn notify(&self, message: &str, severity: Severity);
}

/// A recorded notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Message text.
    pub message: String,
    /// Severity.
    pub severity: Severity,
    /// When the notification was raised.
    pub timestamp: DateTime<Utc>,
}

/// Sink that keeps every notification in memory.
#[derive(Debug, Default)]
pub struct NotificationLog {
    entries: Mutex<Vec<Notification>>,
}

impl NotificationLog {
    /// Empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all notifications in arrival order.
    #[must_use]
    pub fn all(&self) -> Vec<Notification> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Notifications with the given severity.
    #[must_use]
    pub fn with_severity(&self, severity: Severity) -> Vec<Notification> {
        self.all()
            .into_iter()
            .filter(|entry| entry.severity == severity)
            .collect()
    }

    /// Number of recorded notifications.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget every recorded notification.
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl NotificationSink for NotificationLog {
    fn notify(&self, message: &str, severity: Severity) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Notification {
                message: message.to_string(),
                severity,
                timestamp: Utc::now(),
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_records_and_clears() {
        let log = NotificationLog::new();
        assert!(log.is_empty());

        log.notify("Upload successful: stored", Severity::Success);
        log.notify("Upload failed: Bad Request", Severity::Error);

        let all = log.all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].message, "Upload successful: stored");
        assert!(all[0].timestamp <= all[1].timestamp);
        assert_eq!(log.with_severity(Severity::Error).len(), 1);

        log.clear();
        assert_eq!(log.len(), 0);
    }

    #[test]
    fn severity_serializes_lowercase() {
        let value = serde_json::to_value(Severity::Success).expect("serialize");
        assert_eq!(value, serde_json::json!("success"));
        assert_eq!(Severity::Error.to_string(), "error");
    }
}
