//! Normalised result of a transfer.
//!
//! Every operation resolves to exactly one [`TransferOutcome`]; callers never
//! observe raw transport errors.

use std::fmt::{self, Display, Formatter};

use serde::Serialize;

/// Terminal result of one request.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome<T> {
    /// The server accepted the request.
    Success(T),
    /// The request failed for a reason other than the deadline.
    Failure(TransferFailure),
    /// The deadline elapsed and the in-flight request was aborted.
    TimedOut,
}

impl<T> TransferOutcome<T> {
    /// Shorthand for a [`TransferOutcome::Failure`].
    pub fn failure(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self::Failure(TransferFailure::new(kind, detail))
    }

    /// Whether the request succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Whether the deadline elapsed.
    #[must_use]
    pub const fn is_timed_out(&self) -> bool {
        matches!(self, Self::TimedOut)
    }

    /// Borrow the success payload.
    #[must_use]
    pub const fn as_success(&self) -> Option<&T> {
        match self {
            Self::Success(value) => Some(value),
            _ => None,
        }
    }

    /// Consume and return the success payload.
    #[must_use]
    pub fn into_success(self) -> Option<T> {
        match self {
            Self::Success(value) => Some(value),
            _ => None,
        }
    }

    /// Map the success payload, keeping failures and timeouts.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> TransferOutcome<U> {
        match self {
            Self::Success(value) => TransferOutcome::Success(f(value)),
            Self::Failure(failure) => TransferOutcome::Failure(failure),
            Self::TimedOut => TransferOutcome::TimedOut,
        }
    }
}

impl<T> From<Result<T, TransferFailure>> for TransferOutcome<T> {
    fn from(result: Result<T, TransferFailure>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(failure) => Self::Failure(failure),
        }
    }
}

/// Classified failure with a human-readable detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferFailure {
    /// Failure class.
    pub kind: FailureKind,
    /// Detail surfaced to the user.
    pub detail: String,
}

impl TransferFailure {
    /// Build a failure.
    pub fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

impl Display for TransferFailure {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.detail)
    }
}

/// Failure classes surfaced by the transfer layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FailureKind {
    /// The request was rejected locally before it was sent.
    Input,
    /// The request never reached the server or no response came back.
    Network,
    /// The server answered with a non-success status.
    Http {
        /// HTTP status code.
        status: u16,
    },
    /// The server answered with a body that could not be decoded.
    InvalidResponse,
    /// Local IO failed while saving a download.
    Io,
}

impl FailureKind {
    /// Stable label used in logs and JSON output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Network => "network",
            Self::Http { .. } => "http",
            Self::InvalidResponse => "invalid_response",
            Self::Io => "io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_preserves_non_success_variants() {
        let ok: TransferOutcome<u8> = TransferOutcome::Success(2);
        assert_eq!(ok.map(|value| value * 2), TransferOutcome::Success(4));

        let failed: TransferOutcome<u8> =
            TransferOutcome::failure(FailureKind::Http { status: 500 }, "Internal Server Error");
        assert_eq!(
            failed.clone().map(u16::from),
            TransferOutcome::failure(FailureKind::Http { status: 500 }, "Internal Server Error")
        );
        assert!(!failed.is_success());

        let timed_out: TransferOutcome<u8> = TransferOutcome::TimedOut;
        assert!(timed_out.map(u16::from).is_timed_out());
    }

    #[test]
    fn result_conversion_maps_to_outcome() {
        let outcome: TransferOutcome<&str> = Ok("done").into();
        assert_eq!(outcome.as_success(), Some(&"done"));
        let outcome: TransferOutcome<&str> =
            Err(TransferFailure::new(FailureKind::Network, "refused")).into();
        assert_eq!(outcome.into_success(), None);
    }
}
