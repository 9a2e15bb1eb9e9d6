//! Builders for common test inputs.

use airbox_transfer::{FileName, FilePayload, RemoteFileEntry, Timeouts, TransferTimeout};

/// Valid file name; panics on invalid input.
#[must_use]
pub fn file_name(raw: &str) -> FileName {
    FileName::new(raw).unwrap_or_else(|err| panic!("invalid fixture name '{raw}': {err:?}"))
}

/// Payload named `name` holding `bytes`.
#[must_use]
pub fn payload(name: &str, bytes: &[u8]) -> FilePayload {
    FilePayload::new(file_name(name), bytes.to_vec())
}

/// Deadline of `millis` milliseconds.
#[must_use]
pub fn timeout_ms(millis: u64) -> TransferTimeout {
    TransferTimeout::from_millis(millis)
        .unwrap_or_else(|err| panic!("invalid fixture timeout {millis}: {err:?}"))
}

/// Every operation deadline set to `millis`.
#[must_use]
pub fn timeouts(millis: u64) -> Timeouts {
    Timeouts {
        upload: timeout_ms(millis),
        list: timeout_ms(millis),
        delete: timeout_ms(millis),
        download: timeout_ms(millis),
    }
}

/// Listing rows for `names`, in order.
#[must_use]
pub fn entries(names: &[&str]) -> Vec<RemoteFileEntry> {
    names
        .iter()
        .map(|name| RemoteFileEntry::new(file_name(name)))
        .collect()
}
