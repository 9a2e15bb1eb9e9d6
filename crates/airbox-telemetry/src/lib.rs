//! Logging setup shared by the airbox binaries.
//!
//! Library crates only emit `tracing` events; installing a subscriber and
//! entering the per-command span is left to the binary through
//! [`init_logging`] and [`command_span`].

mod context;
mod init;

pub use context::command_span;
pub use init::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, build_sha, init_logging};
