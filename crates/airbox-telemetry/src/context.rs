//! Root span for a single command invocation.
//!
//! # Design
//! - Every event emitted while a command runs carries the build SHA, the
//!   command name, and the request identifier sent to the server.

use tracing::Span;

use crate::init::build_sha;

/// Span wrapping one command; instrument the command future with it.
#[must_use]
pub fn command_span(command: &str, request_id: &str) -> Span {
    tracing::info_span!("airbox", command, request_id, build_sha = %build_sha())
}
