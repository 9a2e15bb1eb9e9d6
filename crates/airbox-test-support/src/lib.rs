#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls
)]
#![warn(missing_docs)]
#![allow(clippy::missing_panics_doc)]

//! Shared test helpers used across integration suites.
//! Layout: fixtures.rs (names, payloads, deadlines), mocks.rs (scripted collaborators), assert.rs (test assertions).

pub mod assert;
pub mod fixtures;
pub mod mocks;
