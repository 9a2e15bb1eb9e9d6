//! Command handlers grouped by concern.

pub(crate) mod files;
pub(crate) mod preview;
pub(crate) mod upload;

#[cfg(test)]
pub(crate) mod test_support;
