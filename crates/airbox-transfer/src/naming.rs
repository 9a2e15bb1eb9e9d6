//! Upload naming rules.

use crate::error::TransferResult;
use crate::model::FileName;

/// Final name for an upload of `original`, optionally renamed to `override_base`.
///
/// A blank override keeps the original name. Otherwise the original extension
/// is appended to the trimmed override, or the override is used alone when
/// the original has no extension.
///
/// # Errors
///
/// Returns [`crate::TransferError::InvalidFileName`] when the combined name is
/// not a valid [`FileName`].
pub fn upload_name(original: &FileName, override_base: Option<&str>) -> TransferResult<FileName> {
    let Some(base) = override_base.map(str::trim).filter(|base| !base.is_empty()) else {
        return Ok(original.clone());
    };
    match original.extension() {
        Some(extension) => FileName::new(format!("{base}.{extension}")),
        None => FileName::new(base),
    }
}

/// Base name offered when prompting for a rename.
#[must_use]
pub fn suggested_base(original: &FileName) -> &str {
    original.stem()
}
