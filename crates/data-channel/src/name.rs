use std::path::{Component, Path};

use crate::error::TransferError;

/// Validates that `name` is a single bare file name.
///
/// Both peers join received names onto a local directory, so both check.
///
/// Rejects:
/// - Empty names, `.` and `..`
/// - Anything containing a path separator
/// - Absolute paths and Windows prefixes (`C:`, `\\server`)
pub fn validate_file_name(name: &str) -> Result<(), TransferError> {
    if name.is_empty() {
        return Err(TransferError::InvalidName("empty name".into()));
    }

    if name.contains(['/', '\\']) {
        return Err(TransferError::InvalidName(format!(
            "path separators not allowed: {name}"
        )));
    }

    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        (Some(Component::CurDir | Component::ParentDir), None) => Err(
            TransferError::InvalidName(format!("directory reference not allowed: {name}")),
        ),
        _ => Err(TransferError::InvalidName(format!(
            "not a bare file name: {name}"
        ))),
    }
}
