// Filename checks applied before any path is joined onto the upload directory

use crate::types::{AppError, AppResult};

/// Accept only a single plain path component.
///
/// Rejects empty names, `.` and `..`, anything containing a path separator,
/// and control characters (NUL included). Everything else is used verbatim.
pub fn validate_filename(name: &str) -> AppResult<()> {
    if name.is_empty() {
        return Err(AppError::InvalidFilename("filename is empty".to_string()));
    }

    if name == "." || name == ".." {
        return Err(AppError::InvalidFilename(format!(
            "'{}' refers to a directory",
            name
        )));
    }

    if name.contains(['/', '\\']) {
        return Err(AppError::InvalidFilename(format!(
            "path separators are not allowed in '{}'",
            name
        )));
    }

    if name.chars().any(char::is_control) {
        return Err(AppError::InvalidFilename(
            "control characters are not allowed".to_string(),
        ));
    }

    // "C:name" is drive-relative on Windows
    #[cfg(windows)]
    if name.contains(':') {
        return Err(AppError::InvalidFilename(format!(
            "drive prefixes are not allowed in '{}'",
            name
        )));
    }

    Ok(())
}
