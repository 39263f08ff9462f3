//! Confinement of server-supplied file names to the output directory.

use std::path::{Component, Path, PathBuf};

use super::error::FetchError;

/// Joins `file_name` onto `output_dir`, rejecting names that could escape it.
///
/// The name must be a single plain path component: no separators of either
/// platform, no `.`/`..`, no NUL bytes, no root or drive prefix.
///
/// # Errors
///
/// Returns [`FetchError::UnsafeFileName`] describing the first violated rule.
pub fn confine_to_output_dir(output_dir: &Path, file_name: &str) -> Result<PathBuf, FetchError> {
    if file_name.is_empty() {
        return Err(FetchError::unsafe_file_name(file_name, "is empty"));
    }
    if file_name.contains('\0') {
        return Err(FetchError::unsafe_file_name(file_name, "contains a NUL byte"));
    }
    if file_name.contains(['/', '\\']) {
        return Err(FetchError::unsafe_file_name(
            file_name,
            "contains a path separator",
        ));
    }

    let mut components = Path::new(file_name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(output_dir.join(file_name)),
        (Some(Component::CurDir | Component::ParentDir), None) => Err(
            FetchError::unsafe_file_name(file_name, "is a relative directory reference"),
        ),
        _ => Err(FetchError::unsafe_file_name(
            file_name,
            "is not a single file name",
        )),
    }
}
