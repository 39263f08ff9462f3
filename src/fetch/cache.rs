//! Size-based cache predicate.
//!
//! A local file stands in for a fresh download when it is a regular file whose
//! byte size equals the declared length. Content is never hashed, so a
//! corrupted file of the right size counts as a hit.

use std::path::Path;

/// Returns true if the file at `path` can be reused instead of downloading.
///
/// Always false when `cache_disabled` is set.
#[must_use]
pub fn should_use_cache(path: &Path, expected_length: u64, cache_disabled: bool) -> bool {
    if cache_disabled {
        return false;
    }
    std::fs::metadata(path).is_ok_and(|meta| meta.is_file() && meta.len() == expected_length)
}

/// Async form of [`should_use_cache`] for use inside the fetch pipeline.
pub(crate) async fn should_use_cache_async(
    path: &Path,
    expected_length: u64,
    cache_disabled: bool,
) -> bool {
    if cache_disabled {
        return false;
    }
    tokio::fs::metadata(path)
        .await
        .is_ok_and(|meta| meta.is_file() && meta.len() == expected_length)
}
