//! Constants for the fetch module (timeouts, concurrency bounds).

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes for large files).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Minimum allowed concurrency value.
pub const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
pub const MAX_CONCURRENCY: usize = 100;

/// Default number of items fetched at the same time.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Upper bound on the buffer reserved before a download body arrives (8 MiB).
pub const MAX_PREALLOC_BYTES: u64 = 8 * 1024 * 1024;
