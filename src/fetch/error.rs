//! Error types for the fetch pipeline.
//!
//! Every variant carries the URL, path, or file name it concerns so a single
//! line on stderr is enough to tell which manifest entry broke the run.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while fetching one manifest item.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error requesting {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout requesting {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// HTTP error response (4xx client errors, 5xx server errors).
    #[error("HTTP {status} requesting {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// Metadata response is not JSON or lacks a required field.
    #[error("unexpected metadata from {url}: {reason}")]
    ApiSchema {
        /// The metadata URL.
        url: String,
        /// What was missing or malformed.
        reason: String,
    },

    /// Downloaded body length does not match the declared file length.
    #[error(
        "integrity check failed for {path}: expected {expected_bytes} bytes, got {actual_bytes}"
    )]
    Integrity {
        /// Target path that was not written.
        path: PathBuf,
        /// Declared size in bytes.
        expected_bytes: u64,
        /// Received size in bytes (may be a lower bound for oversized bodies).
        actual_bytes: u64,
    },

    /// Server-supplied file name would escape the output directory.
    #[error("refusing unsafe file name {name:?}: {reason}")]
    UnsafeFileName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Two manifest entries resolve to the same output file.
    #[error("file name {name:?} for {identifier} is already claimed by {claimed_by}")]
    DuplicateFileName {
        /// The contested file name.
        name: String,
        /// The entry that lost the claim.
        identifier: String,
        /// The entry that claimed the name first.
        claimed_by: String,
    },

    /// File system error writing the target.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A URL could not be parsed or built.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },
}

/// Coarse failure classes used in logs and summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureCategory {
    /// Metadata did not match the expected schema.
    ApiSchema,
    /// Transport failure or non-success status.
    Network,
    /// Length mismatch between declared and received content.
    Integrity,
    /// Unsafe or duplicate target file name.
    Path,
    /// Local filesystem failure.
    Io,
}

impl FailureCategory {
    /// Returns the stable label for display output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ApiSchema => "api-schema",
            Self::Network => "network",
            Self::Integrity => "integrity",
            Self::Path => "path",
            Self::Io => "io",
        }
    }
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FetchError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Maps a reqwest error to `Timeout` or `Network`.
    pub fn from_transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::timeout(url)
        } else {
            Self::network(url, source)
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a schema error for a metadata response.
    pub fn api_schema(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ApiSchema {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates an integrity mismatch error.
    pub fn integrity(path: impl Into<PathBuf>, expected_bytes: u64, actual_bytes: u64) -> Self {
        Self::Integrity {
            path: path.into(),
            expected_bytes,
            actual_bytes,
        }
    }

    /// Creates an unsafe file name error.
    pub fn unsafe_file_name(name: impl Into<String>, reason: &'static str) -> Self {
        Self::UnsafeFileName {
            name: name.into(),
            reason,
        }
    }

    /// Creates a duplicate file name error.
    pub fn duplicate_file_name(
        name: impl Into<String>,
        identifier: impl fmt::Display,
        claimed_by: impl fmt::Display,
    ) -> Self {
        Self::DuplicateFileName {
            name: name.into(),
            identifier: identifier.to_string(),
            claimed_by: claimed_by.to_string(),
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Classifies this error.
    #[must_use]
    pub fn category(&self) -> FailureCategory {
        match self {
            Self::ApiSchema { .. } => FailureCategory::ApiSchema,
            Self::Network { .. }
            | Self::Timeout { .. }
            | Self::HttpStatus { .. }
            | Self::InvalidUrl { .. } => FailureCategory::Network,
            Self::Integrity { .. } => FailureCategory::Integrity,
            Self::UnsafeFileName { .. } | Self::DuplicateFileName { .. } => FailureCategory::Path,
            Self::Io { .. } => FailureCategory::Io,
        }
    }
}

// No From<reqwest::Error> / From<std::io::Error>: every variant needs a url or
// path the source error does not carry.
