//! Metadata resolution strategies.
//!
//! A [`MetadataResolver`] turns a [`FileIdentifier`] into the file name, size,
//! and download URL needed to fetch it. Two upstream schemes are supported and
//! selected at configuration time through [`ResolverKind`]:
//!
//! - [`AddonApiResolver`] - `GET {base}/addon/{project}/file/{file}`, flat response
//! - [`ModsApiResolver`] - `GET {base}/mods/{project}/files/{file}`, response nested
//!   under `data`, download URL derived from a template
//!
//! # Example
//!
//! ```no_run
//! use addon_fetch::{FileIdentifier, HttpClient, ResolverKind, build_resolver};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let resolver = build_resolver(ResolverKind::Addon, HttpClient::new(), None, None)?;
//! let metadata = resolver.resolve(&FileIdentifier::new(238222, 4712866)).await?;
//! println!("{} ({} bytes)", metadata.file_name, metadata.file_length);
//! # Ok(())
//! # }
//! ```

mod addon;
mod mods;

pub use addon::{AddonApiResolver, DEFAULT_ADDON_API_BASE};
pub use mods::{DEFAULT_MODS_API_BASE, ModsApiResolver};

use std::fmt;

use async_trait::async_trait;
use url::Url;

use crate::fetch::{FetchError, HttpClient};
use crate::manifest::FileIdentifier;

/// File metadata resolved for one identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    /// Name of the file as stored upstream; becomes the local file name.
    pub file_name: String,
    /// Declared size in bytes.
    pub file_length: u64,
    /// Where to fetch the content from.
    pub download_url: String,
    /// Human-readable name, when the API provides one.
    pub display_name: Option<String>,
}

impl FileMetadata {
    /// Returns the display name, falling back to the file name.
    #[must_use]
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.file_name)
    }
}

/// Selects which metadata scheme to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolverKind {
    /// Flat `addon/{project}/file/{file}` responses.
    #[default]
    Addon,
    /// Nested `mods/{project}/files/{file}` responses.
    Mods,
}

impl ResolverKind {
    /// Returns the stable label for display output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Addon => "addon",
            Self::Mods => "mods",
        }
    }
}

impl fmt::Display for ResolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait that all metadata resolution strategies implement.
///
/// # Object Safety
///
/// This trait uses `async_trait` to support dynamic dispatch via
/// `Box<dyn MetadataResolver>`, since the strategy is chosen at runtime.
#[async_trait]
pub trait MetadataResolver: Send + Sync {
    /// Returns the strategy name (e.g., "addon", "mods").
    fn name(&self) -> &str;

    /// API key to attach to download requests, if the scheme uses one.
    fn api_key(&self) -> Option<&str> {
        None
    }

    /// Resolves one identifier to its file metadata.
    async fn resolve(&self, identifier: &FileIdentifier) -> Result<FileMetadata, FetchError>;
}

/// Builds the resolver for `kind`, sharing `client`.
///
/// `api_base` overrides the scheme's default base URL.
///
/// # Errors
///
/// Returns [`FetchError::InvalidUrl`] when `api_base` is not an absolute
/// http(s) URL.
pub fn build_resolver(
    kind: ResolverKind,
    client: HttpClient,
    api_base: Option<&str>,
    api_key: Option<String>,
) -> Result<Box<dyn MetadataResolver>, FetchError> {
    let resolver: Box<dyn MetadataResolver> = match kind {
        ResolverKind::Addon => {
            let base = normalize_api_base(api_base.unwrap_or(DEFAULT_ADDON_API_BASE))?;
            Box::new(AddonApiResolver::new(client, base))
        }
        ResolverKind::Mods => {
            let base = normalize_api_base(api_base.unwrap_or(DEFAULT_MODS_API_BASE))?;
            Box::new(ModsApiResolver::new(client, base, api_key))
        }
    };
    Ok(resolver)
}

/// Validates an API base URL and strips any trailing slash.
pub(crate) fn normalize_api_base(base: &str) -> Result<String, FetchError> {
    let parsed = Url::parse(base).map_err(|_| FetchError::invalid_url(base))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.cannot_be_a_base() {
        return Err(FetchError::invalid_url(base));
    }
    Ok(base.trim_end_matches('/').to_string())
}
