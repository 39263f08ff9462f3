//! Fetching a single manifest item.
//!
//! Resolve metadata, confine the target path, consult the size cache, and on a
//! miss download the body, verify its length, and write it out.

use std::path::{Path, PathBuf};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{debug, info, instrument};
use url::Url;

use super::cache::should_use_cache_async;
use super::error::FetchError;
use super::path::confine_to_output_dir;
use super::HttpClient;
use crate::manifest::FileIdentifier;
use crate::resolver::MetadataResolver;

/// Outcome of fetching one manifest item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    /// The manifest entry this result belongs to.
    pub identifier: FileIdentifier,
    /// Display name, or the file name when the API has none.
    pub display_name: String,
    /// Declared (and, on download, verified) size in bytes.
    pub file_length: u64,
    /// True when an existing local file was reused.
    pub used_cache: bool,
    /// Where the file lives on disk.
    pub path: PathBuf,
}

/// Names already taken within one batch, mapped to the entry that took them.
pub(crate) type ClaimedNames = DashMap<String, FileIdentifier>;

/// Fetches one item into `output_dir`.
///
/// Issues one metadata request, plus one download request on a cache miss.
///
/// # Errors
///
/// Returns [`FetchError::ApiSchema`] or a transport error from metadata
/// resolution, [`FetchError::UnsafeFileName`] for names that would escape
/// `output_dir`, [`FetchError::Integrity`] when the body length differs from
/// the declared length (nothing is written in that case), and
/// [`FetchError::Io`] when the file cannot be written.
pub async fn fetch_one(
    resolver: &dyn MetadataResolver,
    client: &HttpClient,
    identifier: &FileIdentifier,
    output_dir: &Path,
    cache_disabled: bool,
) -> Result<FetchResult, FetchError> {
    fetch_item(resolver, client, identifier, output_dir, cache_disabled, None).await
}

#[instrument(
    skip(resolver, client, output_dir, claimed),
    fields(identifier = %identifier, resolver = resolver.name())
)]
pub(crate) async fn fetch_item(
    resolver: &dyn MetadataResolver,
    client: &HttpClient,
    identifier: &FileIdentifier,
    output_dir: &Path,
    cache_disabled: bool,
    claimed: Option<&ClaimedNames>,
) -> Result<FetchResult, FetchError> {
    let metadata = resolver.resolve(identifier).await?;
    let path = confine_to_output_dir(output_dir, &metadata.file_name)?;

    if let Some(claimed) = claimed {
        claim_file_name(claimed, &metadata.file_name, identifier)?;
    }

    let used_cache =
        should_use_cache_async(&path, metadata.file_length, cache_disabled).await;

    if used_cache {
        debug!(path = %path.display(), bytes = metadata.file_length, "cache hit, skipping download");
    } else {
        Url::parse(&metadata.download_url)
            .map_err(|_| FetchError::invalid_url(metadata.download_url.clone()))?;

        let body = client
            .download_limited(&metadata.download_url, resolver.api_key(), metadata.file_length)
            .await?;
        let received = body.len() as u64;
        if received != metadata.file_length {
            return Err(FetchError::integrity(
                path,
                metadata.file_length,
                received,
            ));
        }

        tokio::fs::write(&path, &body)
            .await
            .map_err(|e| FetchError::io(path.clone(), e))?;
        info!(path = %path.display(), bytes = received, "file downloaded");
    }

    Ok(FetchResult {
        identifier: *identifier,
        display_name: metadata.label().to_string(),
        file_length: metadata.file_length,
        used_cache,
        path,
    })
}

fn claim_file_name(
    claimed: &ClaimedNames,
    file_name: &str,
    identifier: &FileIdentifier,
) -> Result<(), FetchError> {
    match claimed.entry(file_name.to_string()) {
        Entry::Occupied(owner) => Err(FetchError::duplicate_file_name(
            file_name,
            identifier,
            owner.get(),
        )),
        Entry::Vacant(slot) => {
            slot.insert(*identifier);
            Ok(())
        }
    }
}
