//! Resolver for the flat `addon/{project}/file/{file}` metadata scheme.
//!
//! The response carries everything at the top level, including a ready-made
//! `downloadUrl`.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{FileMetadata, MetadataResolver};
use crate::fetch::{FetchError, HttpClient};
use crate::manifest::FileIdentifier;

/// Default base URL for the addon scheme.
pub const DEFAULT_ADDON_API_BASE: &str = "https://addons-ecs.forgesvc.net/api/v2";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddonFileResponse {
    download_url: String,
    file_name: String,
    file_length: u64,
    #[serde(default)]
    display_name: Option<String>,
}

/// Resolves identifiers through `GET {base}/addon/{project}/file/{file}`.
#[derive(Debug, Clone)]
pub struct AddonApiResolver {
    client: HttpClient,
    base: String,
}

impl AddonApiResolver {
    /// Creates a resolver against `base` (no trailing slash).
    #[must_use]
    pub fn new(client: HttpClient, base: impl Into<String>) -> Self {
        Self {
            client,
            base: base.into(),
        }
    }

    /// Builds the metadata URL for `identifier`.
    #[must_use]
    pub fn metadata_url(&self, identifier: &FileIdentifier) -> String {
        format!(
            "{}/addon/{}/file/{}",
            self.base, identifier.project_id, identifier.file_id
        )
    }
}

#[async_trait]
impl MetadataResolver for AddonApiResolver {
    fn name(&self) -> &'static str {
        "addon"
    }

    #[tracing::instrument(skip(self), fields(resolver = "addon", identifier = %identifier))]
    async fn resolve(&self, identifier: &FileIdentifier) -> Result<FileMetadata, FetchError> {
        let url = self.metadata_url(identifier);
        let response: AddonFileResponse = self.client.get_json(&url, None).await?;
        debug!(file_name = %response.file_name, file_length = response.file_length, "metadata resolved");

        Ok(FileMetadata {
            file_name: response.file_name,
            file_length: response.file_length,
            download_url: response.download_url,
            display_name: response.display_name,
        })
    }
}
