//! Resolver for the nested `mods/{project}/files/{file}` metadata scheme.
//!
//! Responses wrap the file record in a `data` object and carry no usable
//! download URL; content is fetched from `{base}/mods/{project}/files/{file}/download`.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{FileMetadata, MetadataResolver};
use crate::fetch::{FetchError, HttpClient};
use crate::manifest::FileIdentifier;

/// Default base URL for the mods scheme.
pub const DEFAULT_MODS_API_BASE: &str = "https://api.curseforge.com/v1";

#[derive(Debug, Deserialize)]
struct ModsFileEnvelope {
    data: ModsFile,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModsFile {
    file_name: String,
    file_length: u64,
    #[serde(default)]
    display_name: Option<String>,
}

/// Resolves identifiers through `GET {base}/mods/{project}/files/{file}`.
#[derive(Debug, Clone)]
pub struct ModsApiResolver {
    client: HttpClient,
    base: String,
    api_key: Option<String>,
}

impl ModsApiResolver {
    /// Creates a resolver against `base` (no trailing slash).
    #[must_use]
    pub fn new(client: HttpClient, base: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            base: base.into(),
            api_key,
        }
    }

    /// Builds the metadata URL for `identifier`.
    #[must_use]
    pub fn metadata_url(&self, identifier: &FileIdentifier) -> String {
        format!(
            "{}/mods/{}/files/{}",
            self.base, identifier.project_id, identifier.file_id
        )
    }

    /// Builds the download URL for `identifier`.
    #[must_use]
    pub fn download_url(&self, identifier: &FileIdentifier) -> String {
        format!("{}/download", self.metadata_url(identifier))
    }
}

#[async_trait]
impl MetadataResolver for ModsApiResolver {
    fn name(&self) -> &'static str {
        "mods"
    }

    fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    #[tracing::instrument(skip(self), fields(resolver = "mods", identifier = %identifier))]
    async fn resolve(&self, identifier: &FileIdentifier) -> Result<FileMetadata, FetchError> {
        let url = self.metadata_url(identifier);
        let envelope: ModsFileEnvelope = self.client.get_json(&url, self.api_key()).await?;
        let file = envelope.data;
        debug!(file_name = %file.file_name, file_length = file.file_length, "metadata resolved");

        Ok(FileMetadata {
            file_name: file.file_name,
            file_length: file.file_length,
            download_url: self.download_url(identifier),
            display_name: file.display_name,
        })
    }
}
