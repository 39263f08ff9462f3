//! HTTP client wrapper shared by metadata resolvers and downloads.
//!
//! One [`HttpClient`] is created per run and cloned into every consumer; the
//! clones share reqwest's connection pool.

use std::time::Duration;

use futures_util::StreamExt;
use reqwest::{Client, ClientBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::constants::{CONNECT_TIMEOUT_SECS, MAX_PREALLOC_BYTES, READ_TIMEOUT_SECS};
use super::error::FetchError;
use crate::user_agent;

/// Header carrying the API key for APIs that require one.
pub const API_KEY_HEADER: &str = "x-api-key";

/// HTTP client for metadata lookups and file downloads.
///
/// This client is designed to be created once and reused for every item in a
/// batch, taking advantage of connection pooling.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a new HTTP client with default timeouts.
    ///
    /// Default configuration:
    /// - Connect timeout: 30 seconds
    /// - Read timeout: 5 minutes (for large files)
    /// - Gzip decompression: enabled
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    pub fn new() -> Self {
        Self::new_with_timeouts(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a new HTTP client with explicit timeout values.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the supplied
    /// timeout configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new_with_timeouts(connect_timeout_secs: u64, read_timeout_secs: u64) -> Self {
        let client = base_client_builder(connect_timeout_secs, read_timeout_secs)
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self { client }
    }

    /// Fetches `url` and deserializes the JSON body into `T`.
    ///
    /// # Errors
    ///
    /// Returns a transport error ([`FetchError::Network`], [`FetchError::Timeout`],
    /// [`FetchError::HttpStatus`]) or [`FetchError::ApiSchema`] when the body is
    /// not JSON of the expected shape.
    #[instrument(skip(self, api_key), fields(url = %url))]
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        api_key: Option<&str>,
    ) -> Result<T, FetchError> {
        let response = self.send_get(url, api_key).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_transport(url, e))?;
        serde_json::from_slice(&body).map_err(|e| FetchError::api_schema(url, e.to_string()))
    }

    /// Downloads `url` fully into memory.
    ///
    /// Reading stops as soon as more than `limit` bytes have arrived, so an
    /// oversized body is never read in full. The initial buffer is capped at
    /// [`MAX_PREALLOC_BYTES`] whatever `limit` or `Content-Length` claim. Callers
    /// compare the returned length against the expected size.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the request or body read fails.
    #[instrument(skip(self, api_key), fields(url = %url))]
    pub async fn download_limited(
        &self,
        url: &str,
        api_key: Option<&str>,
        limit: u64,
    ) -> Result<Vec<u8>, FetchError> {
        let response = self.send_get(url, api_key).await?;
        let capacity = response
            .content_length()
            .unwrap_or(limit)
            .min(limit.saturating_add(1))
            .min(MAX_PREALLOC_BYTES);
        let mut body = Vec::with_capacity(usize::try_from(capacity).unwrap_or(0));
        let mut stream = response.bytes_stream();

        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result.map_err(|e| FetchError::from_transport(url, e))?;
            body.extend_from_slice(&chunk);
            if body.len() as u64 > limit {
                debug!(limit, received = body.len(), "body exceeds declared length");
                break;
            }
        }

        Ok(body)
    }

    async fn send_get(
        &self,
        url: &str,
        api_key: Option<&str>,
    ) -> Result<reqwest::Response, FetchError> {
        let mut request = self.client.get(url);
        if let Some(key) = api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::from_transport(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::http_status(url, status.as_u16()));
        }

        Ok(response)
    }
}

fn base_client_builder(connect_timeout_secs: u64, read_timeout_secs: u64) -> ClientBuilder {
    Client::builder()
        .connect_timeout(Duration::from_secs(connect_timeout_secs))
        .timeout(Duration::from_secs(read_timeout_secs))
        .gzip(true)
        .user_agent(user_agent::default_user_agent())
}
