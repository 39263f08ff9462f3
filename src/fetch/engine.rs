//! Batch orchestration for fetching every manifest item.
//!
//! [`FetchEngine`] schedules one fetch per identifier through a bounded
//! `buffer_unordered` window and reports each result as soon as it finishes,
//! so progress follows completion order rather than manifest order.
//!
//! # Example
//!
//! ```no_run
//! use addon_fetch::{FetchConfig, FetchEngine, HttpClient, Manifest, ResolverKind, build_resolver};
//! use std::path::PathBuf;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manifest = Manifest::load(std::path::Path::new("manifest.json"))?;
//! let client = HttpClient::new();
//! let resolver = build_resolver(ResolverKind::Addon, client.clone(), None, None)?;
//! let engine = FetchEngine::new(resolver, client, FetchConfig::new(PathBuf::from("mods")))?;
//! let summary = engine
//!     .run_batch(&manifest.files, |progress| println!("{progress}"))
//!     .await?;
//! println!("downloaded {}, cached {}", summary.downloaded, summary.cached);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use futures_util::stream::{self, Stream, StreamExt};
use tracing::{debug, info, instrument, warn};

use super::constants::{DEFAULT_CONCURRENCY, MAX_CONCURRENCY, MIN_CONCURRENCY};
use super::error::FetchError;
use super::item::{ClaimedNames, FetchResult, fetch_item};
use super::HttpClient;
use crate::manifest::FileIdentifier;
use crate::resolver::MetadataResolver;

/// Error type for batch operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid concurrency value provided.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },

    /// An item failed and the batch was aborted.
    #[error("failed to fetch {identifier}: {source}")]
    ItemFailed {
        /// The entry that failed.
        identifier: FileIdentifier,
        /// Why it failed.
        #[source]
        source: FetchError,
    },
}

/// What to do when one item fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop the batch at the first failure and surface it.
    #[default]
    AbortOnFirst,
    /// Keep going and report every failure in the summary.
    CollectAll,
}

/// Settings for one batch run.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Directory that receives the files.
    pub output_dir: PathBuf,
    /// Re-download even when a local file has the right size.
    pub cache_disabled: bool,
    /// Maximum number of items in flight (1-100).
    pub concurrency: usize,
    /// Reaction to a failed item.
    pub failure_policy: FailurePolicy,
}

impl FetchConfig {
    /// Creates a config with caching on, default concurrency, and abort-on-first.
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            cache_disabled: false,
            concurrency: DEFAULT_CONCURRENCY,
            failure_policy: FailurePolicy::default(),
        }
    }

    /// Sets whether the size cache is bypassed.
    #[must_use]
    pub fn with_cache_disabled(mut self, cache_disabled: bool) -> Self {
        self.cache_disabled = cache_disabled;
        self
    }

    /// Sets the concurrency limit.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Sets the failure policy.
    #[must_use]
    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }
}

/// One finished item, numbered in completion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchProgress {
    /// 1-based position in completion order.
    pub completed: usize,
    /// Number of items in the batch.
    pub total: usize,
    /// The item's result.
    pub result: FetchResult,
}

impl fmt::Display for BatchProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}/{}] {} ({}B{})",
            self.completed,
            self.total,
            self.result.display_name,
            self.result.file_length,
            if self.result.used_cache { " cached" } else { "" }
        )
    }
}

/// A failed item, numbered in completion order.
#[derive(Debug)]
pub struct ItemFailure {
    /// 1-based position in completion order.
    pub completed: usize,
    /// The entry that failed.
    pub identifier: FileIdentifier,
    /// Why it failed.
    pub error: FetchError,
}

/// Totals for a batch that ran to the end.
#[derive(Debug, Default)]
pub struct BatchSummary {
    /// Number of items in the batch.
    pub total: usize,
    /// Items fetched over the network.
    pub downloaded: usize,
    /// Items served from existing files.
    pub cached: usize,
    /// Bytes written by downloads.
    pub bytes_downloaded: u64,
    /// Failed items (only populated under [`FailurePolicy::CollectAll`]).
    pub failures: Vec<ItemFailure>,
}

impl BatchSummary {
    fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    fn record(&mut self, result: &FetchResult) {
        if result.used_cache {
            self.cached += 1;
        } else {
            self.downloaded += 1;
            self.bytes_downloaded += result.file_length;
        }
    }

    /// Returns the number of items that finished successfully.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.downloaded + self.cached
    }

    /// Returns the number of failed items.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Returns true when no item failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Fetches manifest items concurrently through one metadata resolver and one
/// shared HTTP client.
///
/// # Concurrency Model
///
/// - Items run as futures inside a single `buffer_unordered` stream, so they
///   interleave only at I/O suspension points
/// - At most `concurrency` items are in flight; new ones start as others finish
/// - Results surface in completion order
/// - Dropping the stream cancels whatever is still in flight
///
/// # Duplicate File Names
///
/// Within one batch, the first item to resolve a file name claims it; a later
/// item resolving to the same name fails with
/// [`FetchError::DuplicateFileName`] instead of racing on the same path.
pub struct FetchEngine {
    resolver: Box<dyn MetadataResolver>,
    client: HttpClient,
    config: FetchConfig,
}

impl fmt::Debug for FetchEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchEngine")
            .field("resolver", &self.resolver.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl FetchEngine {
    /// Creates a new engine.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConcurrency`] if `config.concurrency` is
    /// outside 1-100.
    #[instrument(level = "debug", skip(resolver, client), fields(resolver = resolver.name()))]
    pub fn new(
        resolver: Box<dyn MetadataResolver>,
        client: HttpClient,
        config: FetchConfig,
    ) -> Result<Self, EngineError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&config.concurrency) {
            return Err(EngineError::InvalidConcurrency {
                value: config.concurrency,
            });
        }

        debug!(
            concurrency = config.concurrency,
            cache_disabled = config.cache_disabled,
            policy = ?config.failure_policy,
            "creating fetch engine"
        );

        Ok(Self {
            resolver,
            client,
            config,
        })
    }

    /// Fetches a single item outside of any batch.
    ///
    /// # Errors
    ///
    /// See [`fetch_one`](super::fetch_one).
    pub async fn fetch_one(&self, identifier: &FileIdentifier) -> Result<FetchResult, FetchError> {
        fetch_item(
            self.resolver.as_ref(),
            &self.client,
            identifier,
            &self.config.output_dir,
            self.config.cache_disabled,
            None,
        )
        .await
    }

    /// Returns a lazy stream of per-item outcomes in completion order.
    ///
    /// Nothing happens until the stream is polled. Each item, success or
    /// failure, takes the next `completed` number.
    pub fn stream_batch<'a>(
        &'a self,
        identifiers: &'a [FileIdentifier],
    ) -> impl Stream<Item = Result<BatchProgress, ItemFailure>> + 'a {
        let total = identifiers.len();
        let claimed = Arc::new(ClaimedNames::new());
        let mut completed = 0usize;

        stream::iter(identifiers.iter().copied())
            .map(move |identifier| {
                let claimed = Arc::clone(&claimed);
                async move {
                    let outcome = fetch_item(
                        self.resolver.as_ref(),
                        &self.client,
                        &identifier,
                        &self.config.output_dir,
                        self.config.cache_disabled,
                        Some(claimed.as_ref()),
                    )
                    .await;
                    (identifier, outcome)
                }
            })
            .buffer_unordered(self.config.concurrency)
            .map(move |(identifier, outcome)| {
                completed += 1;
                match outcome {
                    Ok(result) => Ok(BatchProgress {
                        completed,
                        total,
                        result,
                    }),
                    Err(error) => Err(ItemFailure {
                        completed,
                        identifier,
                        error,
                    }),
                }
            })
    }

    /// Runs the whole batch, calling `on_progress` for each finished item.
    ///
    /// # Errors
    ///
    /// Under [`FailurePolicy::AbortOnFirst`], returns
    /// [`EngineError::ItemFailed`] for the first failed item; items still in
    /// flight are cancelled and files already written stay on disk. Under
    /// [`FailurePolicy::CollectAll`] this never fails; check
    /// [`BatchSummary::is_success`].
    #[instrument(skip(self, identifiers, on_progress), fields(total = identifiers.len(), output_dir = %self.config.output_dir.display()))]
    pub async fn run_batch<F>(
        &self,
        identifiers: &[FileIdentifier],
        mut on_progress: F,
    ) -> Result<BatchSummary, EngineError>
    where
        F: FnMut(&BatchProgress),
    {
        let mut summary = BatchSummary::new(identifiers.len());
        info!(
            concurrency = self.config.concurrency,
            "starting batch"
        );

        let mut events = std::pin::pin!(self.stream_batch(identifiers));
        while let Some(event) = events.next().await {
            match event {
                Ok(progress) => {
                    summary.record(&progress.result);
                    on_progress(&progress);
                }
                Err(failure) => match self.config.failure_policy {
                    FailurePolicy::AbortOnFirst => {
                        warn!(
                            identifier = %failure.identifier,
                            category = %failure.error.category(),
                            error = %failure.error,
                            "item failed, aborting batch"
                        );
                        return Err(EngineError::ItemFailed {
                            identifier: failure.identifier,
                            source: failure.error,
                        });
                    }
                    FailurePolicy::CollectAll => {
                        warn!(
                            identifier = %failure.identifier,
                            category = %failure.error.category(),
                            error = %failure.error,
                            "item failed, continuing"
                        );
                        summary.failures.push(failure);
                    }
                },
            }
        }

        info!(
            downloaded = summary.downloaded,
            cached = summary.cached,
            failed = summary.failed(),
            bytes = summary.bytes_downloaded,
            total = summary.total,
            "batch complete"
        );
        Ok(summary)
    }
}
