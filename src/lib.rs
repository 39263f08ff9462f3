//! Addon Fetch Core Library
//!
//! This library provides the core functionality for the addon-fetch tool,
//! which downloads every file listed in an addon manifest from a remote
//! addon-hosting API, reusing files already on disk when their size matches.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`manifest`] - Manifest loading and file identifiers
//! - [`resolver`] - Pluggable metadata resolution strategies
//! - [`fetch`] - Cache predicate, single-item fetch, and the batch pipeline

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod fetch;
pub mod manifest;
pub mod resolver;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use fetch::{
    BatchProgress, BatchSummary, DEFAULT_CONCURRENCY, EngineError, FailureCategory,
    FailurePolicy, FetchConfig, FetchEngine, FetchError, FetchResult, HttpClient, ItemFailure,
    fetch_one, should_use_cache,
};
pub use manifest::{FileIdentifier, Manifest, ManifestError};
pub use resolver::{
    AddonApiResolver, FileMetadata, MetadataResolver, ModsApiResolver, ResolverKind,
    build_resolver,
};
