//! Concurrent fetch-and-cache pipeline.
//!
//! # Features
//!
//! - Size-based cache predicate ([`should_use_cache`])
//! - Single-item fetch with length verification ([`fetch_one`])
//! - Bounded, completion-ordered batch runs ([`FetchEngine`])
//! - Server-supplied file names confined to the output directory
//! - Configurable timeouts (30s connect, 5min read by default)

mod cache;
mod client;
pub mod constants;
mod engine;
mod error;
mod item;
mod path;

pub use cache::should_use_cache;
pub use client::{API_KEY_HEADER, HttpClient};
pub use constants::DEFAULT_CONCURRENCY;
pub use engine::{
    BatchProgress, BatchSummary, EngineError, FailurePolicy, FetchConfig, FetchEngine,
    ItemFailure,
};
pub use error::{FailureCategory, FetchError};
pub use item::{FetchResult, fetch_one};
pub use path::confine_to_output_dir;
