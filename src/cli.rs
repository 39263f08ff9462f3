//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use addon_fetch::{DEFAULT_CONCURRENCY, ResolverKind};

/// Concurrently fetch the files listed in an addon manifest.
///
/// Files already present in the output directory with the expected size are
/// reused instead of downloaded again.
#[derive(Parser, Debug)]
#[command(name = "addon-fetch")]
#[command(author, version, about)]
pub struct Args {
    /// Path to manifest file (default is stdin)
    #[arg(short, long)]
    pub manifest: Option<PathBuf>,

    /// Path to output directory (default is current directory)
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Redo download even if file already exists and has the correct size
    #[arg(short, long)]
    pub no_cache: bool,

    /// Metadata API scheme to resolve files with
    #[arg(short, long, value_enum, default_value_t = Source::Addon)]
    pub source: Source,

    /// Override the API base URL of the selected scheme
    #[arg(long)]
    pub api_base: Option<String>,

    /// API key sent as `x-api-key` (mods scheme)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Maximum concurrent fetches (1-100)
    #[arg(short = 'c', long, default_value_t = DEFAULT_CONCURRENCY as u8, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub concurrency: u8,

    /// Keep fetching after a failure and report all failures at the end
    #[arg(short = 'k', long)]
    pub keep_going: bool,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error logging
    #[arg(short, long)]
    pub quiet: bool,
}

/// Metadata API schemes selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Source {
    /// `addon/{project}/file/{file}` with a direct download URL
    Addon,
    /// `mods/{project}/files/{file}` with a templated download URL
    Mods,
}

impl From<Source> for ResolverKind {
    fn from(source: Source) -> Self {
        match source {
            Source::Addon => ResolverKind::Addon,
            Source::Mods => ResolverKind::Mods,
        }
    }
}
