//! CLI entry point for the addon-fetch tool.

use std::io::{self, IsTerminal};

use addon_fetch::{
    FailurePolicy, FetchConfig, FetchEngine, HttpClient, Manifest, ResolverKind, build_resolver,
};
use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{debug, error, info, warn};

mod cli;
mod progress;

use cli::Args;
use progress::ProgressUi;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // stdout is reserved for progress lines
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let kind = ResolverKind::from(args.source);
    debug!(
        manifest = ?args.manifest,
        output_dir = %args.output_dir.display(),
        no_cache = args.no_cache,
        source = %kind,
        concurrency = args.concurrency,
        keep_going = args.keep_going,
        "CLI arguments parsed"
    );

    // Manifest problems are reported before any network activity
    if args.manifest.is_none() && io::stdin().is_terminal() {
        info!("Reading manifest from stdin (pass -m <path> to read a file)");
    }
    let mut manifest = Manifest::load_or_read(args.manifest.as_ref(), io::stdin().lock())
        .context("failed to load manifest")?;
    let duplicates = manifest.dedup();
    if duplicates > 0 {
        warn!(duplicates, "Ignored repeated manifest entries");
    }

    if !args.output_dir.exists() {
        std::fs::create_dir_all(&args.output_dir).with_context(|| {
            format!(
                "failed to create output directory {}",
                args.output_dir.display()
            )
        })?;
        info!(dir = %args.output_dir.display(), "Created output directory");
    }

    let client = HttpClient::new();
    let resolver = build_resolver(
        kind,
        client.clone(),
        args.api_base.as_deref(),
        args.api_key.clone(),
    )
    .context("invalid API configuration")?;

    let failure_policy = if args.keep_going {
        FailurePolicy::CollectAll
    } else {
        FailurePolicy::AbortOnFirst
    };
    let config = FetchConfig::new(args.output_dir.clone())
        .with_cache_disabled(args.no_cache)
        .with_concurrency(usize::from(args.concurrency))
        .with_failure_policy(failure_policy);
    let engine =
        FetchEngine::new(resolver, client, config).context("invalid fetch configuration")?;

    info!(files = manifest.len(), source = %kind, "Fetching manifest files");

    let ui = ProgressUi::new(!args.quiet && io::stderr().is_terminal(), manifest.len());
    let outcome = engine
        .run_batch(&manifest.files, |progress| ui.report(progress))
        .await;
    ui.finish();

    let summary = outcome.context("fetch aborted")?;

    for failure in &summary.failures {
        error!(
            identifier = %failure.identifier,
            category = %failure.error.category(),
            "{}",
            failure.error
        );
    }
    if !summary.is_success() {
        bail!(
            "{} of {} files failed to fetch",
            summary.failed(),
            summary.total
        );
    }

    info!(
        downloaded = summary.downloaded,
        cached = summary.cached,
        bytes = summary.bytes_downloaded,
        "Fetch complete"
    );

    Ok(())
}
