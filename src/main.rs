//! news-harvester — Binary Entrypoint
//! Runs the feed ingestion pipeline once (default) or on a timer
//! (`INGEST_INTERVAL_SECS`), reporting per-feed and aggregate tallies
//! through tracing.
//!
//! See `README.md` for quickstart.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use news_harvester::scheduler::{spawn_ingest_scheduler, SchedulerCfg};
use news_harvester::{config, ingest, FeedFetcher, MemoryStore, RetryPolicy, RunSummary};

const ENV_INTERVAL: &str = "INGEST_INTERVAL_SECS";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("news_harvester=info,ingest=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

/// Operator-facing outcome report. Failed feeds surface at warn so partial
/// success never reads as full success.
fn report(summary: &RunSummary) {
    for feed in &summary.feeds {
        match &feed.error {
            Some(err) => tracing::warn!(feed = %feed.feed_url, error = %err, "feed failed"),
            None => tracing::info!(
                feed = %feed.feed_url,
                title = feed.feed_title.as_deref().unwrap_or("-"),
                inserted = feed.inserted,
                duplicated = feed.duplicated,
                skipped = feed.skipped,
                "feed ingested"
            ),
        }
    }
    tracing::info!(
        feeds = summary.feeds.len(),
        failed = summary.failed_feeds(),
        inserted = summary.inserted(),
        duplicated = summary.duplicated(),
        skipped = summary.skipped(),
        "run complete"
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op where unset.
    let _ = dotenvy::dotenv();
    init_tracing();

    let sources = config::load_sources_default().context("loading feed sources")?;
    let fetcher = FeedFetcher::new(RetryPolicy::default()).context("building feed fetcher")?;
    let store = MemoryStore::new();

    if let Ok(raw) = std::env::var(ENV_INTERVAL) {
        let interval_secs: u64 = raw
            .parse()
            .ok()
            .filter(|n| *n > 0)
            .context("INGEST_INTERVAL_SECS must be a positive integer")?;
        let handle = spawn_ingest_scheduler(
            SchedulerCfg { interval_secs },
            sources,
            Arc::new(fetcher),
            Arc::new(store),
        )
        .context("starting ingest scheduler")?;
        handle.await.context("ingest scheduler stopped")?;
        return Ok(());
    }

    let summary = ingest::run_once(&sources, &fetcher, &store).await?;
    report(&summary);
    Ok(())
}
