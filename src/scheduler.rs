// src/scheduler.rs
//! Periodic driver: re-run the ingest pipeline on a fixed interval.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::error::IngestError;
use crate::store::ArticleStore;
use crate::types::FetchFeed;

#[derive(Clone, Copy, Debug)]
pub struct SchedulerCfg {
    pub interval_secs: u64,
}

/// Spawn the ingest loop. The first tick fires immediately; each later tick
/// waits out the interval. Runs never overlap: a tick's run completes
/// before the next tick is awaited.
///
/// An empty source list is refused up front; it would make every tick fail
/// with the same configuration error.
pub fn spawn_ingest_scheduler(
    cfg: SchedulerCfg,
    sources: Vec<String>,
    fetcher: Arc<dyn FetchFeed>,
    store: Arc<dyn ArticleStore>,
) -> Result<JoinHandle<()>, IngestError> {
    if sources.is_empty() {
        return Err(IngestError::NoSources);
    }
    Ok(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(cfg.interval_secs));
        loop {
            ticker.tick().await;
            match crate::ingest::run_once(&sources, fetcher.as_ref(), store.as_ref()).await {
                Ok(summary) => {
                    tracing::info!(
                        target: "ingest",
                        feeds = summary.feeds.len(),
                        failed = summary.failed_feeds(),
                        inserted = summary.inserted(),
                        duplicated = summary.duplicated(),
                        skipped = summary.skipped(),
                        "scheduled ingest tick"
                    );
                }
                Err(err) => {
                    tracing::error!(target: "ingest", error = %err, "scheduled ingest run failed");
                }
            }
        }
    }))
}
