// src/ingest.rs
//! The ingestion runner: walk configured feed sources in order, normalize
//! every item, submit to the store, and tally outcomes.
//!
//! Failure is contained at two levels. An item the store rejects is counted
//! as skipped and the feed continues; a feed whose fetch exhausts its
//! retries is recorded as failed and the run continues. Only an empty
//! source list aborts a run.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;

use crate::error::IngestError;
use crate::normalize::normalize_item;
use crate::store::{ArticleStore, SaveOutcome};
use crate::types::{FeedDocument, FeedTally, FetchFeed, RunSummary};

/// One-time metrics registration (series carry descriptions wherever a
/// recorder is installed).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_feeds_total", "Feed sources fetched.");
        describe_counter!(
            "ingest_feed_failures_total",
            "Feed sources that failed after retries."
        );
        describe_counter!("ingest_items_total", "Raw feed items seen.");
        describe_counter!("ingest_inserted_total", "Articles newly stored.");
        describe_counter!(
            "ingest_duplicated_total",
            "Articles already present by url_hash."
        );
        describe_counter!(
            "ingest_skipped_total",
            "Items skipped: missing keys or store rejection."
        );
        describe_counter!("ingest_runs_total", "Completed pipeline runs.");
        describe_histogram!("ingest_fetch_ms", "Per-feed fetch+parse time in milliseconds.");
        describe_gauge!("ingest_last_run_ts", "Unix ts when the pipeline last completed.");
    });
}

/// Ingest one feed source end to end. Never escalates: every failure lands
/// in the returned tally.
async fn ingest_feed(url: &str, fetcher: &dyn FetchFeed, store: &dyn ArticleStore) -> FeedTally {
    let t0 = std::time::Instant::now();
    let doc = match fetcher.fetch(url).await {
        Ok(doc) => doc,
        Err(err) => {
            tracing::warn!(feed = url, error = %err, "feed failed after retries");
            counter!("ingest_feed_failures_total").increment(1);
            return FeedTally::failed(url, &err);
        }
    };
    histogram!("ingest_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    counter!("ingest_items_total").increment(doc.items.len() as u64);

    let FeedDocument { title, items } = doc;
    let mut tally = FeedTally::new(url);
    tally.feed_title = title;

    for item in &items {
        let article = normalize_item(item);
        if !article.is_storable() {
            // Required storage keys: canonical_url, url_hash, title.
            tracing::debug!(feed = url, "item lacks required keys; skipped");
            tally.skipped += 1;
            continue;
        }
        match store.save(article).await {
            Ok(SaveOutcome::Inserted) => tally.inserted += 1,
            Ok(SaveOutcome::Duplicate) => tally.duplicated += 1,
            Err(err) => {
                tracing::warn!(feed = url, error = %err, "store rejected article; skipped");
                tally.skipped += 1;
            }
        }
    }

    tally
}

/// Run the pipeline once over `sources`, in order. Returns per-feed and
/// aggregate tallies; `Err` only for the nothing-to-do configuration case.
pub async fn run_once(
    sources: &[String],
    fetcher: &dyn FetchFeed,
    store: &dyn ArticleStore,
) -> Result<RunSummary, IngestError> {
    ensure_metrics_described();

    if sources.is_empty() {
        return Err(IngestError::NoSources);
    }

    let mut summary = RunSummary::default();
    for url in sources {
        counter!("ingest_feeds_total").increment(1);
        let tally = ingest_feed(url, fetcher, store).await;
        tracing::info!(
            target: "ingest",
            feed = %tally.feed_url,
            inserted = tally.inserted,
            duplicated = tally.duplicated,
            skipped = tally.skipped,
            failed = tally.is_failed(),
            "feed done"
        );
        summary.feeds.push(tally);
    }

    // Telemetry
    counter!("ingest_inserted_total").increment(summary.inserted());
    counter!("ingest_duplicated_total").increment(summary.duplicated());
    counter!("ingest_skipped_total").increment(summary.skipped());
    counter!("ingest_runs_total").increment(1);
    gauge!("ingest_last_run_ts").set(chrono::Utc::now().timestamp().max(0) as f64);

    Ok(summary)
}
