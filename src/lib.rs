// src/lib.rs
// Public library surface for integration tests (and embedding).

pub mod config;
pub mod error;
pub mod fetch;
pub mod ingest;
pub mod normalize;
pub mod sanitize;
pub mod scheduler;
pub mod store;
pub mod types;

// ---- Re-exports for stable public API ----
pub use crate::error::IngestError;
pub use crate::fetch::{parse_feed, with_retries, FeedFetcher, RetryPolicy};
pub use crate::ingest::run_once;
pub use crate::normalize::normalize_item;
pub use crate::store::{ArticleStore, MemoryStore, SaveOutcome};
pub use crate::types::{Article, FeedDocument, FeedTally, FetchFeed, RawFeedItem, RunSummary};
