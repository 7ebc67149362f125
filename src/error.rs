// src/error.rs
//! Error taxonomy for the ingestion pipeline.
//!
//! Missing item fields are never errors here; they degrade to `None` during
//! normalization. Store-side rejection travels through the store trait's own
//! `Result` and is tallied per item, not propagated.

use thiserror::Error;

/// Failures surfaced by the fetch and ingest layers.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Transport-level failure talking to the feed host.
    #[error("feed request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The feed host answered with a non-success status.
    #[error("feed request returned status {0}")]
    Status(reqwest::StatusCode),

    /// The response body parsed as neither RSS nor Atom.
    #[error("feed parse failed: {0}")]
    Parse(String),

    /// Every fetch attempt failed; carries the last error seen.
    #[error("feed fetch failed after {attempts} attempts: {last}")]
    FetchFailed { attempts: u32, last: Box<IngestError> },

    /// No feed sources are configured, so a run has nothing to do.
    #[error("no feed sources configured")]
    NoSources,
}
