// src/types.rs
//! Core records moving through the pipeline: raw feed items as parsed off
//! the wire, the canonical article they normalize into, and per-run tallies.

use crate::error::IngestError;

/// One reference to an external media resource, as feeds ship it: either a
/// `url` attribute on the element or a bare string body.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MediaRef {
    #[serde(rename = "@url", default)]
    pub url: Option<String>,
    #[serde(rename = "$text", default)]
    pub text: Option<String>,
}

/// A feed item as it arrives, before normalization. Every field is optional:
/// dialects disagree about which slots exist, and sparse items are routine.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RawFeedItem {
    pub title: Option<String>,
    pub link: Option<String>,
    pub guid: Option<String>,
    pub pub_date: Option<String>, // raw RFC 2822 style, e.g. <pubDate>
    pub iso_date: Option<String>, // normalized RFC 3339 style, e.g. <dc:date>
    pub snippet: Option<String>,  // short plain-text slot, e.g. <media:description>
    pub summary: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub content_encoded: Option<String>,
    pub enclosure: Option<MediaRef>,
    pub media_content: Option<MediaRef>,
    pub media_thumbnail: Option<MediaRef>,
}

/// Parse result for one feed: channel/feed title plus items in document order.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FeedDocument {
    pub title: Option<String>,
    pub items: Vec<RawFeedItem>,
}

/// The canonical, normalized article record. Built once per raw item,
/// immutable after that; the store takes ownership on submission.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Article {
    pub title: String, // trimmed; empty when the item had none, never null
    pub canonical_url: Option<String>,
    pub url_hash: Option<String>, // present iff canonical_url is
    pub published_at: Option<u64>, // unix seconds
    pub image_url: Option<String>,
    pub excerpt: Option<String>,
    pub content_html: Option<String>,
}

impl Article {
    /// Whether the record carries the keys storage requires: a canonical
    /// URL, its hash, and a non-empty title.
    pub fn is_storable(&self) -> bool {
        self.canonical_url.is_some() && self.url_hash.is_some() && !self.title.is_empty()
    }
}

/// Seam between the runner and whatever retrieves feed documents.
#[async_trait::async_trait]
pub trait FetchFeed: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FeedDocument, IngestError>;
}

/// Per-feed outcome tally, reported after every run. Never persisted.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct FeedTally {
    pub feed_url: String,
    pub feed_title: Option<String>,
    pub inserted: u64,
    pub duplicated: u64,
    pub skipped: u64,
    pub error: Option<String>, // present when the source itself failed
}

impl FeedTally {
    pub fn new(feed_url: impl Into<String>) -> Self {
        Self {
            feed_url: feed_url.into(),
            ..Self::default()
        }
    }

    pub fn failed(feed_url: impl Into<String>, error: &IngestError) -> Self {
        Self {
            feed_url: feed_url.into(),
            error: Some(error.to_string()),
            ..Self::default()
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Whole-run rollup across all configured sources.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct RunSummary {
    pub feeds: Vec<FeedTally>,
}

impl RunSummary {
    pub fn inserted(&self) -> u64 {
        self.feeds.iter().map(|f| f.inserted).sum()
    }

    pub fn duplicated(&self) -> u64 {
        self.feeds.iter().map(|f| f.duplicated).sum()
    }

    pub fn skipped(&self) -> u64 {
        self.feeds.iter().map(|f| f.skipped).sum()
    }

    pub fn failed_feeds(&self) -> usize {
        self.feeds.iter().filter(|f| f.is_failed()).count()
    }
}
