// tests/ingest_pipeline.rs
use std::collections::HashMap;

use async_trait::async_trait;
use news_harvester::{
    parse_feed, run_once, Article, ArticleStore, FeedDocument, FetchFeed, IngestError,
    MemoryStore, SaveOutcome,
};

const RSS: &str = include_str!("fixtures/sample_rss.xml");
const ATOM: &str = include_str!("fixtures/sample_atom.xml");

/// Serves canned documents per URL; unknown URLs fail the way an exhausted
/// network fetch does.
struct MockFetcher {
    feeds: HashMap<String, FeedDocument>,
}

impl MockFetcher {
    fn new() -> Self {
        Self {
            feeds: HashMap::new(),
        }
    }

    fn with_feed(mut self, url: &str, xml: &str) -> Self {
        let doc = parse_feed(xml).expect("fixture parses");
        self.feeds.insert(url.to_string(), doc);
        self
    }
}

#[async_trait]
impl FetchFeed for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<FeedDocument, IngestError> {
        self.feeds
            .get(url)
            .cloned()
            .ok_or_else(|| IngestError::FetchFailed {
                attempts: 3,
                last: Box::new(IngestError::Parse("connection refused".into())),
            })
    }
}

#[tokio::test]
async fn pipeline_counts_inserts_and_keyless_skips() {
    let fetcher = MockFetcher::new()
        .with_feed("https://news.example.com/rss", RSS)
        .with_feed("https://notes.example.com/atom.xml", ATOM);
    let store = MemoryStore::new();
    let sources = vec![
        "https://news.example.com/rss".to_string(),
        "https://notes.example.com/atom.xml".to_string(),
    ];

    let summary = run_once(&sources, &fetcher, &store).await.unwrap();

    assert_eq!(summary.feeds.len(), 2);
    assert_eq!(summary.inserted(), 3);
    assert_eq!(summary.duplicated(), 0);
    // the keyless rss note plus the keyless atom draft
    assert_eq!(summary.skipped(), 2);
    assert_eq!(summary.failed_feeds(), 0);
    assert_eq!(store.len(), 3);

    // tallies come back in source order
    let rss_tally = &summary.feeds[0];
    assert_eq!(rss_tally.feed_url, "https://news.example.com/rss");
    assert_eq!(rss_tally.feed_title.as_deref(), Some("Harvest Business Wire"));
    assert_eq!(rss_tally.inserted, 2);
    assert_eq!(rss_tally.skipped, 1);
}

#[tokio::test]
async fn second_run_reports_duplicates_not_inserts() {
    let fetcher = MockFetcher::new().with_feed("https://news.example.com/rss", RSS);
    let store = MemoryStore::new();
    let sources = vec!["https://news.example.com/rss".to_string()];

    let first = run_once(&sources, &fetcher, &store).await.unwrap();
    assert_eq!(first.inserted(), 2);

    let second = run_once(&sources, &fetcher, &store).await.unwrap();
    assert_eq!(second.inserted(), 0);
    assert_eq!(second.duplicated(), 2);
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn failing_feed_does_not_stop_the_run() {
    let fetcher = MockFetcher::new().with_feed("https://notes.example.com/atom.xml", ATOM);
    let store = MemoryStore::new();
    let sources = vec![
        "https://gone.example.com/rss".to_string(),
        "https://notes.example.com/atom.xml".to_string(),
    ];

    let summary = run_once(&sources, &fetcher, &store).await.unwrap();

    assert_eq!(summary.failed_feeds(), 1);
    assert!(summary.feeds[0].is_failed());
    let msg = summary.feeds[0].error.as_deref().unwrap();
    assert!(msg.contains("connection refused"), "got: {msg}");
    // the healthy feed still ran
    assert_eq!(summary.feeds[1].inserted, 1);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn empty_source_list_is_fatal() {
    let fetcher = MockFetcher::new();
    let store = MemoryStore::new();
    let err = run_once(&[], &fetcher, &store).await.unwrap_err();
    assert!(matches!(err, IngestError::NoSources));
}

/// Rejects every submission, standing in for a backend outage.
struct RejectingStore;

#[async_trait]
impl ArticleStore for RejectingStore {
    async fn save(&self, _article: Article) -> anyhow::Result<SaveOutcome> {
        anyhow::bail!("backend unavailable")
    }
}

#[tokio::test]
async fn store_rejections_count_as_skipped() {
    let fetcher = MockFetcher::new().with_feed("https://news.example.com/rss", RSS);
    let store = RejectingStore;
    let sources = vec!["https://news.example.com/rss".to_string()];

    let summary = run_once(&sources, &fetcher, &store).await.unwrap();

    assert_eq!(summary.inserted(), 0);
    // two rejected submissions plus the keyless item
    assert_eq!(summary.skipped(), 3);
    assert_eq!(summary.failed_feeds(), 0);
}
