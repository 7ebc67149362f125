// src/fetch.rs
//! Feed retrieval: one HTTP fetch per attempt, bounded retries with linear
//! backoff, and parsing of both wire dialects (RSS 2.0 and Atom) into the
//! common [`FeedDocument`] shape.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use quick_xml::de::from_str;
use serde::Deserialize;

use crate::error::IngestError;
use crate::types::{FeedDocument, FetchFeed, MediaRef, RawFeedItem};

/// Per-attempt guard against a hung connection.
const FETCH_TIMEOUT: Duration = Duration::from_secs(25);

const USER_AGENT: &str = concat!("news-harvester/", env!("CARGO_PKG_VERSION"));

/// Retry policy for feed fetching: bounded attempts with a linearly growing
/// pause between them. Every failure class retries; the fetch layer makes
/// no retryable/permanent distinction.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_unit: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Zero-delay variant, for tests and backfills.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff_unit: Duration::ZERO,
        }
    }

    /// Pause taken before the given 1-based attempt: none before the first,
    /// then one unit more per attempt (1x, 2x, ...).
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            Duration::ZERO
        } else {
            self.backoff_unit * (attempt - 1)
        }
    }
}

/// Run `op` until it succeeds or the policy's attempt budget is spent,
/// sleeping the policy's delay between attempts. The terminal error wraps
/// the last failure together with the attempt count.
pub async fn with_retries<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, IngestError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, IngestError>>,
{
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= policy.max_attempts {
                    return Err(IngestError::FetchFailed {
                        attempts: attempt,
                        last: Box::new(err),
                    });
                }
                tracing::warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    error = %err,
                    "fetch attempt failed; will retry"
                );
                let delay = policy.delay_before(attempt + 1);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

// --- Wire shapes -----------------------------------------------------------
//
// quick-xml's deserializer matches elements by local name, with any
// namespace prefix stripped: `<dc:date>` arrives as `date`,
// `<content:encoded>` as `encoded`, `<media:content>` as a second
// `content`. Slots whose local name is shared between a core element and
// an extension element parse as lists here and are split apart in the
// `From` impls, by document order for text slots and by shape for
// content blocks.

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "title", default)]
    titles: Vec<String>,
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    #[serde(rename = "title", default)]
    titles: Vec<String>,
    #[serde(rename = "link", default)]
    links: Vec<String>,
    guid: Option<Guid>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    // <dc:date>
    date: Option<String>,
    // <description> plus any <media:description>
    #[serde(rename = "description", default)]
    descriptions: Vec<String>,
    // <content:encoded>
    encoded: Option<String>,
    #[serde(rename = "enclosure", default)]
    enclosures: Vec<MediaRef>,
    // <media:content>
    #[serde(rename = "content", default)]
    media_contents: Vec<MediaRef>,
    // <media:thumbnail>; several sizes per item are routine
    #[serde(rename = "thumbnail", default)]
    media_thumbnails: Vec<MediaRef>,
}

#[derive(Debug, Deserialize)]
struct Guid {
    #[serde(rename = "$text")]
    value: Option<String>,
}

// Atom requires a feed-level title, which doubles as the dialect check so a
// stray-but-valid XML document is not mistaken for an empty Atom feed. No
// `default` on the list: at least one title element must be present.
#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "title")]
    titles: Vec<AtomText>,
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    #[serde(rename = "title", default)]
    titles: Vec<AtomText>,
    id: Option<String>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    published: Option<String>,
    updated: Option<String>,
    summary: Option<AtomText>,
    // <content> and <media:content>, told apart by shape in the From impl
    #[serde(rename = "content", default)]
    contents: Vec<MediaRef>,
    // <media:thumbnail>
    #[serde(rename = "thumbnail", default)]
    media_thumbnails: Vec<MediaRef>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AtomText {
    #[serde(rename = "$text")]
    value: Option<String>,
}

/// First entry of a repeated text slot that is non-blank.
fn first_text(values: Vec<String>) -> Option<String> {
    values.into_iter().find(|v| !v.trim().is_empty())
}

fn first_atom_text(values: Vec<AtomText>) -> Option<String> {
    values
        .into_iter()
        .find_map(|t| t.value.filter(|v| !v.trim().is_empty()))
}

/// First media reference that actually points somewhere.
fn first_media(refs: Vec<MediaRef>) -> Option<MediaRef> {
    refs.into_iter().find(|m| m.url.is_some() || m.text.is_some())
}

/// Split an item's `description`-local elements apart. Feeds emit the core
/// element before namespaced ones, so the first non-blank text is the plain
/// description and the next is the `media:description` snippet.
fn split_descriptions(values: Vec<String>) -> (Option<String>, Option<String>) {
    let mut texts = values.into_iter().filter(|v| !v.trim().is_empty());
    (texts.next(), texts.next())
}

/// Split an entry's `content`-local elements apart: inline Atom content
/// carries a text body, `media:content` carries a `url` attribute.
fn split_contents(blocks: Vec<MediaRef>) -> (Option<String>, Option<MediaRef>) {
    let mut body = None;
    let mut media = None;
    for block in blocks {
        if block.url.is_some() {
            if media.is_none() {
                media = Some(block);
            }
        } else if body.is_none() {
            body = block.text.filter(|t| !t.trim().is_empty());
        }
    }
    (body, media)
}

impl From<RssItem> for RawFeedItem {
    fn from(item: RssItem) -> Self {
        let (description, snippet) = split_descriptions(item.descriptions);
        RawFeedItem {
            title: first_text(item.titles),
            link: first_text(item.links),
            guid: item.guid.and_then(|g| g.value),
            pub_date: item.pub_date,
            iso_date: item.date,
            snippet,
            summary: None,
            description,
            content: None,
            content_encoded: item.encoded,
            enclosure: first_media(item.enclosures),
            media_content: first_media(item.media_contents),
            media_thumbnail: first_media(item.media_thumbnails),
        }
    }
}

impl From<AtomEntry> for RawFeedItem {
    fn from(entry: AtomEntry) -> Self {
        let link = alternate_link(&entry.links);
        let (content, media_content) = split_contents(entry.contents);
        RawFeedItem {
            title: first_atom_text(entry.titles),
            link,
            guid: entry.id,
            pub_date: None,
            iso_date: entry.published.or(entry.updated),
            snippet: None,
            summary: entry.summary.and_then(|t| t.value),
            description: None,
            content,
            content_encoded: None,
            enclosure: None,
            media_content,
            media_thumbnail: first_media(entry.media_thumbnails),
        }
    }
}

/// The entry link Atom readers treat as the article URL: `rel="alternate"`
/// or rel-less first, any link with an href as the fallback.
fn alternate_link(links: &[AtomLink]) -> Option<String> {
    links
        .iter()
        .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
        .and_then(|l| l.href.clone())
        .or_else(|| links.iter().find_map(|l| l.href.clone()))
}

/// Map the named HTML entities that leak into feed XML onto numeric
/// references so strict parsing survives them.
fn scrub_xml_entities(s: &str) -> String {
    s.replace("&nbsp;", "&#160;")
        .replace("&ndash;", "&#8211;")
        .replace("&mdash;", "&#8212;")
        .replace("&ldquo;", "&#8220;")
        .replace("&rdquo;", "&#8221;")
        .replace("&lsquo;", "&#8216;")
        .replace("&rsquo;", "&#8217;")
        .replace("&hellip;", "&#8230;")
        .replace("&copy;", "&#169;")
}

/// Parse a feed payload: RSS 2.0 first, Atom as the fallback dialect.
pub fn parse_feed(xml: &str) -> Result<FeedDocument, IngestError> {
    let scrubbed = scrub_xml_entities(xml);
    let rss_err = match from_str::<Rss>(&scrubbed) {
        Ok(rss) => {
            return Ok(FeedDocument {
                title: first_text(rss.channel.titles),
                items: rss.channel.items.into_iter().map(Into::into).collect(),
            })
        }
        Err(e) => e,
    };
    match from_str::<AtomFeed>(&scrubbed) {
        Ok(feed) => Ok(FeedDocument {
            title: first_atom_text(feed.titles),
            items: feed.entries.into_iter().map(Into::into).collect(),
        }),
        Err(atom_err) => Err(IngestError::Parse(format!(
            "not rss ({rss_err}) and not atom ({atom_err})"
        ))),
    }
}

/// HTTP-backed feed fetcher. One outstanding request at a time; retries are
/// strictly sequential and governed by the injected [`RetryPolicy`].
pub struct FeedFetcher {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl FeedFetcher {
    pub fn new(retry: RetryPolicy) -> Result<Self, IngestError> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client, retry })
    }

    async fn fetch_once(&self, url: &str) -> Result<FeedDocument, IngestError> {
        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(IngestError::Status(resp.status()));
        }
        let body = resp.text().await?;
        parse_feed(&body)
    }
}

#[async_trait]
impl FetchFeed for FeedFetcher {
    async fn fetch(&self, url: &str) -> Result<FeedDocument, IngestError> {
        with_retries(&self.retry, || self.fetch_once(url)).await
    }
}
