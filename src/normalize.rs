// src/normalize.rs
//! Normalization: loose feed items in, canonical [`Article`]s out.
//!
//! Field extraction is declarative: each canonical attribute has a fixed
//! priority chain of `(field name, accessor)` steps, walked front to back,
//! first non-empty value wins. Every field degrades to absent on its own;
//! nothing in this module performs I/O or fails.

use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::{OffsetDateTime, UtcOffset};

use crate::sanitize;
use crate::types::{Article, MediaRef, RawFeedItem};

/// Default visible-character budget for excerpts.
pub const DEFAULT_EXCERPT_CHARS: usize = 220;

/// One step of a field-priority chain: the dialect field it reads, plus the
/// accessor that reads it.
type FieldStep = (&'static str, fn(&RawFeedItem) -> Option<String>);

/// Canonical URL candidates, most authoritative first.
const URL_FIELDS: &[FieldStep] = &[
    ("link", |item| item.link.clone()),
    ("guid", |item| item.guid.clone()),
];

/// Image candidates in fixed priority order. The trailing step scans the
/// HTML body; first hit wins and later steps are never evaluated.
const IMAGE_FIELDS: &[FieldStep] = &[
    ("enclosure", |item| media_url(item.enclosure.as_ref())),
    ("media:content", |item| media_url(item.media_content.as_ref())),
    ("media:thumbnail", |item| media_url(item.media_thumbnail.as_ref())),
    ("body-img", |item| body_html(item).and_then(first_img_src)),
];

/// Excerpt text candidates: shortest and plainest slots first, rich body last.
const EXCERPT_FIELDS: &[FieldStep] = &[
    ("media:description", |item| item.snippet.clone()),
    ("summary", |item| item.summary.clone()),
    ("description", |item| item.description.clone()),
    ("content", |item| item.content.clone()),
    ("content:encoded", |item| item.content_encoded.clone()),
];

/// Walk a priority chain, returning the first value that is non-empty after
/// trimming. A blank value does not satisfy a step; the walk continues.
fn first_nonempty(item: &RawFeedItem, chain: &[FieldStep], attr: &str) -> Option<String> {
    for &(field, read) in chain {
        if let Some(value) = read(item) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                tracing::trace!(attr, field, "field chain hit");
                return Some(trimmed.to_string());
            }
        }
    }
    None
}

/// A media reference's URL: attribute form preferred, bare text accepted.
fn media_url(media: Option<&MediaRef>) -> Option<String> {
    let media = media?;
    media.url.clone().or_else(|| media.text.clone())
}

/// Body HTML for an item: the rich-text slot wins over plain content.
fn body_html(item: &RawFeedItem) -> Option<&str> {
    for field in [&item.content_encoded, &item.content] {
        if let Some(body) = field.as_deref() {
            let trimmed = body.trim();
            if !trimmed.is_empty() {
                return Some(trimmed);
            }
        }
    }
    None
}

/// First `<img src>` in an HTML body. Single case-insensitive scan; the
/// first match wins even when it is a tracking pixel. Known limitation,
/// kept deliberately.
fn first_img_src(html: &str) -> Option<String> {
    static RE_IMG: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_img = RE_IMG
        .get_or_init(|| regex::Regex::new(r#"(?i)<img[^>]+src\s*=\s*["']([^"']+)["']"#).unwrap());
    re_img
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Decode HTML entities and strip tags, leaving display text. Tags become a
/// single space so word boundaries survive; the excerpt builder collapses.
fn plain_text(s: &str) -> String {
    // 1) HTML entity decode
    let decoded = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    re_tags.replace_all(&decoded, " ").into_owned()
}

/// The URL chosen to represent the item, used as the dedup identity basis.
pub fn canonical_url(item: &RawFeedItem) -> Option<String> {
    first_nonempty(item, URL_FIELDS, "canonical_url")
}

fn parse_rfc3339_to_unix(ts: &str) -> Option<u64> {
    OffsetDateTime::parse(ts, &Rfc3339)
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC).unix_timestamp())
        .and_then(|secs| u64::try_from(secs).ok())
}

fn parse_rfc2822_to_unix(ts: &str) -> Option<u64> {
    // Feeds still ship the obsolete GMT/UT zone names; the parser wants an
    // explicit offset.
    let ts = ts.trim();
    let fixed;
    let ts = if let Some(stripped) = ts.strip_suffix(" GMT").or_else(|| ts.strip_suffix(" UT")) {
        fixed = format!("{stripped} +0000");
        fixed.as_str()
    } else {
        ts
    };
    OffsetDateTime::parse(ts, &Rfc2822)
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC).unix_timestamp())
        .and_then(|secs| u64::try_from(secs).ok())
}

/// Publish time in Unix seconds. The normalized-date slot, when present,
/// is the only one consulted; an unparsable value degrades to absent
/// instead of falling through.
pub fn published_at(item: &RawFeedItem) -> Option<u64> {
    if let Some(ts) = item
        .iso_date
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        return parse_rfc3339_to_unix(ts);
    }
    item.pub_date
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(parse_rfc2822_to_unix)
}

/// Lead image URL, per the fixed priority chain.
pub fn image_url(item: &RawFeedItem) -> Option<String> {
    first_nonempty(item, IMAGE_FIELDS, "image_url")
}

/// Bound a piece of text to `max` visible characters: collapse whitespace
/// runs to single spaces, trim, and if still over budget cut to `max - 1`
/// characters and terminate with one ellipsis. Idempotent on its own
/// output. Blank input yields absent.
pub fn build_excerpt(text: &str, max: usize) -> Option<String> {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return None;
    }
    if collapsed.chars().count() <= max {
        return Some(collapsed);
    }
    let cut: String = collapsed.chars().take(max.saturating_sub(1)).collect();
    let mut out = cut.trim_end().to_string();
    out.push('\u{2026}');
    Some(out)
}

/// Preview text for an item: best source field, converted to plain text,
/// bounded by [`build_excerpt`].
pub fn excerpt(item: &RawFeedItem, max: usize) -> Option<String> {
    let source = first_nonempty(item, EXCERPT_FIELDS, "excerpt")?;
    build_excerpt(&plain_text(&source), max)
}

/// Dedup fingerprint: SHA-256 of the canonical URL, lowercase hex. Stable
/// across runs and platforms; not a security control.
pub fn url_hash(url: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(digest.len() * 2);
    for b in digest.iter() {
        use std::fmt::Write as _;
        let _ = write!(&mut hex, "{:02x}", b);
    }
    hex
}

/// Sanitized body HTML, absent when the item has no body or sanitizing
/// leaves nothing.
pub fn content_html(item: &RawFeedItem) -> Option<String> {
    body_html(item).and_then(sanitize::sanitize_html)
}

/// Build one canonical [`Article`] from a raw item. Pure: same input, same
/// output; the input is untouched; a completely sparse item produces a
/// record of absent fields rather than an error.
pub fn normalize_item(item: &RawFeedItem) -> Article {
    let canonical_url = canonical_url(item);
    let url_hash = canonical_url.as_deref().map(url_hash);
    Article {
        title: item
            .title
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string(),
        canonical_url,
        url_hash,
        published_at: published_at(item),
        image_url: image_url(item),
        excerpt: excerpt(item, DEFAULT_EXCERPT_CHARS),
        content_html: content_html(item),
    }
}
