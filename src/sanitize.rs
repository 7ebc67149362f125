// src/sanitize.rs
//! Allow-list HTML sanitizer for stored article bodies.
//!
//! Purely structural filtering over a parsed HTML tree; input is never
//! executed or interpreted. Everything outside the allow-list is stripped,
//! including script/style bodies, event-handler attributes, and URL schemes
//! other than http/https/mailto.

use std::collections::{HashMap, HashSet};

use ammonia::Builder;
use once_cell::sync::Lazy;

/// Tags allowed through to storage.
const ALLOWED_TAGS: &[&str] = &["p", "a", "b", "i", "ul", "ol", "li", "br", "img", "blockquote"];

/// URL schemes allowed on href/src.
const ALLOWED_SCHEMES: &[&str] = &["http", "https", "mailto"];

static CLEANER: Lazy<Builder<'static>> = Lazy::new(|| {
    let mut builder = Builder::default();
    builder
        .tags(ALLOWED_TAGS.iter().copied().collect::<HashSet<_>>())
        .generic_attributes(HashSet::new())
        .tag_attributes(HashMap::from([
            (
                "a",
                ["href", "title", "rel", "target"]
                    .into_iter()
                    .collect::<HashSet<_>>(),
            ),
            ("img", ["src", "alt"].into_iter().collect()),
        ]))
        .url_schemes(ALLOWED_SCHEMES.iter().copied().collect())
        // rel stays under author control; a forced rel value cannot be
        // combined with allowing rel as an anchor attribute.
        .link_rel(None);
    builder
});

/// Reduce untrusted HTML to the allow-listed subset. Output that trims to
/// nothing degrades to absent, like every other missing field.
pub fn sanitize_html(html: &str) -> Option<String> {
    let cleaned = CLEANER.clean(html).to_string();
    if cleaned.trim().is_empty() {
        None
    } else {
        Some(cleaned)
    }
}
