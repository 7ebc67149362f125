// tests/ingest_normalize.rs
use news_harvester::{normalize_item, parse_feed};

const RSS: &str = include_str!("fixtures/sample_rss.xml");
const ATOM: &str = include_str!("fixtures/sample_atom.xml");

// 2024-01-05T06:00:00Z, the instant both fixture date styles encode.
const JAN5_0600_UTC: u64 = 1_704_434_400;

#[test]
fn rss_items_normalize_end_to_end() {
    let doc = parse_feed(RSS).unwrap();

    let rates = normalize_item(&doc.items[0]);
    assert_eq!(rates.title, "Central bank holds rates steady");
    assert_eq!(
        rates.canonical_url.as_deref(),
        Some("https://news.example.com/articles/rates-hold")
    );
    assert_eq!(rates.url_hash.as_ref().map(|h| h.len()), Some(64));
    assert_eq!(rates.published_at, Some(JAN5_0600_UTC));
    assert_eq!(
        rates.image_url.as_deref(),
        Some("https://cdn.example.com/img/rates-hold.jpg")
    );
    assert_eq!(
        rates.excerpt.as_deref(),
        Some("Policymakers left the benchmark rate unchanged and signalled patience on cuts.")
    );
    // no body slot on this item
    assert_eq!(rates.content_html, None);

    let chip = normalize_item(&doc.items[1]);
    // guid stands in for the missing link
    assert_eq!(
        chip.canonical_url.as_deref(),
        Some("https://news.example.com/articles/chip-capacity")
    );
    assert_eq!(chip.published_at, Some(JAN5_0600_UTC));
    // media:thumbnail outranks the <img> inside content:encoded
    assert_eq!(
        chip.image_url.as_deref(),
        Some("https://cdn.example.com/thumb/chip.jpg")
    );
    assert_eq!(
        chip.excerpt.as_deref(),
        Some("The new plant will double wafer output by summer.")
    );
    let html = chip.content_html.unwrap();
    assert!(html.contains("<p>"), "got: {html}");
    assert!(html.contains("<img"), "got: {html}");
    assert!(html.contains("https://cdn.example.com/img/fab-floor.jpg"), "got: {html}");

    let note = normalize_item(&doc.items[2]);
    assert!(!note.is_storable());
    assert_eq!(note.canonical_url, None);
    assert_eq!(note.url_hash, None);
}

#[test]
fn atom_entries_normalize_end_to_end() {
    let doc = parse_feed(ATOM).unwrap();

    let post = normalize_item(&doc.items[0]);
    assert!(post.is_storable());
    assert_eq!(post.published_at, Some(JAN5_0600_UTC));
    assert_eq!(
        post.excerpt.as_deref(),
        Some("What went wrong in the job queue, and the fix that shipped.")
    );
    assert!(post
        .content_html
        .unwrap()
        .contains("<b>poison message</b>"));

    let draft = normalize_item(&doc.items[1]);
    assert!(!draft.is_storable());
}

#[test]
fn same_canonical_url_hashes_identically_across_dialects() {
    let doc = parse_feed(RSS).unwrap();
    let a = normalize_item(&doc.items[0]);
    let b = normalize_item(&doc.items[0]);
    assert_eq!(a.url_hash, b.url_hash);
    assert_ne!(a.url_hash, normalize_item(&doc.items[1]).url_hash);
}
