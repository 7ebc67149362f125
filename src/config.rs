// src/config.rs
//! Feed source configuration: an ordered list of feed URLs resolved from
//! the environment and config-file fallbacks.

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const ENV_URLS: &str = "FEED_URLS";
const ENV_PATH: &str = "FEED_SOURCES_PATH";

/// Load feed sources from an explicit path. Supports TOML or JSON formats.
pub fn load_sources_from(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading feed sources from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_sources(&content, ext.as_str())
}

/// Load feed sources using env vars + fallbacks:
/// 1) $FEED_URLS (inline, comma/whitespace separated)
/// 2) $FEED_SOURCES_PATH
/// 3) config/feeds.toml
/// 4) config/feeds.json
///
/// An empty result is not an error here; the runner treats it as the fatal
/// nothing-to-do case when a run actually starts.
pub fn load_sources_default() -> Result<Vec<String>> {
    if let Ok(raw) = std::env::var(ENV_URLS) {
        return Ok(parse_inline(&raw));
    }
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_sources_from(&pb);
        } else {
            return Err(anyhow!("FEED_SOURCES_PATH points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/feeds.toml");
    if toml_p.exists() {
        return load_sources_from(&toml_p);
    }
    let json_p = PathBuf::from("config/feeds.json");
    if json_p.exists() {
        return load_sources_from(&json_p);
    }
    Ok(Vec::new())
}

/// Split an inline env value on commas and whitespace.
fn parse_inline(raw: &str) -> Vec<String> {
    let items = raw
        .split(|c: char| c == ',' || c.is_whitespace())
        .map(str::to_string)
        .collect();
    clean_list(items)
}

fn parse_sources(s: &str, hint_ext: &str) -> Result<Vec<String>> {
    // Try TOML first if hinted or content looks like toml.
    let try_toml = hint_ext == "toml" || s.contains("sources");
    if try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    // Try JSON array
    if let Ok(v) = parse_json(s) {
        return Ok(v);
    }
    // Fallback: also try TOML if not attempted
    if !try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    Err(anyhow!("unsupported feed source format"))
}

fn parse_toml(s: &str) -> Result<Vec<String>> {
    #[derive(serde::Deserialize)]
    struct TomlSources {
        sources: Vec<String>,
    }
    let v: TomlSources = toml::from_str(s)?;
    Ok(clean_list(v.sources))
}

fn parse_json(s: &str) -> Result<Vec<String>> {
    let v: Vec<String> = serde_json::from_str(s)?;
    Ok(clean_list(v))
}

/// Trim, drop blanks, drop repeats. Source order is part of the contract,
/// so dedup keeps the first occurrence in place.
fn clean_list(items: Vec<String>) -> Vec<String> {
    use std::collections::HashSet;
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(items.len());
    for it in items {
        let t = it.trim();
        if !t.is_empty() && seen.insert(t.to_string()) {
            out.push(t.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs};

    #[test]
    fn dedup_trims_and_preserves_order() {
        let toml = r#"sources = [" https://b.example/feed ", "", "https://a.example/rss", "https://b.example/feed"]"#;
        let toml_out = parse_toml(toml).unwrap();
        assert_eq!(
            toml_out,
            vec![
                "https://b.example/feed".to_string(),
                "https://a.example/rss".to_string()
            ]
        );

        let json = r#"["https://z.example/atom", "  https://a.example/rss  ", ""]"#;
        let json_out = parse_json(json).unwrap();
        assert_eq!(
            json_out,
            vec![
                "https://z.example/atom".to_string(),
                "https://a.example/rss".to_string()
            ]
        );
    }

    #[test]
    fn inline_env_value_splits_on_commas_and_whitespace() {
        let out = parse_inline("https://a.example/rss, https://b.example/feed\nhttps://a.example/rss");
        assert_eq!(
            out,
            vec![
                "https://a.example/rss".to_string(),
                "https://b.example/feed".to_string()
            ]
        );
    }

    #[serial_test::serial]
    #[test]
    fn default_uses_env_then_fallbacks() {
        // Isolate CWD in a temp dir so a real config/ in the repo cannot
        // interfere.
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();

        env::remove_var(ENV_URLS);
        env::remove_var(ENV_PATH);

        // No files in the temp CWD -> empty.
        let v = load_sources_default().unwrap();
        assert!(v.is_empty());

        // Path env is honored.
        let p_json = tmp.path().join("feeds.json");
        fs::write(&p_json, r#"["https://a.example/rss"]"#).unwrap();
        env::set_var(ENV_PATH, p_json.display().to_string());
        let v2 = load_sources_default().unwrap();
        assert_eq!(v2, vec!["https://a.example/rss".to_string()]);

        // Inline env outranks the path env.
        env::set_var(ENV_URLS, "https://b.example/feed");
        let v3 = load_sources_default().unwrap();
        assert_eq!(v3, vec!["https://b.example/feed".to_string()]);

        env::remove_var(ENV_URLS);
        env::remove_var(ENV_PATH);
        env::set_current_dir(&old).unwrap();
    }
}
