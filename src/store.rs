// src/store.rs
//! Article Store seam and the in-memory reference implementation.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{bail, Result};

use crate::types::Article;

/// How the store answered one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// New row; the dedup key was unseen.
    Inserted,
    /// The unique constraint on the dedup key fired.
    Duplicate,
}

/// Persistence seam for canonical articles. `Err` is the "rejected" shape:
/// store-side validation or connectivity trouble, never a duplicate.
#[async_trait::async_trait]
pub trait ArticleStore: Send + Sync {
    /// Submit one article. Duplicate detection is the store's own conflict
    /// signal on `url_hash`; callers must not pre-check.
    async fn save(&self, article: Article) -> Result<SaveOutcome>;
}

/// In-memory store with the same uniqueness rule a backing table enforces:
/// one row per `url_hash`, first writer wins.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<String, Article>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("article store mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored article for a dedup key, if any.
    pub fn get(&self, url_hash: &str) -> Option<Article> {
        self.inner
            .lock()
            .expect("article store mutex poisoned")
            .get(url_hash)
            .cloned()
    }
}

#[async_trait::async_trait]
impl ArticleStore for MemoryStore {
    async fn save(&self, article: Article) -> Result<SaveOutcome> {
        let Some(hash) = article.url_hash.clone() else {
            bail!("article has no url_hash; nothing to key on");
        };
        let mut map = self.inner.lock().expect("article store mutex poisoned");
        match map.entry(hash) {
            Entry::Occupied(_) => Ok(SaveOutcome::Duplicate),
            Entry::Vacant(slot) => {
                slot.insert(article);
                Ok(SaveOutcome::Inserted)
            }
        }
    }
}
