//! In-memory KvStore (ordered map, cursor-paginated listing).

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;
use tokio::sync::RwLock;
use zone_types::{KeyEntry, KeyPage, KvStore, KvStoreError};

/// Keys per listing page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// In-memory KvStore: keys kept sorted so the cursor is simply the last key of a page.
#[derive(Clone)]
pub struct InMemoryKvStore {
    entries: Arc<RwLock<BTreeMap<String, String>>>,
    page_size: usize,
}

impl InMemoryKvStore {
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// Store whose `list` returns at most `page_size` keys per page (minimum 1).
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(BTreeMap::new())),
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for InMemoryKvStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl KvStore for InMemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, KvStoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), KvStoreError> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), KvStoreError> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn list(&self, cursor: Option<&str>) -> Result<KeyPage, KvStoreError> {
        let guard = self.entries.read().await;
        let lower = match cursor {
            Some(c) => Bound::Excluded(c),
            None => Bound::Unbounded,
        };
        let mut names = guard
            .range::<str, _>((lower, Bound::Unbounded))
            .map(|(k, _)| k.clone());
        let keys: Vec<KeyEntry> = names
            .by_ref()
            .take(self.page_size)
            .map(|name| KeyEntry { name })
            .collect();
        let complete = names.next().is_none();
        let cursor = if complete {
            None
        } else {
            keys.last().map(|k| k.name.clone())
        };
        Ok(KeyPage {
            keys,
            cursor,
            complete,
        })
    }
}
