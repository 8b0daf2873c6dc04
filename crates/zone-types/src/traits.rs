//! Backing-store capability shared by memory namespaces and the token registry.

use async_trait::async_trait;

/// One key name in a listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEntry {
    pub name: String,
}

/// A page of key names. `cursor` resumes the listing when `complete` is false.
///
/// A page may be empty and still not complete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyPage {
    pub keys: Vec<KeyEntry>,
    pub cursor: Option<String>,
    pub complete: bool,
}

/// Key-value store abstraction (atomic single-key ops, eventually-consistent listing).
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Value for `key`, or `None` when absent.
    async fn get(&self, key: &str) -> Result<Option<String>, KvStoreError>;

    /// Create or overwrite `key`.
    async fn put(&self, key: &str, value: &str) -> Result<(), KvStoreError>;

    /// Remove `key`. Removing an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<(), KvStoreError>;

    /// List key names starting after `cursor` (from the beginning when `None`).
    async fn list(&self, cursor: Option<&str>) -> Result<KeyPage, KvStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum KvStoreError {
    #[error("kv store error: {0}")]
    Other(String),
    #[error("invalid cursor: {0}")]
    InvalidCursor(String),
}
