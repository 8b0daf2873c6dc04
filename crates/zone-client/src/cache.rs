//! Local TTL cache over single-key reads and writes.

use crate::client::{ClientError, ZoneClient};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Wraps a [`ZoneClient`]; `get_value` is served locally while an entry is fresh.
///
/// Entries are keyed by `(memory, key)`. Absent values are not cached, and
/// writes made by other clients are only seen once an entry expires.
pub struct CachedClient {
    inner: ZoneClient,
    ttl: Duration,
    entries: RwLock<HashMap<(String, String), (String, Instant)>>,
}

impl CachedClient {
    pub fn new(inner: ZoneClient) -> Self {
        Self::with_ttl(inner, DEFAULT_CACHE_TTL)
    }

    pub fn with_ttl(inner: ZoneClient, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &ZoneClient {
        &self.inner
    }

    fn cache_key(&self, key: &str, memory: Option<&str>) -> (String, String) {
        (self.inner.memory(memory).to_string(), key.to_string())
    }

    pub async fn get_value(
        &self,
        key: &str,
        memory: Option<&str>,
    ) -> Result<Option<String>, ClientError> {
        let slot = self.cache_key(key, memory);
        if let Some((value, stored_at)) = self.entries.read().await.get(&slot) {
            if stored_at.elapsed() < self.ttl {
                return Ok(Some(value.clone()));
            }
        }

        let value = self.inner.get_value(key, memory).await?;
        let mut guard = self.entries.write().await;
        match &value {
            Some(v) => {
                guard.insert(slot, (v.clone(), Instant::now()));
            }
            None => {
                guard.remove(&slot);
            }
        }
        Ok(value)
    }

    /// Write through to the server, then refresh the local entry.
    pub async fn set_value(
        &self,
        key: &str,
        value: &str,
        memory: Option<&str>,
    ) -> Result<(), ClientError> {
        self.inner.set_value(key, value, memory).await?;
        self.entries
            .write()
            .await
            .insert(self.cache_key(key, memory), (value.to_string(), Instant::now()));
        Ok(())
    }

    /// Drop the local entry for `key`.
    pub async fn invalidate(&self, key: &str, memory: Option<&str>) {
        self.entries
            .write()
            .await
            .remove(&self.cache_key(key, memory));
    }
}
