//! Concurrent fan-out over a store and the full-namespace scan.
//!
//! Every sub-call is issued without waiting on the others and carries its own
//! key, so the joined result never depends on completion order. Any failing
//! sub-call fails the whole batch.

use futures::future::try_join_all;
use std::collections::BTreeMap;
use zone_types::{KvStore, KvStoreError};

/// Key -> value (or `None` when absent).
pub type ValueMap = BTreeMap<String, Option<String>>;

pub async fn get_many(store: &dyn KvStore, keys: &[String]) -> Result<ValueMap, KvStoreError> {
    let pairs = try_join_all(keys.iter().map(|key| async move {
        store.get(key).await.map(|value| (key.clone(), value))
    }))
    .await?;
    Ok(pairs.into_iter().collect())
}

pub async fn put_many(
    store: &dyn KvStore,
    entries: &[(String, String)],
) -> Result<(), KvStoreError> {
    try_join_all(entries.iter().map(|(key, value)| store.put(key, value))).await?;
    Ok(())
}

pub async fn delete_many(store: &dyn KvStore, keys: &[String]) -> Result<(), KvStoreError> {
    try_join_all(keys.iter().map(|key| store.delete(key))).await?;
    Ok(())
}

/// Walk every listing page and fetch each page's values concurrently.
///
/// Only the store's `complete` flag ends the walk; empty pages do not. A key
/// deleted between listing and fetching is recorded as `None`.
pub async fn scan_all(store: &dyn KvStore) -> Result<ValueMap, KvStoreError> {
    let mut result = ValueMap::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0usize;
    loop {
        let page = store.list(cursor.as_deref()).await?;
        pages += 1;
        let names: Vec<String> = page.keys.into_iter().map(|k| k.name).collect();
        result.extend(get_many(store, &names).await?);
        if page.complete {
            break;
        }
        match page.cursor {
            Some(next) => cursor = Some(next),
            None => {
                return Err(KvStoreError::InvalidCursor(
                    "incomplete listing page carries no cursor".to_string(),
                ))
            }
        }
    }
    tracing::debug!(pages, keys = result.len(), "namespace scan finished");
    Ok(result)
}
