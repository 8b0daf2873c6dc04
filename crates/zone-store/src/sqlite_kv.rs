//! SQLite-backed KvStore. Every namespace shares one `entries` table keyed by
//! `(namespace, key)`, so one database file can hold all memories and the token registry.

use crate::memory_kv::DEFAULT_PAGE_SIZE;
use async_trait::async_trait;
use rusqlite::OptionalExtension;
use std::path::Path;
use zone_types::{KeyEntry, KeyPage, KvStore, KvStoreError};

/// SQLite KvStore scoped to one namespace.
pub struct SqliteKvStore {
    conn: std::sync::Mutex<rusqlite::Connection>,
    namespace: String,
    page_size: usize,
}

impl SqliteKvStore {
    /// Open (or create) the database at `path` and scope the store to `namespace`.
    pub fn new(path: impl AsRef<Path>, namespace: &str) -> Result<Self, KvStoreError> {
        let conn =
            rusqlite::Connection::open(path).map_err(|e| KvStoreError::Other(e.to_string()))?;
        Self::from_connection(conn, namespace)
    }

    pub fn open_in_memory(namespace: &str) -> Result<Self, KvStoreError> {
        let conn = rusqlite::Connection::open_in_memory()
            .map_err(|e| KvStoreError::Other(e.to_string()))?;
        Self::from_connection(conn, namespace)
    }

    fn from_connection(conn: rusqlite::Connection, namespace: &str) -> Result<Self, KvStoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS entries (
                namespace TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (namespace, key)
            );
            "#,
        )
        .map_err(|e| KvStoreError::Other(e.to_string()))?;

        Ok(Self {
            conn: std::sync::Mutex::new(conn),
            namespace: namespace.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn with_conn<T, F>(&self, f: F) -> Result<T, KvStoreError>
    where
        F: FnOnce(&rusqlite::Connection) -> Result<T, rusqlite::Error>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| KvStoreError::Other(format!("failed to acquire lock: {}", e)))?;
        f(&conn).map_err(|e| KvStoreError::Other(e.to_string()))
    }
}

#[async_trait]
impl KvStore for SqliteKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, KvStoreError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT value FROM entries WHERE namespace = ?1 AND key = ?2",
                rusqlite::params![self.namespace, key],
                |row| row.get(0),
            )
            .optional()
        })
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), KvStoreError> {
        let now = chrono::Utc::now().to_rfc3339();
        self.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT INTO entries (namespace, key, value, updated_at)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT (namespace, key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at
                "#,
                rusqlite::params![self.namespace, key, value, now],
            )
            .map(|_| ())
        })
    }

    async fn delete(&self, key: &str) -> Result<(), KvStoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM entries WHERE namespace = ?1 AND key = ?2",
                rusqlite::params![self.namespace, key],
            )
            .map(|_| ())
        })
    }

    async fn list(&self, cursor: Option<&str>) -> Result<KeyPage, KvStoreError> {
        // One extra row tells whether another page exists.
        let limit = (self.page_size + 1) as i64;
        let mut names: Vec<String> = self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT key FROM entries
                WHERE namespace = ?1 AND (?2 IS NULL OR key > ?2)
                ORDER BY key
                LIMIT ?3
                "#,
            )?;
            let rows = stmt.query_map(rusqlite::params![self.namespace, cursor, limit], |row| {
                row.get::<_, String>(0)
            })?;
            let names = rows.collect::<Result<Vec<_>, _>>();
            names
        })?;

        let complete = names.len() <= self.page_size;
        names.truncate(self.page_size);
        let cursor = if complete { None } else { names.last().cloned() };
        Ok(KeyPage {
            keys: names.into_iter().map(|name| KeyEntry { name }).collect(),
            cursor,
            complete,
        })
    }
}
