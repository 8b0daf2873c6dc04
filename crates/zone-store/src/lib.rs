//! KvStore implementations: in-memory and (feature `sqlite`) SQLite.

mod memory_kv;

#[cfg(feature = "sqlite")]
mod sqlite_kv;

pub use memory_kv::{InMemoryKvStore, DEFAULT_PAGE_SIZE};
#[cfg(feature = "sqlite")]
pub use sqlite_kv::SqliteKvStore;
pub use zone_types::{KeyEntry, KeyPage, KvStore, KvStoreError};
