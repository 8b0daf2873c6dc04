//! Server configuration from environment variables.
//!
//! | variable | meaning | default |
//! |---|---|---|
//! | `ZONE_LISTEN` | listen address | `0.0.0.0:8787` |
//! | `ZONE_MEMORIES` | comma-separated memory names to bind | none |
//! | `ZONE_TOKENS` | comma-separated tokens to provision in the registry | none |
//! | `ZONE_PAGE_SIZE` | keys per listing page | `1000` |
//! | `ZONE_STORE_TIMEOUT_MS` | bound on the store phase of a request | unbounded |
//! | `ZONE_SQLITE_PATH` | SQLite file for all stores (feature `sqlite`) | in-memory |

use crate::auth::Authorizer;
use crate::bindings::{binding_name, BindingError, MemoryBindings};
use crate::server::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use zone_store::{InMemoryKvStore, DEFAULT_PAGE_SIZE};
use zone_types::{KvStore, KvStoreError};

/// Registry namespace inside a shared SQLite file.
pub const TOKEN_REGISTRY_BINDING: &str = "API_TOKEN";

/// Marker stored for provisioned tokens; only presence is checked.
const TOKEN_MARKER: &str = "active";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {var}: {message}")]
    Invalid { var: &'static str, message: String },
    #[error("binding: {0}")]
    Binding(#[from] BindingError),
    #[error("store: {0}")]
    Store(#[from] KvStoreError),
    #[error("ZONE_SQLITE_PATH is set but this build lacks the `sqlite` feature")]
    SqliteUnavailable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    pub memories: Vec<String>,
    pub tokens: Vec<String>,
    pub page_size: usize,
    pub store_timeout: Option<Duration>,
    pub sqlite_path: Option<PathBuf>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable lookup (the environment in production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen = lookup("ZONE_LISTEN")
            .unwrap_or_else(|| "0.0.0.0:8787".to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                var: "ZONE_LISTEN",
                message: e.to_string(),
            })?;
        let page_size = match lookup("ZONE_PAGE_SIZE") {
            Some(raw) => parse_positive("ZONE_PAGE_SIZE", &raw)? as usize,
            None => DEFAULT_PAGE_SIZE,
        };
        let store_timeout = lookup("ZONE_STORE_TIMEOUT_MS")
            .map(|raw| parse_positive("ZONE_STORE_TIMEOUT_MS", &raw).map(Duration::from_millis))
            .transpose()?;
        Ok(Self {
            listen,
            memories: split_list(lookup("ZONE_MEMORIES")),
            tokens: split_list(lookup("ZONE_TOKENS")),
            page_size,
            store_timeout,
            sqlite_path: lookup("ZONE_SQLITE_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
        })
    }

    /// Create the stores, provision tokens, and bind every configured memory.
    pub async fn build_state(&self) -> Result<AppState, ConfigError> {
        let registry = self.open_store(TOKEN_REGISTRY_BINDING)?;
        for token in &self.tokens {
            registry.put(token, TOKEN_MARKER).await?;
        }

        let mut bindings = MemoryBindings::new();
        for memory in &self.memories {
            let store = self.open_store(&binding_name(memory))?;
            bindings.bind(memory, store)?;
        }

        if bindings.is_empty() {
            tracing::warn!("no memories bound; every request will fail with MEMORY_NOT_FOUND");
        }
        if self.store_timeout.is_none() {
            tracing::warn!("ZONE_STORE_TIMEOUT_MS unset; a hung store call hangs its request");
        }
        tracing::info!(
            bindings = ?bindings.binding_ids(),
            tokens = self.tokens.len(),
            persistent = self.sqlite_path.is_some(),
            "stores ready"
        );

        Ok(AppState::new(Authorizer::new(registry), bindings)
            .with_store_timeout(self.store_timeout))
    }

    #[cfg(feature = "sqlite")]
    fn open_store(&self, namespace: &str) -> Result<Arc<dyn KvStore>, ConfigError> {
        match &self.sqlite_path {
            Some(path) => Ok(Arc::new(
                zone_store::SqliteKvStore::new(path, namespace)?.with_page_size(self.page_size),
            )),
            None => Ok(Arc::new(InMemoryKvStore::with_page_size(self.page_size))),
        }
    }

    #[cfg(not(feature = "sqlite"))]
    fn open_store(&self, _namespace: &str) -> Result<Arc<dyn KvStore>, ConfigError> {
        if self.sqlite_path.is_some() {
            return Err(ConfigError::SqliteUnavailable);
        }
        Ok(Arc::new(InMemoryKvStore::with_page_size(self.page_size)))
    }
}

fn split_list(raw: Option<String>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

fn parse_positive(var: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::Invalid {
            var,
            message: format!("expected a positive integer, got '{}'", raw),
        }),
    }
}
