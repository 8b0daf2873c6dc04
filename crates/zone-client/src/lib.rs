//! Remote client for the memzone API.
//!
//! Injects the caller's token into every request and turns `ok=false`
//! envelopes into [`ClientError::Api`]. Retry and caching are layered on top.

mod cache;
mod client;
mod retry;

pub use cache::{CachedClient, DEFAULT_CACHE_TTL};
pub use client::{ClientConfig, ClientError, ZoneClient};
pub use retry::RetryConfig;
pub use zone_types::{ErrorCode, ValueContent};
