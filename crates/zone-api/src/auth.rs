//! Token authorization against the registry store.

use crate::error::ApiError;
use std::sync::Arc;
use zone_types::{KvStore, KvStoreError};

/// Checks bearer tokens for presence in a registry store. Presence is validity;
/// the stored value is never interpreted.
#[derive(Clone)]
pub struct Authorizer {
    registry: Arc<dyn KvStore>,
}

impl Authorizer {
    pub fn new(registry: Arc<dyn KvStore>) -> Self {
        Self { registry }
    }

    /// `Ok(false)` for an absent or empty token without touching the registry.
    pub async fn authorize(&self, token: Option<&str>) -> Result<bool, KvStoreError> {
        match token {
            None | Some("") => Ok(false),
            Some(t) => Ok(self.registry.get(t).await?.is_some()),
        }
    }

    /// Like [`Authorizer::authorize`], but a denied token is an `INVALID_TOKEN` error.
    pub async fn require(&self, token: Option<&str>) -> Result<(), ApiError> {
        if self.authorize(token).await? {
            Ok(())
        } else {
            tracing::warn!(token_present = token.is_some(), "rejected request token");
            Err(ApiError::InvalidToken)
        }
    }
}
