use crate::client::{ClientError, ZoneClient};
use serde::{Deserialize, Serialize};
use std::future::Future;
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts, including the first.
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 1000,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Delay after failed attempt `attempt` (0-based).
    pub fn delay_ms(&self, attempt: u32) -> u64 {
        let base = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        (base as u64).min(self.max_delay_ms)
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or attempts run out.
pub(crate) async fn with_retry<T, F, Fut>(config: &RetryConfig, mut op: F) -> Result<T, ClientError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    let attempts = config.max_retries.max(1);
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) if attempt + 1 >= attempts || !e.is_retryable() => return Err(e),
            Err(e) => {
                let delay = config.delay_ms(attempt);
                warn!(
                    attempt = attempt + 1,
                    max_retries = attempts,
                    delay_ms = delay,
                    error = %e,
                    "Retrying zone request"
                );
                tokio::time::sleep(tokio::time::Duration::from_millis(delay)).await;
                attempt += 1;
            }
        }
    }
}

impl ZoneClient {
    /// [`ZoneClient::get_value`] with exponential backoff on retryable failures.
    pub async fn get_value_with_retry(
        &self,
        key: &str,
        memory: Option<&str>,
        config: &RetryConfig,
    ) -> Result<Option<String>, ClientError> {
        with_retry(config, move || self.get_value(key, memory)).await
    }

    /// [`ZoneClient::set_value`] with exponential backoff on retryable failures.
    pub async fn set_value_with_retry(
        &self,
        key: &str,
        value: &str,
        memory: Option<&str>,
        config: &RetryConfig,
    ) -> Result<(), ClientError> {
        with_retry(config, move || self.set_value(key, value, memory)).await
    }
}
