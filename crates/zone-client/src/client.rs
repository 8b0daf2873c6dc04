//! HTTP client for the zone endpoints.

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use zone_types::{ApiResponse, ErrorCode, ValueContent};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server answered with an error envelope.
    #[error("API Error: {code} - {message}")]
    Api { code: ErrorCode, message: String },
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected response ({status}): {message}")]
    Decode { status: u16, message: String },
    #[error("payload must be a JSON object")]
    InvalidPayload,
    #[error("missing configuration: {0}")]
    Config(&'static str),
}

impl ClientError {
    /// Transport failures and server-side faults; never auth or validation errors.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Http(_) => true,
            ClientError::Decode { status, .. } => *status >= 500,
            ClientError::Api { code, .. } => *code == ErrorCode::InternalError,
            ClientError::InvalidPayload | ClientError::Config(_) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL including the API prefix, e.g. `https://host/v1/zone`.
    pub base_url: String,
    pub token: String,
    /// Memory used when a call passes `None`.
    pub default_memory: String,
}

impl ClientConfig {
    /// `ZONE_BASE_URL` and `ZONE_TOKEN` are required; `ZONE_DEFAULT_MEMORY` defaults to `default`.
    pub fn from_env() -> Result<Self, ClientError> {
        let base_url =
            std::env::var("ZONE_BASE_URL").map_err(|_| ClientError::Config("ZONE_BASE_URL"))?;
        let token = std::env::var("ZONE_TOKEN").map_err(|_| ClientError::Config("ZONE_TOKEN"))?;
        let default_memory =
            std::env::var("ZONE_DEFAULT_MEMORY").unwrap_or_else(|_| "default".to_string());
        Ok(Self {
            base_url,
            token,
            default_memory,
        })
    }
}

#[derive(Clone)]
pub struct ZoneClient {
    client: reqwest::Client,
    config: ClientConfig,
}

impl ZoneClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn from_env() -> Result<Self, ClientError> {
        Ok(Self::new(ClientConfig::from_env()?))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn memory<'a>(&'a self, memory: Option<&'a str>) -> &'a str {
        memory.unwrap_or(&self.config.default_memory)
    }

    /// Send `payload` (a JSON object) to `endpoint` with the token added.
    /// Returns the envelope content; an `ok=false` envelope becomes [`ClientError::Api`].
    pub async fn call<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        method: Method,
        payload: Value,
    ) -> Result<Option<T>, ClientError> {
        let mut body = match payload {
            Value::Object(fields) => fields,
            _ => return Err(ClientError::InvalidPayload),
        };
        body.insert("token".to_string(), Value::String(self.config.token.clone()));

        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint);
        let res = self.client.request(method, &url).json(&body).send().await?;
        let status = res.status();
        let text = res.text().await?;
        let envelope: ApiResponse<T> =
            serde_json::from_str(&text).map_err(|e| ClientError::Decode {
                status: status.as_u16(),
                message: format!("{}: {}", e, text),
            })?;
        envelope
            .into_result()
            .map_err(|e| ClientError::Api {
                code: e.code,
                message: e.message,
            })
    }

    /// Value for `key`; `None` when absent. An empty string is returned as-is.
    pub async fn get_value(
        &self,
        key: &str,
        memory: Option<&str>,
    ) -> Result<Option<String>, ClientError> {
        let content: Option<ValueContent> = self
            .call(
                "/get",
                Method::POST,
                json!({ "key": key, "memory": self.memory(memory) }),
            )
            .await?;
        Ok(content.and_then(|c| c.value))
    }

    pub async fn set_value(
        &self,
        key: &str,
        value: &str,
        memory: Option<&str>,
    ) -> Result<(), ClientError> {
        self.call::<ValueContent>(
            "/set",
            Method::POST,
            json!({ "key": key, "value": value, "memory": self.memory(memory) }),
        )
        .await?;
        Ok(())
    }

    pub async fn delete_key(&self, key: &str, memory: Option<&str>) -> Result<(), ClientError> {
        self.call::<Value>(
            "/delete",
            Method::DELETE,
            json!({ "key": key, "memory": self.memory(memory) }),
        )
        .await?;
        Ok(())
    }

    pub async fn exists_key(&self, key: &str, memory: Option<&str>) -> Result<bool, ClientError> {
        let present: Option<bool> = self
            .call(
                "/exists",
                Method::POST,
                json!({ "key": key, "memory": self.memory(memory) }),
            )
            .await?;
        Ok(present == Some(true))
    }

    pub async fn get_multiple(
        &self,
        keys: &[&str],
        memory: Option<&str>,
    ) -> Result<BTreeMap<String, Option<String>>, ClientError> {
        let values = self
            .call(
                "/mget",
                Method::POST,
                json!({ "key": keys, "memory": self.memory(memory) }),
            )
            .await?;
        Ok(values.unwrap_or_default())
    }

    pub async fn set_multiple(
        &self,
        entries: &BTreeMap<String, String>,
        memory: Option<&str>,
    ) -> Result<(), ClientError> {
        self.call::<Value>(
            "/mset",
            Method::POST,
            json!({ "key": entries, "memory": self.memory(memory) }),
        )
        .await?;
        Ok(())
    }

    /// Every key and value in the memory.
    pub async fn get_all(
        &self,
        memory: Option<&str>,
    ) -> Result<BTreeMap<String, Option<String>>, ClientError> {
        let values = self
            .call(
                "/keys",
                Method::POST,
                json!({ "memory": self.memory(memory) }),
            )
            .await?;
        Ok(values.unwrap_or_default())
    }

    pub async fn delete_multiple(
        &self,
        keys: &[&str],
        memory: Option<&str>,
    ) -> Result<(), ClientError> {
        self.call::<Value>(
            "/mdelete",
            Method::DELETE,
            json!({ "value": keys, "memory": self.memory(memory) }),
        )
        .await?;
        Ok(())
    }

    /// Like [`ZoneClient::get_value`], but any failure or absent value yields `default`.
    pub async fn safe_get_value(
        &self,
        key: &str,
        memory: Option<&str>,
        default: Option<String>,
    ) -> Option<String> {
        match self.get_value(key, memory).await {
            Ok(Some(value)) => Some(value),
            Ok(None) => default,
            Err(e) => {
                tracing::error!(key, error = %e, "get failed; using default");
                default
            }
        }
    }
}
