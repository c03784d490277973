//! Client for the long-term memory service.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{MemStoreError, Result};
use crate::types::{MemoryRecord, MemoryScope, MemoryType};

/// Default per-request timeout. Memory reads happen while a caller is on
/// the line, so waiting longer than this is worse than not answering.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Memory service configuration.
#[derive(Debug, Clone)]
pub struct MemStoreConfig {
    /// Service base URL, e.g. "https://memory.internal:8080".
    pub base_url: String,
    /// Optional bearer token.
    pub api_key: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl MemStoreConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// A record write.
#[derive(Debug, Clone, Serialize)]
pub struct WriteRequest {
    #[serde(rename = "type")]
    pub record_type: MemoryType,
    pub key: String,
    pub value: Value,
    pub user_id: String,
    pub scope: MemoryScope,
    pub ttl_days: u32,
}

/// A search query.
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest {
    pub query: String,
    pub user_id: String,
    pub k: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<MemoryType>,
    pub include_shared: bool,
}

#[derive(Debug, Deserialize)]
struct WriteResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<MemoryRecord>,
}

/// HTTP client for the memory service.
#[derive(Debug)]
pub struct MemStoreClient {
    http: reqwest::Client,
    config: MemStoreConfig,
}

impl MemStoreClient {
    /// Creates a new client. Fails only on configuration problems; the
    /// service itself is not contacted here.
    pub fn new(config: MemStoreConfig) -> Result<Self> {
        if config.base_url.is_empty() {
            return Err(MemStoreError::InvalidConfig("base_url is required".into()));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self { http, config })
    }

    /// Stores a record and returns its service-assigned id.
    pub async fn write(&self, req: &WriteRequest) -> Result<String> {
        let url = format!("{}/memories", self.config.base_url);
        debug!(key = %req.key, record_type = req.record_type.as_str(), "memstore write");

        let resp = self.request(self.http.post(&url).json(req)).await?;
        let body: WriteResponse = resp
            .json()
            .await
            .map_err(|e| MemStoreError::Decode(e.to_string()))?;
        Ok(body.id)
    }

    /// Searches records for a user. Results are already shape-normalized
    /// via [crate::MemoryValue].
    pub async fn search(&self, req: &SearchRequest) -> Result<Vec<MemoryRecord>> {
        let url = format!("{}/memories/search", self.config.base_url);
        debug!(query = %req.query, k = req.k, "memstore search");

        let resp = self.request(self.http.post(&url).json(req)).await?;
        let body: SearchResponse = resp
            .json()
            .await
            .map_err(|e| MemStoreError::Decode(e.to_string()))?;
        Ok(body.results)
    }

    async fn request(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let builder = match &self.config.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        };

        let resp = builder.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(MemStoreError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp)
    }
}
