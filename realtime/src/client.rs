//! Client handle for the model service.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::DEFAULT_REALTIME_MODEL;
use crate::websocket::WebSocketSession;

/// Default WebSocket endpoint.
pub const DEFAULT_WEBSOCKET_URL: &str = "wss://api.openai.com/v1/realtime";

/// Default HTTP endpoint for text completions.
pub const DEFAULT_HTTP_URL: &str = "https://api.openai.com/v1";

/// Model service client.
pub struct Client {
    config: Arc<ClientConfig>,
}

#[derive(Debug, Clone)]
pub(crate) struct ClientConfig {
    pub api_key: String,
    pub ws_url: String,
    pub http_url: String,
    pub model: String,
}

impl Client {
    /// Creates a client. The key is validated here so a missing credential
    /// surfaces at startup, not on the first call.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(Error::InvalidConfig("API key is required".to_string()));
        }

        Ok(Self {
            config: Arc::new(ClientConfig {
                api_key,
                ws_url: DEFAULT_WEBSOCKET_URL.to_string(),
                http_url: DEFAULT_HTTP_URL.to_string(),
                model: DEFAULT_REALTIME_MODEL.to_string(),
            }),
        })
    }

    /// Overrides the WebSocket URL (testing, proxies).
    pub fn with_websocket_url(mut self, url: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).ws_url = url.into();
        self
    }

    /// Overrides the HTTP URL.
    pub fn with_http_url(mut self, url: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).http_url = url.into();
        self
    }

    /// Overrides the realtime model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).model = model.into();
        self
    }

    /// Establishes a realtime WebSocket session.
    pub async fn connect_websocket(&self) -> Result<WebSocketSession> {
        WebSocketSession::connect(self.config.clone()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_api_key_rejected() {
        assert!(matches!(Client::new(""), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_builder_overrides() {
        let client = Client::new("sk-test")
            .unwrap()
            .with_websocket_url("ws://localhost:9999/v1/realtime")
            .with_model("gpt-4o-mini-realtime-preview");
        assert_eq!(client.config.ws_url, "ws://localhost:9999/v1/realtime");
        assert_eq!(client.config.model, "gpt-4o-mini-realtime-preview");
    }
}
