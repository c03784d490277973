//! Error types for the model client.

use thiserror::Error;

/// Result type for model client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from the realtime socket or the text endpoint.
#[derive(Error, Debug)]
pub enum Error {
    #[error("realtime: connection error: {0}")]
    Connection(String),

    #[error("realtime: websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("realtime: http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("realtime: json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("realtime: api error: {}: {}", .0.code.as_deref().unwrap_or("unknown"), .0.message)]
    Api(ApiError),

    #[error("realtime: session closed")]
    SessionClosed,

    #[error("realtime: invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("realtime: timeout: {0}")]
    Timeout(String),
}

/// Error payload reported by the service.
#[derive(Debug, Clone, Default)]
pub struct ApiError {
    pub error_type: Option<String>,
    pub code: Option<String>,
    pub message: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.code, &self.error_type) {
            (Some(code), _) => write!(f, "{}: {}", code, self.message),
            (None, Some(t)) => write!(f, "{}: {}", t, self.message),
            (None, None) => write!(f, "{}", self.message),
        }
    }
}
