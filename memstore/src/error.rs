use thiserror::Error;

/// Result type for memory-service and call-log operations.
pub type Result<T> = std::result::Result<T, MemStoreError>;

/// Errors from the external collaborators.
///
/// All of these are transient from the call's point of view: callers log
/// and degrade, they never tear a call down over one of these.
#[derive(Error, Debug)]
pub enum MemStoreError {
    #[error("memstore: http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("memstore: unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("memstore: decode error: {0}")]
    Decode(String),

    #[error("memstore: invalid configuration: {0}")]
    InvalidConfig(String),
}
