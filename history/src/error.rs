use thiserror::Error;

/// Result type for history operations.
pub type Result<T> = std::result::Result<T, HistoryError>;

/// Errors from history persistence and consolidation.
#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("history: store error: {0}")]
    Store(#[from] callbridge_memstore::MemStoreError),

    #[error("history: summarization failed: {0}")]
    Summarize(String),

    #[error("history: extraction parse error: {0}")]
    ExtractionParse(String),
}
