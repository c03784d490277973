use thiserror::Error;

/// Result type for audio conversion operations.
pub type Result<T> = std::result::Result<T, AudioError>;

/// Errors that can occur during audio conversion.
#[derive(Error, Debug)]
pub enum AudioError {
    /// Malformed input buffer. Carrying on with a truncated buffer would
    /// desync 16-bit frame boundaries for the rest of the stream, so the
    /// caller must drop the frame instead.
    #[error("audio: decode error: {0}")]
    Decode(String),
}
