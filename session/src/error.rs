use thiserror::Error;

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors inside the bridge.
///
/// Frame-level errors are caught and logged at the relay loop, never
/// propagated far enough to kill a call; fatal socket errors end the call
/// through the Closing state instead of an error return.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Malformed telephony frame; the frame is dropped.
    #[error("session: bad stream frame: {0}")]
    Frame(String),

    /// Model socket operation failed.
    #[error("session: model error: {0}")]
    Model(#[from] callbridge_realtime::Error),

    /// Audio conversion failed for one frame.
    #[error("session: audio error: {0}")]
    Audio(#[from] callbridge_audio::AudioError),

    /// Telephony control API call failed.
    #[error("session: control api error: {0}")]
    ControlApi(String),

    /// Outbound telephony socket write failed.
    #[error("session: telephony send failed: {0}")]
    TelephonySend(String),

    #[error("session: invalid configuration: {0}")]
    InvalidConfig(String),
}
