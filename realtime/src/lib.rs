//! Client for the hosted conversational speech model.
//!
//! The model is a black-box bidirectional event stream over WebSocket:
//! the bridge sends session configuration, base64 PCM audio appends,
//! buffer commits, and response requests; it receives session lifecycle
//! events, voice-activity signals, audio deltas, transcripts, and errors.
//!
//! The socket is split into dedicated read and write tasks bridged over
//! channels, so callers never touch the socket from their own task and
//! events cross task boundaries through an explicit handoff.
//!
//! A small REST text client ([completions::TextClient]) rides along for
//! the offline summarization calls used by memory consolidation.

pub mod client;
pub mod completions;
pub mod error;
pub mod event;
pub mod session;
pub mod types;
pub mod websocket;

pub use client::Client;
pub use completions::TextClient;
pub use error::{ApiError, Error, Result};
pub use event::{EventError, ServerEvent};
pub use session::ModelSession;
pub use types::{DEFAULT_REALTIME_MODEL, SessionConfig};
pub use websocket::WebSocketSession;

pub use event::{
    EVENT_TYPE_ERROR, EVENT_TYPE_INPUT_AUDIO_BUFFER_APPEND, EVENT_TYPE_INPUT_AUDIO_BUFFER_COMMIT,
    EVENT_TYPE_INPUT_AUDIO_BUFFER_SPEECH_STARTED, EVENT_TYPE_INPUT_AUDIO_BUFFER_SPEECH_STOPPED,
    EVENT_TYPE_INPUT_TRANSCRIPTION_COMPLETED, EVENT_TYPE_RESPONSE_AUDIO_DELTA,
    EVENT_TYPE_RESPONSE_AUDIO_TRANSCRIPT_DONE, EVENT_TYPE_RESPONSE_CREATE,
    EVENT_TYPE_RESPONSE_DONE, EVENT_TYPE_SESSION_CREATED, EVENT_TYPE_SESSION_UPDATE,
    EVENT_TYPE_SESSION_UPDATED,
};
