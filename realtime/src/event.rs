//! Event types on the model socket.

use serde::{Deserialize, Serialize};

// Client events (bridge -> model).
pub const EVENT_TYPE_SESSION_UPDATE: &str = "session.update";
pub const EVENT_TYPE_INPUT_AUDIO_BUFFER_APPEND: &str = "input_audio_buffer.append";
pub const EVENT_TYPE_INPUT_AUDIO_BUFFER_COMMIT: &str = "input_audio_buffer.commit";
pub const EVENT_TYPE_RESPONSE_CREATE: &str = "response.create";

// Server events (model -> bridge).
pub const EVENT_TYPE_ERROR: &str = "error";
pub const EVENT_TYPE_SESSION_CREATED: &str = "session.created";
pub const EVENT_TYPE_SESSION_UPDATED: &str = "session.updated";
pub const EVENT_TYPE_INPUT_AUDIO_BUFFER_SPEECH_STARTED: &str = "input_audio_buffer.speech_started";
pub const EVENT_TYPE_INPUT_AUDIO_BUFFER_SPEECH_STOPPED: &str = "input_audio_buffer.speech_stopped";
pub const EVENT_TYPE_INPUT_TRANSCRIPTION_COMPLETED: &str =
    "conversation.item.input_audio_transcription.completed";
pub const EVENT_TYPE_RESPONSE_AUDIO_DELTA: &str = "response.audio.delta";
pub const EVENT_TYPE_RESPONSE_AUDIO_TRANSCRIPT_DONE: &str = "response.audio_transcript.done";
pub const EVENT_TYPE_RESPONSE_DONE: &str = "response.done";

/// Session resource attached to lifecycle events.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionResource {
    #[serde(default)]
    pub id: String,
}

/// Error payload attached to error events.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventError {
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: String,
}

impl EventError {
    pub fn to_api_error(&self) -> crate::error::ApiError {
        crate::error::ApiError {
            error_type: self.error_type.clone(),
            code: self.code.clone(),
            message: self.message.clone(),
        }
    }
}

/// An event received from the model.
///
/// One permissive struct with optional fields rather than an enum per
/// event type: the service adds event types and fields freely, and an
/// unknown event must never be a parse error that kills the call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerEvent {
    #[serde(rename = "type", default)]
    pub event_type: String,

    #[serde(default)]
    pub event_id: Option<String>,

    /// Session info, on session.created / session.updated.
    #[serde(default)]
    pub session: Option<SessionResource>,

    /// Conversation item id, on transcription and speech events.
    #[serde(default)]
    pub item_id: Option<String>,

    /// Completed transcript, on transcription events.
    #[serde(default)]
    pub transcript: Option<String>,

    /// Base64 payload, on response.audio.delta.
    #[serde(default)]
    pub delta: Option<String>,

    #[serde(default)]
    pub response_id: Option<String>,

    #[serde(default)]
    pub error: Option<EventError>,

    /// Decoded audio, populated while parsing audio deltas.
    #[serde(skip)]
    pub audio: Option<Vec<u8>>,
}

impl ServerEvent {
    pub fn is_session_created(&self) -> bool {
        self.event_type == EVENT_TYPE_SESSION_CREATED
    }

    pub fn is_speech_stopped(&self) -> bool {
        self.event_type == EVENT_TYPE_INPUT_AUDIO_BUFFER_SPEECH_STOPPED
    }

    pub fn is_audio_delta(&self) -> bool {
        self.event_type == EVENT_TYPE_RESPONSE_AUDIO_DELTA
    }

    pub fn is_response_done(&self) -> bool {
        self.event_type == EVENT_TYPE_RESPONSE_DONE
    }

    pub fn is_error(&self) -> bool {
        self.event_type == EVENT_TYPE_ERROR
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_fields_tolerated() {
        let event: ServerEvent = serde_json::from_str(
            r#"{"type":"response.done","response_id":"r1","usage":{"tokens":12}}"#,
        )
        .unwrap();
        assert!(event.is_response_done());
        assert_eq!(event.response_id.as_deref(), Some("r1"));
    }

    #[test]
    fn test_transcription_event() {
        let event: ServerEvent = serde_json::from_str(
            r#"{"type":"conversation.item.input_audio_transcription.completed","item_id":"i1","transcript":"hello"}"#,
        )
        .unwrap();
        assert_eq!(event.event_type, EVENT_TYPE_INPUT_TRANSCRIPTION_COMPLETED);
        assert_eq!(event.transcript.as_deref(), Some("hello"));
    }
}
