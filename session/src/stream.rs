//! Telephony media-stream wire types.
//!
//! The gateway speaks JSON text frames over the call's WebSocket:
//! `start` opens the stream and carries call metadata in custom
//! parameters, `media` carries base64 u-law audio, `mark` is an
//! application-level checkpoint echoed back by the gateway, `stop` ends
//! the stream. Outbound audio goes back as `media` messages keyed by the
//! stream id.

use std::collections::HashMap;

use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{Result, SessionError};

pub const EVENT_CONNECTED: &str = "connected";
pub const EVENT_START: &str = "start";
pub const EVENT_MEDIA: &str = "media";
pub const EVENT_MARK: &str = "mark";
pub const EVENT_STOP: &str = "stop";

/// Stream metadata delivered on `start`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartFrame {
    #[serde(default)]
    pub stream_sid: String,

    #[serde(default)]
    pub call_sid: String,

    /// Free-form parameters set by the gateway's call flow. The bridge
    /// reads `caller` (E.164 number) and `callback` ("true" when this
    /// call is an outbound callback).
    #[serde(default)]
    pub custom_parameters: HashMap<String, String>,
}

impl StartFrame {
    pub fn caller(&self) -> &str {
        self.custom_parameters
            .get("caller")
            .map(String::as_str)
            .unwrap_or("unknown")
    }

    pub fn is_callback(&self) -> bool {
        self.custom_parameters
            .get("callback")
            .is_some_and(|v| v == "true")
    }
}

/// Audio payload delivered on `media`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaFrame {
    /// Base64 u-law 8kHz audio.
    #[serde(default)]
    pub payload: String,
}

impl MediaFrame {
    /// Decodes the payload to raw u-law bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(&self.payload)
            .map_err(|e| SessionError::Frame(format!("bad media payload: {e}")))
    }
}

/// Checkpoint delivered on `mark`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarkFrame {
    #[serde(default)]
    pub name: String,
}

/// An inbound gateway event.
///
/// Permissive by design: unknown event types parse fine and are ignored
/// by the relay loop, so a gateway protocol addition never drops a call.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamEvent {
    #[serde(default)]
    pub event: String,

    #[serde(default)]
    pub start: Option<StartFrame>,

    #[serde(default)]
    pub media: Option<MediaFrame>,

    #[serde(default)]
    pub mark: Option<MarkFrame>,
}

impl StreamEvent {
    /// Parses one text frame. A parse failure is a frame-level error; the
    /// caller logs it and drops the frame.
    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| SessionError::Frame(e.to_string()))
    }

    pub fn is_start(&self) -> bool {
        self.event == EVENT_START
    }

    pub fn is_stop(&self) -> bool {
        self.event == EVENT_STOP
    }
}

/// Outbound media message carrying u-law audio to the gateway.
#[derive(Debug, Serialize)]
pub struct OutboundMedia<'a> {
    pub event: &'static str,
    #[serde(rename = "streamSid")]
    pub stream_sid: &'a str,
    pub media: OutboundPayload,
}

#[derive(Debug, Serialize)]
pub struct OutboundPayload {
    pub payload: String,
}

/// Renders an outbound media message for `ulaw` audio.
pub fn media_message(stream_sid: &str, ulaw: &[u8]) -> String {
    let message = OutboundMedia {
        event: EVENT_MEDIA,
        stream_sid,
        media: OutboundPayload {
            payload: base64::engine::general_purpose::STANDARD.encode(ulaw),
        },
    };
    // Serialization of this shape cannot fail.
    serde_json::to_string(&message).unwrap_or_else(|_| {
        json!({"event": EVENT_MEDIA, "streamSid": stream_sid, "media": {"payload": ""}})
            .to_string()
    })
}
