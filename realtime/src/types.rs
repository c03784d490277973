//! Session configuration.

use serde_json::{Value, json};

/// Default realtime model.
pub const DEFAULT_REALTIME_MODEL: &str = "gpt-4o-realtime-preview";

/// Configuration pushed to the model with `session.update`.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Synthesized voice name.
    pub voice: Option<String>,

    /// Full system instructions for this call.
    pub instructions: Option<String>,

    /// Server-side voice activity detection. When off the bridge drives
    /// commits itself.
    pub server_vad: bool,

    /// Input audio format; the bridge always feeds 24kHz PCM16.
    pub input_audio_format: String,

    /// Output audio format requested from the model.
    pub output_audio_format: String,

    /// Enables transcription of caller audio; required for intent
    /// matching and history.
    pub input_transcription: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            voice: None,
            instructions: None,
            server_vad: true,
            input_audio_format: "pcm16".to_string(),
            output_audio_format: "pcm16".to_string(),
            input_transcription: true,
        }
    }
}

impl SessionConfig {
    /// Renders the `session` object for a session.update event.
    pub fn to_json_value(&self) -> Value {
        let mut session = json!({
            "modalities": ["text", "audio"],
            "input_audio_format": self.input_audio_format,
            "output_audio_format": self.output_audio_format,
        });

        if let Some(ref voice) = self.voice {
            session["voice"] = json!(voice);
        }
        if let Some(ref instructions) = self.instructions {
            session["instructions"] = json!(instructions);
        }

        session["turn_detection"] = if self.server_vad {
            json!({"type": "server_vad"})
        } else {
            Value::Null
        };

        if self.input_transcription {
            session["input_audio_transcription"] = json!({"model": "whisper-1"});
        }

        session
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_json() {
        let value = SessionConfig::default().to_json_value();
        assert_eq!(value["turn_detection"]["type"], "server_vad");
        assert_eq!(value["input_audio_format"], "pcm16");
        assert_eq!(value["input_audio_transcription"]["model"], "whisper-1");
        assert!(value.get("voice").is_none());
    }

    #[test]
    fn test_disabled_vad_is_null() {
        let config = SessionConfig {
            server_vad: false,
            ..Default::default()
        };
        assert!(config.to_json_value()["turn_detection"].is_null());
    }

    #[test]
    fn test_voice_and_instructions_pass_through() {
        let config = SessionConfig {
            voice: Some("sage".into()),
            instructions: Some("You are a receptionist.".into()),
            ..Default::default()
        };
        let value = config.to_json_value();
        assert_eq!(value["voice"], "sage");
        assert_eq!(value["instructions"], "You are a receptionist.");
    }
}
