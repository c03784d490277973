//! Per-call state.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::stream::StartFrame;
use callbridge_history::thread_id_for_caller;

/// Minimum buffered audio before a commit is worth issuing: 100ms at
/// 24kHz 16-bit mono. Committing less makes the model respond to near
/// silence.
pub const MIN_COMMIT_BYTES: usize = 4800;

/// Lifecycle of one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CallState {
    #[default]
    Idle,
    /// Establishing the model session.
    Connecting,
    /// Model session up; the agent speaks first.
    Greeting,
    /// Relaying caller audio upstream.
    Listening,
    /// Model response streaming back down.
    Responding,
    /// Transfer fired; awaiting the gateway's stream stop.
    Transferring,
    /// Teardown in progress.
    Closing,
    Closed,
}

impl CallState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallState::Idle => "idle",
            CallState::Connecting => "connecting",
            CallState::Greeting => "greeting",
            CallState::Listening => "listening",
            CallState::Responding => "responding",
            CallState::Transferring => "transferring",
            CallState::Closing => "closing",
            CallState::Closed => "closed",
        }
    }

    /// True while the relay loop should keep running.
    pub fn is_live(&self) -> bool {
        !matches!(self, CallState::Closing | CallState::Closed)
    }
}

impl std::fmt::Display for CallState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// All per-call state, owned exclusively by the call's handler task.
///
/// Everything the relay needs lives here explicitly (no closure-captured
/// stream ids); the only cross-call state is the history store, keyed by
/// `thread_id`.
#[derive(Debug)]
pub struct CallSession {
    /// Gateway call identifier, used for control-API redirects.
    pub call_sid: String,

    /// Normalized caller number.
    pub caller: String,

    /// Gateway media-stream identifier, echoed on outbound media.
    pub stream_sid: String,

    /// Conversation thread id; stable per caller across calls.
    pub thread_id: String,

    /// True when this call is an outbound callback.
    pub is_callback: bool,

    pub started_at: DateTime<Utc>,

    /// Destination this call was transferred to, if any. Recorded for the
    /// call log.
    pub transferred_to: Option<String>,

    state: CallState,

    /// Unflushed audio bytes sent upstream since the last commit.
    buffered_audio_bytes: usize,
}

impl CallSession {
    pub fn from_start(start: &StartFrame) -> Self {
        let caller = start.caller().to_string();
        Self {
            call_sid: start.call_sid.clone(),
            stream_sid: start.stream_sid.clone(),
            thread_id: thread_id_for_caller(&caller),
            caller,
            is_callback: start.is_callback(),
            started_at: Utc::now(),
            transferred_to: None,
            state: CallState::Idle,
            buffered_audio_bytes: 0,
        }
    }

    pub fn state(&self) -> CallState {
        self.state
    }

    pub fn set_state(&mut self, next: CallState) {
        if self.state != next {
            debug!(call_sid = %self.call_sid, from = %self.state, to = %next, "call state");
            self.state = next;
        }
    }

    /// Records audio bytes forwarded upstream since the last commit.
    pub fn add_buffered(&mut self, bytes: usize) {
        self.buffered_audio_bytes += bytes;
    }

    pub fn buffered(&self) -> usize {
        self.buffered_audio_bytes
    }

    /// True when enough audio is buffered to be worth committing.
    pub fn should_commit(&self) -> bool {
        self.buffered_audio_bytes >= MIN_COMMIT_BYTES
    }

    /// Resets the buffered count after a commit.
    pub fn reset_buffered(&mut self) {
        self.buffered_audio_bytes = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn start_frame() -> StartFrame {
        StartFrame {
            stream_sid: "MZ1".into(),
            call_sid: "CA1".into(),
            custom_parameters: HashMap::from([
                ("caller".to_string(), "+1 (555) 010-0199".to_string()),
                ("callback".to_string(), "true".to_string()),
            ]),
        }
    }

    #[test]
    fn test_from_start_derives_thread_id() {
        let call = CallSession::from_start(&start_frame());
        assert_eq!(call.thread_id, "thread:15550100199");
        assert!(call.is_callback);
        assert_eq!(call.state(), CallState::Idle);
    }

    #[test]
    fn test_commit_threshold() {
        let mut call = CallSession::from_start(&start_frame());
        call.add_buffered(MIN_COMMIT_BYTES - 1);
        assert!(!call.should_commit());
        call.add_buffered(1);
        assert!(call.should_commit());
        call.reset_buffered();
        assert_eq!(call.buffered(), 0);
        assert!(!call.should_commit());
    }

    #[test]
    fn test_state_liveness() {
        assert!(CallState::Listening.is_live());
        assert!(CallState::Transferring.is_live());
        assert!(!CallState::Closing.is_live());
        assert!(!CallState::Closed.is_live());
    }

    #[test]
    fn test_state_strings() {
        assert_eq!(CallState::Greeting.as_str(), "greeting");
        assert_eq!(CallState::Responding.to_string(), "responding");
    }
}
