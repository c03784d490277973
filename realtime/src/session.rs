//! Session trait for the model socket.

use async_trait::async_trait;

use crate::error::Result;
use crate::event::ServerEvent;
use crate::types::SessionConfig;

/// Common interface to an established model session.
///
/// The production implementation is [crate::WebSocketSession]; tests
/// substitute fakes that record the event traffic.
#[async_trait]
pub trait ModelSession: Send + Sync {
    /// Pushes session configuration (voice, instructions, turn detection,
    /// audio formats). Call after session.created.
    async fn update_session(&self, config: &SessionConfig) -> Result<()>;

    /// Appends 24kHz PCM16 mono audio to the model's input buffer.
    async fn append_audio(&self, audio: &[u8]) -> Result<()>;

    /// Tells the model to stop buffering and form a user turn from what
    /// it has.
    async fn commit_input(&self) -> Result<()>;

    /// Requests a response. With server VAD on, the model mostly does
    /// this itself; the bridge calls it for its own commit cycles and the
    /// opening greeting.
    async fn create_response(&self, instructions: Option<&str>) -> Result<()>;

    /// Receives the next server event. `None` means the socket closed.
    async fn recv(&self) -> Option<Result<ServerEvent>>;

    /// Escape hatch for events without a helper.
    async fn send_raw(&self, event: serde_json::Value) -> Result<()>;

    /// Closes the session.
    async fn close(&self) -> Result<()>;
}
