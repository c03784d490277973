//! The media-stream bridge: one telephony call, one session.
//!
//! The telephony gateway opens a WebSocket per call and streams base64
//! u-law audio frames at it. This crate accepts that socket, stands up a
//! matching session on the conversational model's realtime socket, and
//! relays audio both ways through the codec converter while driving the
//! per-call state machine:
//!
//! ```text
//! Idle → Connecting → Greeting → Listening ⇄ Responding
//!                                   │
//!                                   ├→ Transferring
//!                                   └→ Closing → Closed
//! ```
//!
//! Caller transcripts feed the rolling history and the transfer intent
//! matcher; assistant transcripts feed history; response boundaries
//! trigger recap flushes and memory consolidation off the hot path.
//! Teardown is unconditional: every exit path flushes history, writes a
//! best-effort call log, and releases the model socket.

pub mod call;
pub mod error;
pub mod handler;
pub mod instructions;
pub mod server;
pub mod stream;
pub mod summarize;
pub mod transfer;

pub use call::{CallSession, CallState, MIN_COMMIT_BYTES};
pub use error::{Result, SessionError};
pub use handler::{CallDeps, handle_media_stream};
pub use instructions::{AgentProfile, InstructionInputs, assemble_instructions};
pub use server::router;
pub use stream::{MarkFrame, MediaFrame, StartFrame, StreamEvent};
pub use summarize::ModelSummarizer;
pub use transfer::{TransferConfig, TransferExecutor};
