//! Per-conversation rolling history and memory consolidation.
//!
//! Each caller maps deterministically to a conversation thread. A thread's
//! history is a bounded in-process buffer (capacity 500, oldest evicted
//! first) mirrored to the external memory service as a short-TTL recap so
//! conversations survive reconnects and process restarts. The in-memory
//! buffer is authoritative for the life of the process: durable-store
//! failures degrade, they never block a call.
//!
//! When a thread's buffer grows past the consolidation threshold, the
//! oldest turns are summarized into structured long-term memories (people,
//! facts, preferences, commitments) before FIFO eviction would silently
//! destroy them, then pruned.

pub mod consolidate;
pub mod error;
pub mod keys;
pub mod sink;
pub mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod testutil;

pub use consolidate::{
    CONSOLIDATE_THRESHOLD, CONSOLIDATE_WINDOW, Consolidator, ExtractedMemories, RETAIN_AFTER_CONSOLIDATE,
    Summarizer,
};
pub use error::{HistoryError, Result};
pub use keys::{dedup_key, recap_key, thread_id_for_caller};
pub use sink::MemorySink;
pub use store::{HISTORY_CAPACITY, HistoryStore};
pub use types::{Role, Turn};
