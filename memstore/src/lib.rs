//! HTTP clients for the external collaborators.
//!
//! Two remote services live behind this crate:
//!
//! - the long-term memory service: a key-value + search store for
//!   structured memories and conversation recaps, with per-record TTLs
//! - the call-log collaborator: best-effort customer and call-record
//!   logging
//!
//! Both are remote, fallible, and independently available. Every request
//! carries an explicit timeout, and every error is typed so callers can
//! degrade instead of crashing: a call with an unreachable memory service
//! becomes a plain conversation with no memory, never a dropped call.
//!
//! The memory service sometimes returns structured JSON values and
//! sometimes a legacy concatenated string. That shape split is normalized
//! here at the client edge via [MemoryValue]; nothing above this crate
//! branches on response shape.

pub mod calllog;
pub mod client;
pub mod error;
pub mod types;

pub use calllog::{CallLogClient, CallRecord};
pub use client::{MemStoreClient, MemStoreConfig, SearchRequest, WriteRequest};
pub use error::{MemStoreError, Result};
pub use types::{MemoryRecord, MemoryScope, MemoryType, MemoryValue};
