//! The rolling history store.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use callbridge_memstore::{MemoryScope, MemoryType, SearchRequest, WriteRequest};
use tracing::{debug, warn};

use crate::keys::recap_key;
use crate::sink::MemorySink;
use crate::types::{Role, Turn};

/// Maximum turns kept in memory per thread. Oldest evicted first.
pub const HISTORY_CAPACITY: usize = 500;

/// Recap mirror TTL. The recap is a continuity cache for reconnects, not
/// long-term memory; a week of silence means the thread starts fresh.
const RECAP_TTL_DAYS: u32 = 7;

/// One thread's buffer. `loaded` lives on the entry itself so the
/// loaded-once lifecycle is visible state, not a parallel map.
#[derive(Default)]
struct ThreadBuffer {
    turns: VecDeque<Turn>,
    loaded: bool,
}

/// Process-wide keyed store of per-thread rolling buffers.
///
/// Injected into session handlers rather than accessed as a global. The
/// per-thread `tokio::sync::Mutex` serializes appends from near-simultaneous
/// calls by the same caller; threads never contend with each other.
pub struct HistoryStore {
    sink: Option<Arc<dyn MemorySink>>,
    threads: Mutex<HashMap<String, Arc<tokio::sync::Mutex<ThreadBuffer>>>>,
}

impl HistoryStore {
    /// Creates a store mirroring to `sink`, or memory-only when `None`
    /// (degraded mode: the memory service is unreachable or unconfigured).
    pub fn new(sink: Option<Arc<dyn MemorySink>>) -> Self {
        Self {
            sink,
            threads: Mutex::new(HashMap::new()),
        }
    }

    fn entry(&self, thread_id: &str) -> Arc<tokio::sync::Mutex<ThreadBuffer>> {
        let mut threads = self.threads.lock().unwrap();
        threads
            .entry(thread_id.to_string())
            .or_default()
            .clone()
    }

    /// Loads the durable recap into the buffer, once per process lifetime.
    ///
    /// Idempotent: subsequent calls are no-ops. The thread is marked loaded
    /// even when the fetch fails, so an unreachable store cannot cause a
    /// retry storm; the in-memory buffer is authoritative from here on.
    pub async fn load(&self, thread_id: &str) {
        let entry = self.entry(thread_id);
        let mut buffer = entry.lock().await;
        if buffer.loaded {
            return;
        }
        buffer.loaded = true;

        let Some(sink) = &self.sink else {
            return;
        };

        let req = SearchRequest {
            query: recap_key(thread_id),
            user_id: thread_id.to_string(),
            k: 1,
            types: vec![MemoryType::Recap],
            include_shared: false,
        };

        match sink.search(&req).await {
            Ok(records) => {
                let Some(record) = records.into_iter().next() else {
                    debug!(%thread_id, "no recap stored, starting fresh");
                    return;
                };
                match record
                    .value
                    .as_json()
                    .and_then(|v| serde_json::from_value::<Vec<Turn>>(v.clone()).ok())
                {
                    Some(turns) => {
                        debug!(%thread_id, turns = turns.len(), "recap loaded");
                        buffer.turns = turns.into_iter().collect();
                        truncate_oldest(&mut buffer.turns);
                    }
                    None => warn!(%thread_id, "recap value has unexpected shape, ignoring"),
                }
            }
            Err(e) => warn!(%thread_id, error = %e, "recap load failed, continuing without"),
        }
    }

    /// Appends a turn, evicting the oldest once at capacity.
    pub async fn append(&self, thread_id: &str, role: Role, text: impl Into<String>) {
        let entry = self.entry(thread_id);
        let mut buffer = entry.lock().await;
        buffer.turns.push_back(Turn::new(role, text));
        truncate_oldest(&mut buffer.turns);
    }

    /// Mirrors the current buffer to the durable store under the thread's
    /// recap key. Failures are logged and swallowed; the buffer stays
    /// authoritative either way.
    pub async fn flush(&self, thread_id: &str) {
        let Some(sink) = &self.sink else {
            return;
        };

        let turns: Vec<Turn> = {
            let entry = self.entry(thread_id);
            let buffer = entry.lock().await;
            buffer.turns.iter().cloned().collect()
        };
        if turns.is_empty() {
            return;
        }

        let value = match serde_json::to_value(&turns) {
            Ok(v) => v,
            Err(e) => {
                warn!(%thread_id, error = %e, "recap serialization failed");
                return;
            }
        };

        let req = WriteRequest {
            record_type: MemoryType::Recap,
            key: recap_key(thread_id),
            value,
            user_id: thread_id.to_string(),
            scope: MemoryScope::User,
            ttl_days: RECAP_TTL_DAYS,
        };

        match sink.write(&req).await {
            Ok(_) => debug!(%thread_id, turns = turns.len(), "recap flushed"),
            Err(e) => warn!(%thread_id, error = %e, "recap flush failed, keeping in-memory buffer"),
        }
    }

    /// Current turn count for a thread.
    pub async fn size(&self, thread_id: &str) -> usize {
        let entry = self.entry(thread_id);
        entry.lock().await.turns.len()
    }

    /// The most recent `n` turns, oldest first.
    pub async fn recent(&self, thread_id: &str, n: usize) -> Vec<Turn> {
        let entry = self.entry(thread_id);
        let buffer = entry.lock().await;
        let skip = buffer.turns.len().saturating_sub(n);
        buffer.turns.iter().skip(skip).cloned().collect()
    }

    /// The oldest `n` turns, oldest first. Consolidation window.
    pub async fn oldest(&self, thread_id: &str, n: usize) -> Vec<Turn> {
        let entry = self.entry(thread_id);
        let buffer = entry.lock().await;
        buffer.turns.iter().take(n).cloned().collect()
    }

    /// Drops everything but the newest `n` turns.
    pub async fn prune_to_newest(&self, thread_id: &str, n: usize) {
        let entry = self.entry(thread_id);
        let mut buffer = entry.lock().await;
        while buffer.turns.len() > n {
            buffer.turns.pop_front();
        }
    }
}

fn truncate_oldest(turns: &mut VecDeque<Turn>) {
    while turns.len() > HISTORY_CAPACITY {
        turns.pop_front();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::FakeSink;
    use callbridge_memstore::MemoryRecord;

    #[tokio::test]
    async fn test_append_bounds_to_capacity() {
        let store = HistoryStore::new(None);
        for i in 0..600 {
            store.append("t", Role::User, format!("turn {i}")).await;
        }
        assert_eq!(store.size("t").await, HISTORY_CAPACITY);

        // Exactly the most recent 500, oldest first.
        let turns = store.recent("t", HISTORY_CAPACITY).await;
        assert_eq!(turns.first().unwrap().text, "turn 100");
        assert_eq!(turns.last().unwrap().text, "turn 599");
    }

    #[tokio::test]
    async fn test_load_replaces_buffer_and_is_idempotent() {
        let sink = Arc::new(FakeSink::default());
        let stored = vec![
            Turn::new(Role::User, "earlier question"),
            Turn::new(Role::Assistant, "earlier answer"),
        ];
        sink.search_results.lock().unwrap().push(MemoryRecord {
            id: "r1".into(),
            record_type: MemoryType::Recap,
            key: "recap:thread:1".into(),
            value: callbridge_memstore::MemoryValue::Structured(
                serde_json::to_value(&stored).unwrap(),
            ),
            user_id: None,
            scope: MemoryScope::User,
        });

        let store = HistoryStore::new(Some(sink.clone()));
        store.load("thread:1").await;
        assert_eq!(store.size("thread:1").await, 2);

        // A second load must not re-fetch or clobber new appends.
        store.append("thread:1", Role::User, "new").await;
        store.load("thread:1").await;
        assert_eq!(store.size("thread:1").await, 3);
    }

    #[tokio::test]
    async fn test_load_failure_marks_loaded() {
        let sink = Arc::new(FakeSink::default());
        *sink.fail.lock().unwrap() = true;

        let store = HistoryStore::new(Some(sink.clone()));
        store.load("t").await;
        assert_eq!(store.size("t").await, 0);

        // Store recovers, but the thread stays memory-only: no retry storm.
        *sink.fail.lock().unwrap() = false;
        store.load("t").await;
        assert_eq!(store.size("t").await, 0);
    }

    #[tokio::test]
    async fn test_flush_writes_recap_with_short_ttl() {
        let sink = Arc::new(FakeSink::default());
        let store = HistoryStore::new(Some(sink.clone()));

        store.append("thread:9", Role::User, "hi").await;
        store.append("thread:9", Role::Assistant, "hello there").await;
        store.flush("thread:9").await;

        let writes = sink.writes.lock().unwrap();
        assert_eq!(writes.len(), 1);
        let w = &writes[0];
        assert_eq!(w.record_type, MemoryType::Recap);
        assert_eq!(w.key, "recap:thread:9");
        assert_eq!(w.ttl_days, 7);
        let turns: Vec<Turn> = serde_json::from_value(w.value.clone()).unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].text, "hi");
    }

    #[tokio::test]
    async fn test_flush_failure_keeps_buffer() {
        let sink = Arc::new(FakeSink::default());
        *sink.fail.lock().unwrap() = true;

        let store = HistoryStore::new(Some(sink.clone()));
        store.append("t", Role::User, "hi").await;
        store.flush("t").await;
        assert_eq!(store.size("t").await, 1);
    }

    #[tokio::test]
    async fn test_oldest_and_prune() {
        let store = HistoryStore::new(None);
        for i in 0..10 {
            store.append("t", Role::User, format!("{i}")).await;
        }

        let oldest = store.oldest("t", 3).await;
        assert_eq!(
            oldest.iter().map(|t| t.text.as_str()).collect::<Vec<_>>(),
            vec!["0", "1", "2"]
        );

        store.prune_to_newest("t", 4).await;
        let rest = store.recent("t", 10).await;
        assert_eq!(
            rest.iter().map(|t| t.text.as_str()).collect::<Vec<_>>(),
            vec!["6", "7", "8", "9"]
        );
    }
}
