//! Memory consolidation.
//!
//! Summarizes the oldest portion of a thread's rolling buffer into
//! structured long-term records before FIFO eviction destroys it. Runs
//! after recap flushes, off the audio hot path.

use std::sync::Arc;

use async_trait::async_trait;
use callbridge_memstore::{MemoryScope, MemoryType, WriteRequest};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{HistoryError, Result};
use crate::keys::dedup_key;
use crate::sink::MemorySink;
use crate::store::HistoryStore;
use crate::types::Turn;

/// Buffer size at which consolidation fires: 80% of capacity, so the
/// window is summarized before eviction starts silently dropping it.
pub const CONSOLIDATE_THRESHOLD: usize = 400;

/// How many of the oldest turns are consolidated per cycle. Never the
/// newest; recent context is still actively useful on the call.
pub const CONSOLIDATE_WINDOW: usize = 200;

/// Turns retained after a successful cycle.
pub const RETAIN_AFTER_CONSOLIDATE: usize = 300;

/// Per-line truncation when rendering the window, bounding prompt size.
const LINE_MAX_CHARS: usize = 200;

const PERSON_TTL_DAYS: u32 = 365;
const FACT_TTL_DAYS: u32 = 365;
const PREFERENCE_TTL_DAYS: u32 = 365;
/// Action items go stale much faster than biography.
const COMMITMENT_TTL_DAYS: u32 = 90;

/// Extraction instruction sent with the flattened window.
const EXTRACT_INSTRUCTIONS: &str = "\
Extract long-term memory from this conversation excerpt. Respond with \
strict JSON only, no prose, in exactly this shape: \
{\"people\":[{\"name\":\"\",\"relationship\":\"\"}],\
\"facts\":[{\"description\":\"\",\"value\":\"\"}],\
\"preferences\":[{\"category\":\"\",\"preference\":\"\"}],\
\"commitments\":[{\"description\":\"\",\"deadline\":\"\"}]}. \
Include only durable information worth remembering across calls. \
Use empty arrays when a category has nothing.";

/// Summarization seam. Production implements this against the
/// conversational model's text endpoint; tests substitute a fake.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Returns the model's raw response to `instructions` over `transcript`.
    async fn summarize(&self, instructions: &str, transcript: &str) -> Result<String>;
}

/// Structured extraction result.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractedMemories {
    #[serde(default)]
    pub people: Vec<ExtractedPerson>,
    #[serde(default)]
    pub facts: Vec<ExtractedFact>,
    #[serde(default)]
    pub preferences: Vec<ExtractedPreference>,
    #[serde(default)]
    pub commitments: Vec<ExtractedCommitment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractedPerson {
    pub name: String,
    #[serde(default)]
    pub relationship: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractedFact {
    pub description: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractedPreference {
    #[serde(default)]
    pub category: String,
    pub preference: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractedCommitment {
    pub description: String,
    #[serde(default)]
    pub deadline: String,
}

impl ExtractedMemories {
    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
            && self.facts.is_empty()
            && self.preferences.is_empty()
            && self.commitments.is_empty()
    }
}

/// Drives consolidation cycles for all threads.
pub struct Consolidator {
    history: Arc<HistoryStore>,
    sink: Arc<dyn MemorySink>,
    summarizer: Arc<dyn Summarizer>,
}

impl Consolidator {
    pub fn new(
        history: Arc<HistoryStore>,
        sink: Arc<dyn MemorySink>,
        summarizer: Arc<dyn Summarizer>,
    ) -> Self {
        Self {
            history,
            sink,
            summarizer,
        }
    }

    /// Runs one consolidation cycle if the thread has crossed the
    /// threshold; otherwise a cheap no-op. Call after every flush.
    ///
    /// Fail-safe ordering: the buffer is pruned only after extraction
    /// parsed and the records were written. A failed cycle leaves the
    /// buffer untouched and retries on the next threshold crossing;
    /// dedup keys make the retry idempotent.
    pub async fn maybe_consolidate(&self, thread_id: &str) {
        let size = self.history.size(thread_id).await;
        if size < CONSOLIDATE_THRESHOLD {
            return;
        }
        info!(%thread_id, size, "consolidating oldest history window");

        let window = self.history.oldest(thread_id, CONSOLIDATE_WINDOW).await;
        let transcript = render_window(&window);

        let extracted = match self.extract(&transcript).await {
            Ok(m) => m,
            Err(e) => {
                warn!(%thread_id, error = %e, "consolidation aborted, buffer left intact");
                return;
            }
        };

        if !extracted.is_empty() {
            if let Err(e) = self.write_all(thread_id, &extracted).await {
                warn!(%thread_id, error = %e, "memory write failed, will retry next crossing");
                return;
            }
        }

        self.history
            .prune_to_newest(thread_id, RETAIN_AFTER_CONSOLIDATE)
            .await;
        debug!(
            %thread_id,
            people = extracted.people.len(),
            facts = extracted.facts.len(),
            preferences = extracted.preferences.len(),
            commitments = extracted.commitments.len(),
            "consolidation cycle complete"
        );
    }

    async fn extract(&self, transcript: &str) -> Result<ExtractedMemories> {
        let raw = self
            .summarizer
            .summarize(EXTRACT_INSTRUCTIONS, transcript)
            .await?;
        let json = strip_code_fences(&raw);
        serde_json::from_str(json).map_err(|e| HistoryError::ExtractionParse(e.to_string()))
    }

    async fn write_all(&self, thread_id: &str, extracted: &ExtractedMemories) -> Result<()> {
        for p in &extracted.people {
            let content = format!("{} {}", p.name, p.relationship);
            self.write_one(
                thread_id,
                MemoryType::Person,
                dedup_key("person", &content),
                serde_json::json!({"name": p.name, "relationship": p.relationship}),
                PERSON_TTL_DAYS,
            )
            .await?;
        }
        for f in &extracted.facts {
            self.write_one(
                thread_id,
                MemoryType::Fact,
                dedup_key("fact", &f.description),
                serde_json::json!({"description": f.description, "value": f.value}),
                FACT_TTL_DAYS,
            )
            .await?;
        }
        for p in &extracted.preferences {
            let content = format!("{} {}", p.category, p.preference);
            self.write_one(
                thread_id,
                MemoryType::Preference,
                dedup_key("preference", &content),
                serde_json::json!({"category": p.category, "preference": p.preference}),
                PREFERENCE_TTL_DAYS,
            )
            .await?;
        }
        for c in &extracted.commitments {
            self.write_one(
                thread_id,
                MemoryType::Commitment,
                dedup_key("commitment", &c.description),
                serde_json::json!({"description": c.description, "deadline": c.deadline}),
                COMMITMENT_TTL_DAYS,
            )
            .await?;
        }
        Ok(())
    }

    async fn write_one(
        &self,
        thread_id: &str,
        record_type: MemoryType,
        key: String,
        value: serde_json::Value,
        ttl_days: u32,
    ) -> Result<()> {
        let req = WriteRequest {
            record_type,
            key,
            value,
            user_id: thread_id.to_string(),
            scope: MemoryScope::User,
            ttl_days,
        };
        self.sink.write(&req).await?;
        Ok(())
    }
}

/// Flattens the window into role-prefixed lines, each bounded to
/// [LINE_MAX_CHARS] characters.
fn render_window(window: &[Turn]) -> String {
    let mut out = String::new();
    for turn in window {
        let text: String = turn.text.chars().take(LINE_MAX_CHARS).collect();
        out.push_str(&format!("{}: {}\n", turn.role, text));
    }
    out
}

/// Models love wrapping JSON in markdown fences; tolerate that one quirk.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.trim_start_matches('\n')
        .strip_suffix("```")
        .unwrap_or(rest)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::FakeSink;
    use crate::types::Role;
    use std::sync::Mutex;

    struct FakeSummarizer {
        response: Mutex<String>,
        calls: Mutex<usize>,
    }

    impl FakeSummarizer {
        fn returning(response: &str) -> Arc<Self> {
            Arc::new(Self {
                response: Mutex::new(response.to_string()),
                calls: Mutex::new(0),
            })
        }

        fn call_count(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl Summarizer for FakeSummarizer {
        async fn summarize(&self, _instructions: &str, _transcript: &str) -> Result<String> {
            *self.calls.lock().unwrap() += 1;
            Ok(self.response.lock().unwrap().clone())
        }
    }

    const EXTRACTION: &str = r#"{
        "people": [{"name": "Ann", "relationship": "spouse"}],
        "facts": [{"description": "car", "value": "2019 Outback"}],
        "preferences": [],
        "commitments": [{"description": "call back Tuesday", "deadline": "Tuesday"}]
    }"#;

    async fn filled_store(n: usize) -> Arc<HistoryStore> {
        let store = Arc::new(HistoryStore::new(None));
        for i in 0..n {
            store.append("t", Role::User, format!("turn {i}")).await;
        }
        store
    }

    #[tokio::test]
    async fn test_below_threshold_is_noop() {
        let history = filled_store(399).await;
        let sink = Arc::new(FakeSink::default());
        let summarizer = FakeSummarizer::returning(EXTRACTION);
        let c = Consolidator::new(history.clone(), sink.clone(), summarizer.clone());

        c.maybe_consolidate("t").await;
        assert_eq!(summarizer.call_count(), 0);
        assert_eq!(history.size("t").await, 399);
    }

    #[tokio::test]
    async fn test_triggers_once_per_crossing() {
        let history = filled_store(400).await;
        let sink = Arc::new(FakeSink::default());
        let summarizer = FakeSummarizer::returning(EXTRACTION);
        let c = Consolidator::new(history.clone(), sink.clone(), summarizer.clone());

        c.maybe_consolidate("t").await;
        assert_eq!(summarizer.call_count(), 1);
        assert_eq!(history.size("t").await, RETAIN_AFTER_CONSOLIDATE);

        // 300 turns now; the next flush cycles are no-ops until 400 again.
        c.maybe_consolidate("t").await;
        assert_eq!(summarizer.call_count(), 1);
    }

    #[tokio::test]
    async fn test_writes_have_ttls_and_dedup_keys() {
        let history = filled_store(400).await;
        let sink = Arc::new(FakeSink::default());
        let summarizer = FakeSummarizer::returning(EXTRACTION);
        let c = Consolidator::new(history, sink.clone(), summarizer);

        c.maybe_consolidate("t").await;

        let writes = sink.writes.lock().unwrap();
        assert_eq!(writes.len(), 3);

        let person = writes.iter().find(|w| w.record_type == MemoryType::Person).unwrap();
        assert_eq!(person.ttl_days, 365);
        assert_eq!(person.key, dedup_key("person", "Ann spouse"));

        let commitment = writes
            .iter()
            .find(|w| w.record_type == MemoryType::Commitment)
            .unwrap();
        assert_eq!(commitment.ttl_days, 90);
    }

    #[tokio::test]
    async fn test_repeated_extraction_reuses_dedup_key() {
        // Two cycles extracting the same fact must produce the same key,
        // so the store keeps one record, not two.
        let sink = Arc::new(FakeSink::default());
        let summarizer = FakeSummarizer::returning(EXTRACTION);

        for _ in 0..2 {
            let history = filled_store(400).await;
            let c = Consolidator::new(history, sink.clone(), summarizer.clone());
            c.maybe_consolidate("t").await;
        }

        let writes = sink.writes.lock().unwrap();
        let fact_keys: Vec<&String> = writes
            .iter()
            .filter(|w| w.record_type == MemoryType::Fact)
            .map(|w| &w.key)
            .collect();
        assert_eq!(fact_keys.len(), 2);
        assert_eq!(fact_keys[0], fact_keys[1]);
    }

    #[tokio::test]
    async fn test_parse_failure_aborts_without_pruning() {
        let history = filled_store(450).await;
        let sink = Arc::new(FakeSink::default());
        let summarizer = FakeSummarizer::returning("sorry, I can't do that");
        let c = Consolidator::new(history.clone(), sink.clone(), summarizer);

        c.maybe_consolidate("t").await;
        assert_eq!(history.size("t").await, 450);
        assert!(sink.writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_write_failure_leaves_buffer_for_retry() {
        let history = filled_store(400).await;
        let sink = Arc::new(FakeSink::default());
        *sink.fail.lock().unwrap() = true;
        let summarizer = FakeSummarizer::returning(EXTRACTION);
        let c = Consolidator::new(history.clone(), sink.clone(), summarizer);

        c.maybe_consolidate("t").await;
        assert_eq!(history.size("t").await, 400);
    }

    #[tokio::test]
    async fn test_fenced_json_is_tolerated() {
        let history = filled_store(400).await;
        let sink = Arc::new(FakeSink::default());
        let fenced = format!("```json\n{EXTRACTION}\n```");
        let summarizer = FakeSummarizer::returning(&fenced);
        let c = Consolidator::new(history.clone(), sink.clone(), summarizer);

        c.maybe_consolidate("t").await;
        assert_eq!(history.size("t").await, RETAIN_AFTER_CONSOLIDATE);
    }

    #[test]
    fn test_render_window_truncates_lines() {
        let long = "x".repeat(500);
        let window = vec![Turn::new(Role::User, long), Turn::new(Role::Assistant, "ok")];
        let rendered = render_window(&window);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].len(), "user: ".len() + 200);
        assert_eq!(lines[1], "assistant: ok");
    }
}
