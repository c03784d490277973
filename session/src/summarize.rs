//! Summarizer implementation over the model's text endpoint.

use async_trait::async_trait;

use callbridge_history::{HistoryError, Summarizer};
use callbridge_realtime::TextClient;

/// Bridges memory consolidation's [Summarizer] seam to the conversational
/// model's completion endpoint.
pub struct ModelSummarizer {
    text: TextClient,
}

impl ModelSummarizer {
    pub fn new(text: TextClient) -> Self {
        Self { text }
    }
}

#[async_trait]
impl Summarizer for ModelSummarizer {
    async fn summarize(
        &self,
        instructions: &str,
        transcript: &str,
    ) -> Result<String, HistoryError> {
        self.text
            .complete(instructions, transcript)
            .await
            .map_err(|e| HistoryError::Summarize(e.to_string()))
    }
}
