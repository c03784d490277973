//! Storage seam between history and the memory service.

use async_trait::async_trait;
use callbridge_memstore::{
    MemStoreClient, MemStoreError, MemoryRecord, SearchRequest, WriteRequest,
};

/// Where durable history artifacts go.
///
/// In production this is the HTTP memory service; tests substitute an
/// in-memory fake. Implementations are eventually consistent and fallible;
/// callers treat every error as transient.
#[async_trait]
pub trait MemorySink: Send + Sync {
    async fn write(&self, req: &WriteRequest) -> Result<String, MemStoreError>;

    async fn search(&self, req: &SearchRequest) -> Result<Vec<MemoryRecord>, MemStoreError>;
}

#[async_trait]
impl MemorySink for MemStoreClient {
    async fn write(&self, req: &WriteRequest) -> Result<String, MemStoreError> {
        MemStoreClient::write(self, req).await
    }

    async fn search(&self, req: &SearchRequest) -> Result<Vec<MemoryRecord>, MemStoreError> {
        MemStoreClient::search(self, req).await
    }
}
