//! Shared test fakes.

use std::sync::Mutex;

use async_trait::async_trait;
use callbridge_memstore::{MemStoreError, MemoryRecord, SearchRequest, WriteRequest};

use crate::sink::MemorySink;

/// Capturing fake for the durable side.
#[derive(Default)]
pub(crate) struct FakeSink {
    pub writes: Mutex<Vec<WriteRequest>>,
    pub search_results: Mutex<Vec<MemoryRecord>>,
    pub fail: Mutex<bool>,
}

#[async_trait]
impl MemorySink for FakeSink {
    async fn write(&self, req: &WriteRequest) -> Result<String, MemStoreError> {
        if *self.fail.lock().unwrap() {
            return Err(MemStoreError::Status {
                status: 503,
                body: "down".into(),
            });
        }
        let mut writes = self.writes.lock().unwrap();
        writes.push(req.clone());
        Ok(format!("id-{}", writes.len()))
    }

    async fn search(&self, _req: &SearchRequest) -> Result<Vec<MemoryRecord>, MemStoreError> {
        if *self.fail.lock().unwrap() {
            return Err(MemStoreError::Status {
                status: 503,
                body: "down".into(),
            });
        }
        Ok(self.search_results.lock().unwrap().clone())
    }
}
