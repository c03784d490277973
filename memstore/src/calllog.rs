//! Best-effort call-log collaborator.

use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::error::{MemStoreError, Result};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// A completed-call record.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CallRecord {
    pub phone: String,
    pub transcript: String,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer_to: Option<String>,
}

#[derive(Debug, Serialize)]
struct CustomerUpsert<'a> {
    phone: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    spouse: Option<&'a str>,
}

/// HTTP client for the call-log collaborator.
///
/// Everything here is best-effort: callers run these during teardown and
/// must never let a logging failure block releasing the call.
pub struct CallLogClient {
    http: reqwest::Client,
    base_url: String,
}

impl CallLogClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into();
        if base_url.is_empty() {
            return Err(MemStoreError::InvalidConfig("call log base_url is required".into()));
        }

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()?;

        Ok(Self { http, base_url })
    }

    /// Creates or updates a customer record keyed by phone number.
    pub async fn upsert_customer(
        &self,
        phone: &str,
        name: Option<&str>,
        spouse: Option<&str>,
    ) -> Result<()> {
        let url = format!("{}/customers", self.base_url);
        debug!(%phone, "call log customer upsert");

        let body = CustomerUpsert { phone, name, spouse };
        self.check(self.http.post(&url).json(&body).send().await?)
            .await
    }

    /// Writes a call record.
    pub async fn log_call(&self, record: &CallRecord) -> Result<()> {
        let url = format!("{}/calls", self.base_url);
        debug!(phone = %record.phone, "call log write");

        self.check(self.http.post(&url).json(record).send().await?)
            .await
    }

    async fn check(&self, resp: reqwest::Response) -> Result<()> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(MemStoreError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_base_url_rejected() {
        assert!(CallLogClient::new("").is_err());
    }

    #[test]
    fn test_record_omits_missing_transfer() {
        let record = CallRecord {
            phone: "+15550100".into(),
            transcript: "hi".into(),
            summary: "greeting only".into(),
            transfer_to: None,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("transfer_to").is_none());
    }
}
