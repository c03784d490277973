//! Live-call transfer via the telephony control API.

use std::time::Duration;

use tracing::{info, warn};
use url::Url;

use crate::error::{Result, SessionError};

/// Control-API calls run off the audio path but still bound teardown.
const CONTROL_API_TIMEOUT: Duration = Duration::from_secs(10);

/// Telephony control API configuration.
#[derive(Debug, Clone)]
pub struct TransferConfig {
    /// Gateway account identifier.
    pub account_sid: String,
    /// Gateway auth token.
    pub auth_token: String,
    /// Control API base, e.g. "https://api.twilio.com".
    pub api_base: String,
    /// Public base URL of this service; the gateway fetches the transfer
    /// call-flow from here.
    pub public_url: String,
}

/// Redirects live calls to a transfer call-flow that dials the matched
/// destination.
pub struct TransferExecutor {
    http: reqwest::Client,
    config: TransferConfig,
}

impl TransferExecutor {
    pub fn new(config: TransferConfig) -> Result<Self> {
        if config.account_sid.is_empty() || config.auth_token.is_empty() {
            return Err(SessionError::InvalidConfig(
                "transfer requires account_sid and auth_token".into(),
            ));
        }
        if config.public_url.is_empty() {
            return Err(SessionError::InvalidConfig(
                "transfer requires the service public_url".into(),
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(CONTROL_API_TIMEOUT)
            .build()
            .map_err(|e| SessionError::ControlApi(e.to_string()))?;

        Ok(Self { http, config })
    }

    /// Redirects the live call to the transfer flow for `destination`.
    ///
    /// Fire once, no retry: a failed redirect surfaces to the caller as
    /// the conversation continuing, which beats repeatedly yanking the
    /// call's control flow.
    pub async fn transfer(
        &self,
        call_sid: &str,
        destination: &str,
        matched_keyword: &str,
    ) -> Result<()> {
        let redirect = build_redirect_url(&self.config.public_url, destination, matched_keyword)?;
        info!(%call_sid, %destination, %matched_keyword, "redirecting call for transfer");

        let url = format!(
            "{}/2010-04-01/Accounts/{}/Calls/{}.json",
            self.config.api_base, self.config.account_sid, call_sid
        );

        let resp = self
            .http
            .post(&url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&[("Url", redirect.as_str()), ("Method", "POST")])
            .send()
            .await
            .map_err(|e| SessionError::ControlApi(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(%call_sid, %status, "transfer redirect rejected");
            return Err(SessionError::ControlApi(format!(
                "redirect returned {status}: {body}"
            )));
        }

        Ok(())
    }
}

/// Builds the URL the redirected call fetches its next call-flow from,
/// carrying destination and keyword as query parameters.
fn build_redirect_url(public_url: &str, destination: &str, keyword: &str) -> Result<Url> {
    let base = Url::parse(public_url)
        .map_err(|e| SessionError::InvalidConfig(format!("bad public_url: {e}")))?;
    let mut url = base
        .join("transfer")
        .map_err(|e| SessionError::InvalidConfig(format!("bad public_url: {e}")))?;
    url.query_pairs_mut()
        .append_pair("dest", destination)
        .append_pair("keyword", keyword);
    Ok(url)
}
