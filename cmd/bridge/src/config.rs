//! Startup configuration.
//!
//! Identity and behavior come from a YAML file; credentials come from the
//! environment. Anything required is validated here, at startup, so a
//! missing credential is a process-exit error rather than a per-call
//! surprise.

use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use callbridge_intent::TransferRule;
use callbridge_session::AgentProfile;

/// The YAML agent configuration file.
#[derive(Debug, Deserialize)]
pub struct AgentConfig {
    pub agent: AgentProfile,

    #[serde(default)]
    pub transfer_rules: Vec<TransferRule>,
}

impl AgentConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading agent config {}", path.display()))?;
        let config: AgentConfig = serde_yaml::from_str(&text)
            .with_context(|| format!("parsing agent config {}", path.display()))?;
        if config.agent.name.trim().is_empty() {
            bail!("agent config: agent.name must not be empty");
        }
        Ok(config)
    }
}

/// Credentials and endpoints from the environment.
#[derive(Debug)]
pub struct Secrets {
    /// MODEL_API_KEY, required.
    pub model_api_key: String,

    /// MEMSTORE_URL / MEMSTORE_API_KEY; absent means memory-less mode.
    pub memstore_url: Option<String>,
    pub memstore_api_key: Option<String>,

    /// CALL_LOG_URL; absent disables call logging.
    pub calllog_url: Option<String>,

    /// TELEPHONY_ACCOUNT_SID / TELEPHONY_AUTH_TOKEN / TELEPHONY_API_BASE
    /// and PUBLIC_URL; all present enables live transfer.
    pub telephony_account_sid: Option<String>,
    pub telephony_auth_token: Option<String>,
    pub telephony_api_base: String,
    pub public_url: Option<String>,
}

impl Secrets {
    pub fn from_env() -> Result<Self> {
        let model_api_key = std::env::var("MODEL_API_KEY")
            .context("MODEL_API_KEY is required (conversational model credential)")?;

        Ok(Self {
            model_api_key,
            memstore_url: env_opt("MEMSTORE_URL"),
            memstore_api_key: env_opt("MEMSTORE_API_KEY"),
            calllog_url: env_opt("CALL_LOG_URL"),
            telephony_account_sid: env_opt("TELEPHONY_ACCOUNT_SID"),
            telephony_auth_token: env_opt("TELEPHONY_AUTH_TOKEN"),
            telephony_api_base: env_opt("TELEPHONY_API_BASE")
                .unwrap_or_else(|| "https://api.twilio.com".to_string()),
            public_url: env_opt("PUBLIC_URL"),
        })
    }
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_config_parses() {
        let yaml = r#"
agent:
  name: Ava
  base_persona: You are a friendly receptionist.
  voice: sage
  sliders:
    warmth: 80
    humor: 35
transfer_rules:
  - keyword: claims
    number: "1-800-435-7764"
    description: Claims department
"#;
        let config: AgentConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.agent.name, "Ava");
        assert_eq!(config.agent.sliders["warmth"], 80);
        assert_eq!(config.transfer_rules.len(), 1);
        assert_eq!(config.transfer_rules[0].keyword, "claims");
    }

    #[test]
    fn test_sliders_and_rules_default_empty() {
        let yaml = "agent:\n  name: Ava\n  base_persona: Hello.\n";
        let config: AgentConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.agent.sliders.is_empty());
        assert!(config.transfer_rules.is_empty());
        assert_eq!(config.agent.voice, "alloy");
    }
}
