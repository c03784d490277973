//! bridge - voice-call orchestration bridge server.
//!
//! Accepts telephony media streams, relays them against the hosted
//! conversational model, and serves the transfer/health endpoints.

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use callbridge_history::{Consolidator, HistoryStore, MemorySink};
use callbridge_memstore::{CallLogClient, MemStoreClient, MemStoreConfig};
use callbridge_realtime::{Client as ModelClient, TextClient, client::DEFAULT_HTTP_URL};
use callbridge_session::{CallDeps, ModelSummarizer, TransferConfig, TransferExecutor, router};

use config::{AgentConfig, Secrets};

/// Voice-call orchestration bridge server.
#[derive(Parser, Debug)]
#[command(name = "bridge")]
#[command(about = "Bridges telephony media streams to the conversational model")]
struct Args {
    /// Listen address.
    #[arg(short, long, default_value = "0.0.0.0:8080")]
    addr: String,

    /// Agent configuration file (YAML).
    #[arg(short, long, default_value = "agent.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let agent_config = AgentConfig::load(&args.config)?;
    let secrets = Secrets::from_env()?;

    let model = ModelClient::new(secrets.model_api_key.clone())?;

    // Memory service: optional, and everything downstream degrades
    // cleanly without it.
    let memstore = match &secrets.memstore_url {
        Some(url) => {
            let mut cfg = MemStoreConfig::new(url.clone());
            if let Some(key) = &secrets.memstore_api_key {
                cfg = cfg.with_api_key(key.clone());
            }
            Some(Arc::new(MemStoreClient::new(cfg)?))
        }
        None => {
            warn!("MEMSTORE_URL not set; running without long-term memory");
            None
        }
    };

    let sink: Option<Arc<dyn MemorySink>> =
        memstore.clone().map(|m| m as Arc<dyn MemorySink>);
    let history = Arc::new(HistoryStore::new(sink.clone()));

    let consolidator = match sink {
        Some(sink) => {
            let text = TextClient::new(DEFAULT_HTTP_URL, secrets.model_api_key.clone())?;
            Some(Arc::new(Consolidator::new(
                history.clone(),
                sink,
                Arc::new(ModelSummarizer::new(text)),
            )))
        }
        None => None,
    };

    let calllog = match &secrets.calllog_url {
        Some(url) => Some(Arc::new(CallLogClient::new(url.clone())?)),
        None => {
            warn!("CALL_LOG_URL not set; call logging disabled");
            None
        }
    };

    let transfer = match (
        &secrets.telephony_account_sid,
        &secrets.telephony_auth_token,
        &secrets.public_url,
    ) {
        (Some(account_sid), Some(auth_token), Some(public_url)) => {
            Some(Arc::new(TransferExecutor::new(TransferConfig {
                account_sid: account_sid.clone(),
                auth_token: auth_token.clone(),
                api_base: secrets.telephony_api_base.clone(),
                public_url: public_url.clone(),
            })?))
        }
        _ => {
            warn!("telephony control credentials incomplete; transfers disabled");
            None
        }
    };

    let deps = Arc::new(CallDeps {
        model,
        history,
        consolidator,
        memstore,
        calllog,
        transfer,
        profile: agent_config.agent,
        rules: agent_config.transfer_rules,
    });

    let listener = tokio::net::TcpListener::bind(&args.addr)
        .await
        .with_context(|| format!("binding {}", args.addr))?;
    info!(addr = %args.addr, agent = %deps.profile.name, "bridge listening");

    axum::serve(listener, router(deps)).await?;
    Ok(())
}
