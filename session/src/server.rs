//! HTTP/WebSocket service surface.

use std::sync::Arc;

use axum::{
    Router,
    extract::{State, WebSocketUpgrade},
    response::Response,
    routing::get,
};
use tracing::debug;

use crate::handler::{CallDeps, handle_media_stream};

/// Builds the service router: the gateway's media-stream endpoint and a
/// liveness probe.
pub fn router(deps: Arc<CallDeps>) -> Router {
    Router::new()
        .route("/media", get(media_ws))
        .route("/healthz", get(healthz))
        .with_state(deps)
}

async fn media_ws(ws: WebSocketUpgrade, State(deps): State<Arc<CallDeps>>) -> Response {
    debug!("media stream connection upgrading");
    ws.on_upgrade(move |socket| handle_media_stream(socket, deps))
}

async fn healthz() -> &'static str {
    "ok"
}
