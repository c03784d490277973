//! WebSocket implementation of the model session.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use futures::SinkExt;
use futures::stream::StreamExt;
use serde_json::json;
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, warn};

use crate::client::ClientConfig;
use crate::error::{Error, Result};
use crate::event::*;
use crate::session::ModelSession;
use crate::types::SessionConfig;

/// A live realtime session over WebSocket.
///
/// The socket is split: a write task drains `write_tx`, a read task parses
/// frames into `event_rx`. All caller-facing methods are channel sends, so
/// the session can be shared behind `&self` across a handler's select arms.
pub struct WebSocketSession {
    write_tx: mpsc::Sender<Message>,
    event_rx: Mutex<mpsc::Receiver<Result<ServerEvent>>>,
    _read_handle: tokio::task::JoinHandle<()>,
    _write_handle: tokio::task::JoinHandle<()>,
}

impl WebSocketSession {
    pub(crate) async fn connect(config: Arc<ClientConfig>) -> Result<Self> {
        let url = format!("{}?model={}", config.ws_url, config.model);
        debug!(%url, "connecting to model socket");

        let request = http::Request::builder()
            .uri(&url)
            .header("Authorization", format!("Bearer {}", config.api_key))
            .header("OpenAI-Beta", "realtime=v1")
            .header("Sec-WebSocket-Version", "13")
            .header("Sec-WebSocket-Key", generate_websocket_key())
            .header("Connection", "Upgrade")
            .header("Upgrade", "websocket")
            .header("Host", extract_host(&url).unwrap_or("api.openai.com"))
            .body(())
            .map_err(|e| Error::Connection(format!("failed to build request: {e}")))?;

        let (ws_stream, _response) = connect_async(request)
            .await
            .map_err(|e| Error::Connection(format!("failed to connect: {e}")))?;

        let (write, read) = ws_stream.split();

        let (event_tx, event_rx) = mpsc::channel(256);
        let (write_tx, write_rx) = mpsc::channel(256);

        let write_handle = tokio::spawn(write_loop(write, write_rx));
        let read_handle = tokio::spawn(read_loop(read, event_tx));

        Ok(Self {
            write_tx,
            event_rx: Mutex::new(event_rx),
            _read_handle: read_handle,
            _write_handle: write_handle,
        })
    }

    async fn send_event(&self, event: serde_json::Value) -> Result<()> {
        let msg = Message::Text(event.to_string().into());
        self.write_tx
            .send(msg)
            .await
            .map_err(|_| Error::SessionClosed)
    }
}

#[async_trait]
impl ModelSession for WebSocketSession {
    async fn update_session(&self, config: &SessionConfig) -> Result<()> {
        let event = json!({
            "event_id": generate_event_id(),
            "type": EVENT_TYPE_SESSION_UPDATE,
            "session": config.to_json_value(),
        });
        self.send_event(event).await
    }

    async fn append_audio(&self, audio: &[u8]) -> Result<()> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(audio);
        let event = json!({
            "event_id": generate_event_id(),
            "type": EVENT_TYPE_INPUT_AUDIO_BUFFER_APPEND,
            "audio": encoded,
        });
        self.send_event(event).await
    }

    async fn commit_input(&self) -> Result<()> {
        let event = json!({
            "event_id": generate_event_id(),
            "type": EVENT_TYPE_INPUT_AUDIO_BUFFER_COMMIT,
        });
        self.send_event(event).await
    }

    async fn create_response(&self, instructions: Option<&str>) -> Result<()> {
        let mut event = json!({
            "event_id": generate_event_id(),
            "type": EVENT_TYPE_RESPONSE_CREATE,
        });
        if let Some(instructions) = instructions {
            event["response"] = json!({"instructions": instructions});
        }
        self.send_event(event).await
    }

    async fn recv(&self) -> Option<Result<ServerEvent>> {
        let mut rx = self.event_rx.lock().await;
        rx.recv().await
    }

    async fn send_raw(&self, event: serde_json::Value) -> Result<()> {
        self.send_event(event).await
    }

    async fn close(&self) -> Result<()> {
        let _ = self.write_tx.send(Message::Close(None)).await;
        Ok(())
    }
}

async fn write_loop(
    mut write: futures::stream::SplitSink<
        tokio_tungstenite::WebSocketStream<
            tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
        >,
        Message,
    >,
    mut rx: mpsc::Receiver<Message>,
) {
    while let Some(msg) = rx.recv().await {
        if let Message::Close(_) = msg {
            let _ = write.close().await;
            break;
        }
        if let Err(e) = write.send(msg).await {
            error!("model socket write error: {e}");
            break;
        }
    }
}

async fn read_loop(
    mut read: futures::stream::SplitStream<
        tokio_tungstenite::WebSocketStream<
            tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
        >,
    >,
    tx: mpsc::Sender<Result<ServerEvent>>,
) {
    while let Some(result) = read.next().await {
        match result {
            Ok(Message::Text(text)) => {
                // One malformed event must not kill the stream; drop it
                // and keep reading.
                match parse_event(&text) {
                    Ok(event) => {
                        if tx.send(Ok(event)).await.is_err() {
                            break;
                        }
                    }
                    Err(Error::Api(api)) => {
                        if tx.send(Err(Error::Api(api))).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("dropping unparseable model event: {e}");
                    }
                }
            }
            Ok(Message::Close(_)) => {
                debug!("model socket closed by server");
                break;
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(_) => {}
            Err(e) => {
                error!("model socket read error: {e}");
                let _ = tx.send(Err(Error::WebSocket(e))).await;
                break;
            }
        }
    }
}

fn parse_event(text: &str) -> Result<ServerEvent> {
    let mut event: ServerEvent = serde_json::from_str(text)?;

    // Audio deltas carry base64 in "delta"; decode once here.
    if event.event_type == EVENT_TYPE_RESPONSE_AUDIO_DELTA
        && let Some(ref delta) = event.delta
        && let Ok(decoded) = base64::engine::general_purpose::STANDARD.decode(delta)
    {
        event.audio = Some(decoded);
    }

    if event.event_type == EVENT_TYPE_ERROR
        && let Some(ref error) = event.error
    {
        return Err(Error::Api(error.to_api_error()));
    }

    Ok(event)
}

fn generate_event_id() -> String {
    format!("evt_{}", &uuid::Uuid::new_v4().simple().to_string()[..12])
}

fn generate_websocket_key() -> String {
    base64::engine::general_purpose::STANDARD.encode(uuid::Uuid::new_v4().as_bytes())
}

fn extract_host(url: &str) -> Option<&str> {
    url.strip_prefix("wss://")
        .or_else(|| url.strip_prefix("ws://"))
        .and_then(|s| s.split('/').next())
        .and_then(|s| s.split('?').next())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_audio_delta_decodes_payload() {
        let pcm: &[u8] = &[0, 1, 2, 3];
        let b64 = base64::engine::general_purpose::STANDARD.encode(pcm);
        let text = format!(r#"{{"type":"response.audio.delta","delta":"{b64}"}}"#);
        let event = parse_event(&text).unwrap();
        assert_eq!(event.audio.as_deref(), Some(pcm));
    }

    #[test]
    fn test_parse_error_event_becomes_api_error() {
        let text = r#"{"type":"error","error":{"type":"invalid_request_error","code":"bad","message":"nope"}}"#;
        assert!(matches!(parse_event(text), Err(Error::Api(_))));
    }

    #[test]
    fn test_parse_garbage_is_json_error() {
        assert!(matches!(parse_event("not json"), Err(Error::Json(_))));
    }

    #[test]
    fn test_extract_host() {
        assert_eq!(
            extract_host("wss://api.openai.com/v1/realtime?model=x"),
            Some("api.openai.com")
        );
        assert_eq!(extract_host("ws://localhost:9/v1"), Some("localhost:9"));
    }
}
