//! The per-call connection handler.
//!
//! One task owns each call end to end: it consumes the gateway socket,
//! drives the model session, and is the only writer of the call's state.
//! Model events cross from the socket's read task via channel, so nothing
//! here is ever called from a foreign thread.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message as WsMessage, WebSocket};
use futures::StreamExt;
use futures::stream::{SplitSink, SplitStream};
use futures::SinkExt;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use callbridge_audio::{downlink_to_caller, uplink_from_caller};
use callbridge_history::{Consolidator, HistoryStore, Role, Turn};
use callbridge_intent::{TransferRule, match_transfer};
use callbridge_memstore::{CallLogClient, CallRecord, MemStoreClient, MemoryType, SearchRequest};
use callbridge_persona::current_hour;
use callbridge_realtime::{
    Client as ModelClient, EVENT_TYPE_INPUT_AUDIO_BUFFER_SPEECH_STARTED,
    EVENT_TYPE_INPUT_AUDIO_BUFFER_SPEECH_STOPPED, EVENT_TYPE_INPUT_TRANSCRIPTION_COMPLETED,
    EVENT_TYPE_RESPONSE_AUDIO_DELTA, EVENT_TYPE_RESPONSE_AUDIO_TRANSCRIPT_DONE,
    EVENT_TYPE_RESPONSE_DONE, EVENT_TYPE_SESSION_UPDATED, ModelSession, ServerEvent,
    SessionConfig,
};

use crate::call::{CallSession, CallState};
use crate::error::{Result, SessionError};
use crate::instructions::{AgentProfile, InstructionInputs, assemble_instructions};
use crate::stream::{self, StartFrame, StreamEvent, media_message};
use crate::transfer::TransferExecutor;

/// How long to wait for the gateway's start frame.
const START_TIMEOUT: Duration = Duration::from_secs(10);

/// Bound on model session establishment. Past this the call proceeds
/// degraded instead of leaving the caller in dead air.
const UPSTREAM_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Local voice-activity fallback: commit when no caller audio arrives for
/// this long. The byte-count guard makes a double fire with the model's
/// own detector harmless, so this single guard is the authoritative
/// commit gate.
const IDLE_COMMIT_TIMEOUT: Duration = Duration::from_millis(700);

/// Short pacing sleep after each downlink chunk so a fast model burst
/// doesn't overwhelm the gateway socket.
const DOWNLINK_PACE: Duration = Duration::from_millis(5);

/// How many memory records are pulled for instruction context.
const MEMORY_LOOKUP_K: usize = 6;

/// How many turns the teardown call log includes.
const CALL_LOG_TURNS: usize = 40;

/// Instruction for the opening response; the agent speaks first.
const GREETING_PROMPT: &str = "Greet the caller now, before they say anything.";

/// Shared dependencies injected into every call handler.
pub struct CallDeps {
    pub model: ModelClient,
    pub history: Arc<HistoryStore>,
    pub consolidator: Option<Arc<Consolidator>>,
    pub memstore: Option<Arc<MemStoreClient>>,
    pub calllog: Option<Arc<CallLogClient>>,
    pub transfer: Option<Arc<TransferExecutor>>,
    pub profile: AgentProfile,
    pub rules: Vec<TransferRule>,
}

/// Runs one call from stream start to guaranteed teardown.
pub async fn handle_media_stream(socket: WebSocket, deps: Arc<CallDeps>) {
    let (mut sender, mut receiver) = socket.split();

    let Some(start) = await_start(&mut receiver).await else {
        return;
    };
    let mut call = CallSession::from_start(&start);
    info!(
        call_sid = %call.call_sid,
        caller = %call.caller,
        stream_sid = %call.stream_sid,
        callback = call.is_callback,
        "media stream started"
    );
    call.set_state(CallState::Connecting);

    // Context gathering. Every piece degrades independently: a dead
    // memory service still gets a greeting and a conversation.
    deps.history.load(&call.thread_id).await;
    let recap = deps.history.recent(&call.thread_id, 10).await;
    let (caller_name, memory_context) = lookup_caller_context(&deps, &call).await;

    let instructions = assemble_instructions(&InstructionInputs {
        profile: &deps.profile,
        recap: &recap,
        caller_name: caller_name.as_deref(),
        hour: current_hour(),
        memory_context: &memory_context,
        rules: &deps.rules,
    });

    let upstream = connect_upstream(&deps, &instructions).await;
    if upstream.is_some() {
        call.set_state(CallState::Greeting);
    }

    let reason = relay(&deps, &mut call, &mut sender, &mut receiver, upstream.as_deref()).await;

    call.set_state(CallState::Closing);
    info!(call_sid = %call.call_sid, reason, "closing call");
    cleanup(&deps, &call, upstream.as_deref(), caller_name.as_deref()).await;
    call.set_state(CallState::Closed);
}

/// Waits for the gateway's start frame, skipping the handshake chatter.
async fn await_start(receiver: &mut SplitStream<WebSocket>) -> Option<StartFrame> {
    let wait = async {
        while let Some(frame) = receiver.next().await {
            match frame {
                Ok(WsMessage::Text(text)) => match StreamEvent::parse(&text) {
                    Ok(event) if event.is_start() => return event.start,
                    Ok(event) if event.is_stop() => return None,
                    Ok(_) => continue,
                    Err(e) => {
                        warn!(error = %e, "dropping bad frame before start");
                        continue;
                    }
                },
                Ok(WsMessage::Close(_)) => return None,
                Ok(_) => continue,
                Err(e) => {
                    error!(error = %e, "telephony socket error before start");
                    return None;
                }
            }
        }
        None
    };

    match tokio::time::timeout(START_TIMEOUT, wait).await {
        Ok(start) => start,
        Err(_) => {
            warn!("no start frame within timeout, dropping connection");
            None
        }
    }
}

/// Establishes the model session: connect, wait for session readiness,
/// push configuration, and request the opening greeting.
///
/// Returns `None` (degraded call) on any failure; the relay loop then
/// drains the gateway socket until the stream stops.
async fn connect_upstream(
    deps: &CallDeps,
    instructions: &str,
) -> Option<Arc<dyn ModelSession>> {
    let config = SessionConfig {
        voice: Some(deps.profile.voice.clone()),
        instructions: Some(instructions.to_string()),
        server_vad: true,
        ..Default::default()
    };

    let establish = async {
        let session = deps.model.connect_websocket().await?;
        loop {
            match session.recv().await {
                Some(Ok(event)) if event.is_session_created() => break,
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e),
                None => return Err(callbridge_realtime::Error::SessionClosed),
            }
        }
        session.update_session(&config).await?;
        session.create_response(Some(GREETING_PROMPT)).await?;
        Ok::<_, callbridge_realtime::Error>(session)
    };

    match tokio::time::timeout(UPSTREAM_CONNECT_TIMEOUT, establish).await {
        Ok(Ok(session)) => Some(Arc::new(session) as Arc<dyn ModelSession>),
        Ok(Err(e)) => {
            warn!(error = %e, "model session failed, continuing degraded");
            None
        }
        Err(_) => {
            warn!("model session not ready in time, continuing degraded");
            None
        }
    }
}

/// The relay loop. Returns the human-readable close reason.
async fn relay(
    deps: &CallDeps,
    call: &mut CallSession,
    sender: &mut SplitSink<WebSocket, WsMessage>,
    receiver: &mut SplitStream<WebSocket>,
    upstream: Option<&dyn ModelSession>,
) -> &'static str {
    let mut idle_deadline = Instant::now() + IDLE_COMMIT_TIMEOUT;

    loop {
        tokio::select! {
            event = recv_upstream(upstream) => {
                match event {
                    Some(Ok(event)) => {
                        if let Err(e) =
                            handle_model_event(deps, call, sender, upstream, &event).await
                        {
                            warn!(error = %e, event_type = %event.event_type,
                                  "model event dropped");
                        }
                    }
                    // Protocol-level error events are transient: log and
                    // keep relaying. A closed socket is fatal.
                    Some(Err(e)) => warn!(error = %e, "model reported an error"),
                    None => return "model socket closed",
                }
            }

            frame = recv_gateway(receiver) => {
                match frame {
                    GatewayFrame::Media(media) => {
                        match relay_uplink(&media, call, upstream).await {
                            Ok(()) => idle_deadline = Instant::now() + IDLE_COMMIT_TIMEOUT,
                            Err(e) => warn!(error = %e, "dropping media frame"),
                        }
                    }
                    GatewayFrame::Mark(name) => {
                        debug!(mark = %name, "gateway checkpoint");
                        if let Some(session) = upstream
                            && let Err(e) = commit_and_respond(session, call).await
                        {
                            warn!(error = %e, "mark commit failed");
                        }
                    }
                    GatewayFrame::Ignored => {}
                    GatewayFrame::Stop => return "stream stop",
                    GatewayFrame::Closed => return "telephony socket closed",
                    GatewayFrame::Errored => return "telephony socket error",
                }
            }

            _ = tokio::time::sleep_until(idle_deadline) => {
                // Idle fallback for when the model's own voice-activity
                // detector under-fires. Sub-threshold buffers are skipped
                // inside commit_and_respond.
                if let Some(session) = upstream
                    && call.should_commit()
                    && let Err(e) = commit_and_respond(session, call).await
                {
                    warn!(error = %e, "idle commit failed");
                }
                idle_deadline = Instant::now() + IDLE_COMMIT_TIMEOUT;
            }
        }
    }
}

/// A digested gateway frame.
enum GatewayFrame {
    Media(stream::MediaFrame),
    Mark(String),
    Stop,
    Ignored,
    Closed,
    Errored,
}

/// Receives and classifies the next gateway frame.
///
/// Lives in its own function so the select arm stays one future; bad
/// frames are digested to `Ignored` here rather than terminating the
/// loop, per the one-bad-frame-never-drops-the-call rule.
async fn recv_gateway(receiver: &mut SplitStream<WebSocket>) -> GatewayFrame {
    match receiver.next().await {
        Some(Ok(WsMessage::Text(text))) => match StreamEvent::parse(&text) {
            Ok(event) => match event.event.as_str() {
                stream::EVENT_MEDIA => match event.media {
                    Some(media) => GatewayFrame::Media(media),
                    None => GatewayFrame::Ignored,
                },
                stream::EVENT_MARK => {
                    GatewayFrame::Mark(event.mark.map(|m| m.name).unwrap_or_default())
                }
                stream::EVENT_STOP => GatewayFrame::Stop,
                stream::EVENT_START | stream::EVENT_CONNECTED => GatewayFrame::Ignored,
                other => {
                    debug!(event = other, "ignoring gateway event");
                    GatewayFrame::Ignored
                }
            },
            Err(e) => {
                warn!(error = %e, "dropping bad gateway frame");
                GatewayFrame::Ignored
            }
        },
        Some(Ok(WsMessage::Close(_))) => GatewayFrame::Closed,
        Some(Ok(_)) => GatewayFrame::Ignored,
        Some(Err(e)) => {
            error!(error = %e, "telephony socket error");
            GatewayFrame::Errored
        }
        None => GatewayFrame::Closed,
    }
}

async fn relay_uplink(
    media: &stream::MediaFrame,
    call: &mut CallSession,
    upstream: Option<&dyn ModelSession>,
) -> Result<()> {
    let ulaw = media.decode()?;
    let pcm = uplink_from_caller(&ulaw);

    if let Some(session) = upstream {
        session.append_audio(&pcm).await?;
        call.add_buffered(pcm.len());
    }
    Ok(())
}

/// Commits the buffered audio and requests a response, or skips entirely
/// when the buffer is below the worthwhile threshold.
pub(crate) async fn commit_and_respond(
    session: &dyn ModelSession,
    call: &mut CallSession,
) -> Result<()> {
    if !call.should_commit() {
        debug!(buffered = call.buffered(), "skipping commit below threshold");
        return Ok(());
    }

    session.commit_input().await?;
    session.create_response(None).await?;
    call.reset_buffered();
    call.set_state(CallState::Responding);
    Ok(())
}

async fn handle_model_event(
    deps: &CallDeps,
    call: &mut CallSession,
    sender: &mut SplitSink<WebSocket, WsMessage>,
    upstream: Option<&dyn ModelSession>,
    event: &ServerEvent,
) -> Result<()> {
    match event.event_type.as_str() {
        EVENT_TYPE_RESPONSE_AUDIO_DELTA => {
            if let Some(audio) = &event.audio {
                relay_downlink(sender, &call.stream_sid, audio).await?;
            }
        }

        EVENT_TYPE_INPUT_AUDIO_BUFFER_SPEECH_STOPPED => {
            if let Some(session) = upstream {
                commit_and_respond(session, call).await?;
            }
        }

        EVENT_TYPE_INPUT_AUDIO_BUFFER_SPEECH_STARTED => {
            if call.state() == CallState::Greeting {
                call.set_state(CallState::Listening);
            }
        }

        EVENT_TYPE_INPUT_TRANSCRIPTION_COMPLETED => {
            if let Some(transcript) = event.transcript.as_deref()
                && !transcript.trim().is_empty()
            {
                on_user_utterance(deps, call, transcript).await;
            }
        }

        EVENT_TYPE_RESPONSE_AUDIO_TRANSCRIPT_DONE => {
            if let Some(transcript) = event.transcript.as_deref()
                && !transcript.trim().is_empty()
            {
                deps.history
                    .append(&call.thread_id, Role::Assistant, transcript)
                    .await;
            }
        }

        EVENT_TYPE_RESPONSE_DONE => {
            if call.state() == CallState::Responding || call.state() == CallState::Greeting {
                call.set_state(CallState::Listening);
            }
            spawn_persistence(deps, call);
        }

        EVENT_TYPE_SESSION_UPDATED => {}

        other => debug!(event_type = other, "ignoring model event"),
    }
    Ok(())
}

/// Transcript first, intent second, strictly in that order; never on
/// assistant utterances.
async fn on_user_utterance(deps: &CallDeps, call: &mut CallSession, transcript: &str) {
    debug!(call_sid = %call.call_sid, %transcript, "caller utterance");
    deps.history
        .append(&call.thread_id, Role::User, transcript)
        .await;

    if call.state() == CallState::Transferring {
        return;
    }

    let Some(matched) = match_transfer(transcript, &deps.rules) else {
        return;
    };

    info!(
        call_sid = %call.call_sid,
        keyword = %matched.rule.keyword,
        destination = %matched.rule.number,
        span = %matched.matched_span,
        "transfer intent matched"
    );
    call.transferred_to = Some(matched.rule.number.clone());
    call.set_state(CallState::Transferring);

    // The redirect happens out of band; the gateway will signal stream
    // stop once it takes effect. Nothing to await on the hot path.
    if let Some(executor) = &deps.transfer {
        let executor = executor.clone();
        let call_sid = call.call_sid.clone();
        let destination = matched.rule.number.clone();
        let keyword = matched.matched_span.clone();
        tokio::spawn(async move {
            if let Err(e) = executor.transfer(&call_sid, &destination, &keyword).await {
                warn!(%call_sid, error = %e, "transfer redirect failed, call continues");
            }
        });
    } else {
        warn!(call_sid = %call.call_sid, "transfer matched but no executor configured");
    }
}

async fn relay_downlink(
    sender: &mut SplitSink<WebSocket, WsMessage>,
    stream_sid: &str,
    audio: &[u8],
) -> Result<()> {
    let ulaw = downlink_to_caller(audio)?;
    let message = media_message(stream_sid, &ulaw);
    sender
        .send(WsMessage::Text(message.into()))
        .await
        .map_err(|e| SessionError::TelephonySend(e.to_string()))?;

    tokio::time::sleep(DOWNLINK_PACE).await;
    Ok(())
}

/// Flush and consolidation run off the hot path after each response.
fn spawn_persistence(deps: &CallDeps, call: &CallSession) {
    let history = deps.history.clone();
    let consolidator = deps.consolidator.clone();
    let thread_id = call.thread_id.clone();
    tokio::spawn(async move {
        history.flush(&thread_id).await;
        if let Some(consolidator) = consolidator {
            consolidator.maybe_consolidate(&thread_id).await;
        }
    });
}

/// Looks up what the memory service knows about this caller. Degrades to
/// an unknown caller on any failure.
async fn lookup_caller_context(
    deps: &CallDeps,
    call: &CallSession,
) -> (Option<String>, Vec<String>) {
    let Some(memstore) = &deps.memstore else {
        return (None, Vec::new());
    };

    let req = SearchRequest {
        query: "caller profile and preferences".to_string(),
        user_id: call.thread_id.clone(),
        k: MEMORY_LOOKUP_K,
        types: Vec::new(),
        include_shared: true,
    };

    match memstore.search(&req).await {
        Ok(records) => {
            let caller_name = records
                .iter()
                .filter(|r| r.record_type == MemoryType::Person)
                .filter_map(|r| r.value.as_json())
                .find(|v| v.get("relationship").and_then(|r| r.as_str()) == Some("self"))
                .and_then(|v| v.get("name").and_then(|n| n.as_str()))
                .map(String::from);

            let lines: Vec<String> = records
                .iter()
                .map(|r| r.value.as_text())
                .filter(|t| !t.is_empty())
                .collect();

            (caller_name, lines)
        }
        Err(e) => {
            warn!(error = %e, "memory lookup failed, greeting as new caller");
            (None, Vec::new())
        }
    }
}

/// Unconditional teardown: final flush, best-effort call log, socket
/// release. Each side effect is isolated so one failing collaborator
/// never blocks the others.
async fn cleanup(
    deps: &CallDeps,
    call: &CallSession,
    upstream: Option<&dyn ModelSession>,
    caller_name: Option<&str>,
) {
    deps.history.flush(&call.thread_id).await;

    if let Some(calllog) = &deps.calllog {
        let turns = deps.history.recent(&call.thread_id, CALL_LOG_TURNS).await;

        if let Err(e) = calllog
            .upsert_customer(&call.caller, caller_name, None)
            .await
        {
            warn!(error = %e, "customer upsert failed");
        }

        let record = CallRecord {
            phone: call.caller.clone(),
            transcript: render_transcript(&turns),
            summary: call_summary(call, turns.len()),
            transfer_to: call.transferred_to.clone(),
        };
        if let Err(e) = calllog.log_call(&record).await {
            warn!(error = %e, "call log write failed");
        }
    }

    if let Some(session) = upstream {
        let _ = session.close().await;
    }
}

fn render_transcript(turns: &[Turn]) -> String {
    turns
        .iter()
        .map(|t| format!("{}: {}", t.role, t.text))
        .collect::<Vec<_>>()
        .join("\n")
}

fn call_summary(call: &CallSession, turn_count: usize) -> String {
    let kind = if call.is_callback { "Callback" } else { "Inbound call" };
    match &call.transferred_to {
        Some(dest) => format!("{kind} from {}, {turn_count} turns, transferred to {dest}", call.caller),
        None => format!("{kind} from {}, {turn_count} turns", call.caller),
    }
}

async fn recv_upstream(
    upstream: Option<&dyn ModelSession>,
) -> Option<callbridge_realtime::Result<ServerEvent>> {
    match upstream {
        Some(session) => session.recv().await,
        // Degraded call: pend forever, the gateway side drives shutdown.
        None => std::future::pending().await,
    }
}
