//! Bridge WebSocket handler
//!
//! Each client connection gets its own upstream Realtime API connection and
//! its own reconciler. Two loops run concurrently:
//!
//! - upstream: Realtime API events are reconciled and forwarded to the client
//! - client: uploaded audio is converted, appended, committed and answered
//!
//! The first loop to finish ends the bridge.

use std::fmt::Display;
use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::{select, time::Duration};
use tokio_tungstenite::tungstenite;
use tracing::{Instrument, debug, error, info, warn};
use uuid::Uuid;

use crate::core::audio::encode_pcm16_base64;
use crate::config::ServerConfig;
use crate::core::realtime::openai::{
    FunctionTool, OpenAIEventProducer, OpenAIRealtimeConfig, UpstreamSocket, connect,
};
use crate::core::realtime::{
    EventDecoder, PumpExit, RealtimeError, RealtimeResult, Reconciler, pump_upstream,
};
use crate::state::AppState;

use super::consumer::ClientEventConsumer;
use super::messages::{BridgeMessageRoute, UiMessage};
use super::producer::UiEventProducer;

/// Channel buffer size for outgoing client messages
const CHANNEL_BUFFER_SIZE: usize = 1024;

/// Maximum WebSocket frame size (10 MB)
const MAX_WS_FRAME_SIZE: usize = 10 * 1024 * 1024;

/// Maximum WebSocket message size (10 MB)
const MAX_WS_MESSAGE_SIZE: usize = 10 * 1024 * 1024;

/// How long queued client messages may take to flush after the bridge ends
const SENDER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Why the client loop stopped.
#[derive(Debug)]
pub enum ClientExit {
    /// The client closed the connection
    ClientClosed,
    /// The client socket failed
    ClientError(String),
    /// Forwarding to the upstream failed
    UpstreamFailed(RealtimeError),
}

/// Bridge WebSocket handler
///
/// Upgrades the HTTP connection to WebSocket and bridges it to the OpenAI
/// Realtime API.
pub async fn bridge_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    info!("Bridge WebSocket connection upgrade requested");

    ws.max_frame_size(MAX_WS_FRAME_SIZE)
        .max_message_size(MAX_WS_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_bridge_socket(socket, state))
}

/// Handle the bridge WebSocket connection
async fn handle_bridge_socket(socket: WebSocket, app_state: Arc<AppState>) {
    let connection_id = Uuid::new_v4();
    let span = tracing::info_span!("bridge", %connection_id);
    run_bridge(socket, app_state).instrument(span).await
}

async fn run_bridge(socket: WebSocket, app_state: Arc<AppState>) {
    info!("Bridge WebSocket connection established");

    let (sender, mut receiver) = socket.split();
    let (message_tx, message_rx) = mpsc::channel::<BridgeMessageRoute>(CHANNEL_BUFFER_SIZE);
    let sender_task = tokio::spawn(run_sender(sender, message_rx));

    let config = &app_state.config;

    let (upstream, realtime_config) = match open_upstream(config).await {
        Ok(pair) => pair,
        Err(e) => {
            error!("Failed to open upstream connection: {}", e);
            report_error(&message_tx, &e).await;
            finish(message_tx, sender_task).await;
            return;
        }
    };

    let (upstream_sink, mut upstream_stream) = upstream.split();
    let mut producer = OpenAIEventProducer::new(upstream_sink);

    if let Err(e) = configure_session(
        &mut producer,
        &config.tools,
        &realtime_config.transcription_model,
        &message_tx,
    )
    .await
    {
        error!("Failed to send session update: {}", e);
        finish(message_tx, sender_task).await;
        return;
    }

    let mut consumer = ClientEventConsumer::new(producer);
    let mut reconciler = Reconciler::new(
        EventDecoder::new(),
        UiEventProducer::new(message_tx.clone()),
        config.reordering_policy,
    );

    info!(
        policy = %config.reordering_policy,
        model = %realtime_config.model,
        "Bridge running"
    );

    select! {
        exit = pump_upstream(&mut upstream_stream, &mut reconciler, config.fail_on_malformed_event) => {
            match exit {
                PumpExit::UpstreamClosed => info!("Upstream closed, ending bridge"),
                PumpExit::UpstreamError(e) => warn!("Upstream failed, ending bridge: {}", e),
                PumpExit::SinkFailed(e) => info!("Client gone, ending bridge: {}", e),
                PumpExit::MalformedEvent(e) => warn!("Malformed upstream event, ending bridge: {}", e),
            }
        }
        exit = run_client_loop(&mut receiver, &mut consumer, &config.tools, &message_tx) => {
            match exit {
                ClientExit::ClientClosed => info!("Client closed, ending bridge"),
                ClientExit::ClientError(e) => warn!("Client socket failed, ending bridge: {}", e),
                ClientExit::UpstreamFailed(e) => warn!("Upstream send failed, ending bridge: {}", e),
            }
        }
    }

    if let Err(e) = consumer.producer_mut().close().await {
        debug!("Upstream close: {}", e);
    }
    drop(reconciler);

    finish(message_tx, sender_task).await;

    info!("Bridge WebSocket connection terminated");
}

/// Resolve the upstream settings and connect.
async fn open_upstream(
    config: &ServerConfig,
) -> RealtimeResult<(UpstreamSocket, OpenAIRealtimeConfig)> {
    let realtime_config = config.realtime_config()?;
    let socket = connect(&realtime_config).await?;
    Ok((socket, realtime_config))
}

/// Send the opening `session.update`. A failure is also reported to the client.
async fn configure_session<S>(
    producer: &mut OpenAIEventProducer<S>,
    tools: &[FunctionTool],
    transcription_model: &str,
    message_tx: &mpsc::Sender<BridgeMessageRoute>,
) -> RealtimeResult<()>
where
    S: Sink<tungstenite::Message> + Unpin,
    S::Error: Display,
{
    let result = producer.session_update(tools, transcription_model).await;
    if let Err(e) = &result {
        report_error(message_tx, e).await;
    }
    result
}

async fn report_error(message_tx: &mpsc::Sender<BridgeMessageRoute>, error: &RealtimeError) {
    let _ = message_tx
        .send(BridgeMessageRoute::Outgoing(UiMessage::Error(error.to_string())))
        .await;
}

/// Ask the sender task to close the client socket and wait for queued
/// messages to drain.
async fn finish(
    message_tx: mpsc::Sender<BridgeMessageRoute>,
    mut sender_task: tokio::task::JoinHandle<()>,
) {
    let _ = message_tx.send(BridgeMessageRoute::Close).await;
    drop(message_tx);

    if tokio::time::timeout(SENDER_DRAIN_TIMEOUT, &mut sender_task)
        .await
        .is_err()
    {
        warn!("Client sender did not drain in time, aborting");
        sender_task.abort();
    }
}

/// Forward routed messages to the client socket.
async fn run_sender<S>(mut sender: S, mut message_rx: mpsc::Receiver<BridgeMessageRoute>)
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    while let Some(route) = message_rx.recv().await {
        let should_close = matches!(route, BridgeMessageRoute::Close);

        let result = match route {
            BridgeMessageRoute::Outgoing(message) => match serde_json::to_string(&message) {
                Ok(json_str) => sender.send(Message::Text(json_str.into())).await,
                Err(e) => {
                    error!("Failed to serialize outgoing message: {}", e);
                    continue;
                }
            },
            BridgeMessageRoute::Close => {
                info!("Closing bridge WebSocket connection");
                sender.send(Message::Close(None)).await
            }
        };

        if let Err(e) = result {
            debug!("Failed to send WebSocket message: {}", e);
            break;
        }

        if should_close {
            break;
        }
    }
}

/// Read client frames until the client leaves or the upstream rejects a send.
///
/// Each binary frame is one complete utterance: it is converted to 24kHz
/// pcm16, appended, committed, and a response is requested.
pub async fn run_client_loop<R, S>(
    receiver: &mut R,
    consumer: &mut ClientEventConsumer<S>,
    tools: &[FunctionTool],
    message_tx: &mpsc::Sender<BridgeMessageRoute>,
) -> ClientExit
where
    R: Stream<Item = Result<Message, axum::Error>> + Unpin,
    S: Sink<tungstenite::Message> + Unpin,
    S::Error: Display,
{
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Binary(data)) => {
                debug!("Received binary audio: {} bytes", data.len());

                let audio = match encode_pcm16_base64(&data) {
                    Ok(audio) => audio,
                    Err(e) => {
                        warn!("Rejecting client audio: {}", e);
                        let _ = message_tx
                            .send(BridgeMessageRoute::Outgoing(UiMessage::Error(e.to_string())))
                            .await;
                        continue;
                    }
                };

                if let Err(e) = consumer.on_audio(audio).await {
                    return ClientExit::UpstreamFailed(e);
                }
                if let Err(e) = consumer.on_response_create(tools).await {
                    return ClientExit::UpstreamFailed(e);
                }
            }
            Ok(Message::Text(text)) => {
                debug!("Ignoring text message from client: {} bytes", text.len());
            }
            Ok(Message::Close(_)) => return ClientExit::ClientClosed,
            Ok(_) => {}
            Err(e) => return ClientExit::ClientError(e.to_string()),
        }
    }

    ClientExit::ClientClosed
}
