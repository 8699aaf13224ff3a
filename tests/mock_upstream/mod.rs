//! Mock OpenAI Realtime API server
//!
//! Accepts WebSocket upgrades on a local port, records every client event and
//! the upgrade headers, and replays a scripted list of server events each time
//! the client sends `response.create`.

// Not every test binary uses every helper
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use http::StatusCode;
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};

/// One step of the scripted reply to `response.create`.
#[derive(Debug, Clone)]
pub enum ScriptStep {
    /// Send a JSON event as a text frame
    Send(Value),
    /// Send a raw text frame as-is
    Raw(String),
    /// Close the connection
    Close,
}

impl From<Value> for ScriptStep {
    fn from(value: Value) -> Self {
        ScriptStep::Send(value)
    }
}

/// Shared state of the mock server
pub struct RealtimeMockState {
    pub script: Vec<ScriptStep>,
    pub expected_api_key: Option<String>,
    pub received: Mutex<Vec<Value>>,
    pub upgrade_headers: Mutex<Vec<(String, String)>>,
    pub upgrade_uri: Mutex<Option<String>>,
    pub connection_count: AtomicU64,
}

pub struct RealtimeMockServer {
    pub addr: SocketAddr,
    pub state: Arc<RealtimeMockState>,
}

impl RealtimeMockServer {
    /// Start a server that accepts any API key.
    pub async fn start(script: Vec<ScriptStep>) -> Self {
        Self::start_with_key(script, None).await
    }

    /// Start a server that answers 401 unless the bearer token matches.
    pub async fn start_with_key(script: Vec<ScriptStep>, expected_api_key: Option<&str>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let state = Arc::new(RealtimeMockState {
            script,
            expected_api_key: expected_api_key.map(str::to_string),
            received: Mutex::new(Vec::new()),
            upgrade_headers: Mutex::new(Vec::new()),
            upgrade_uri: Mutex::new(None),
            connection_count: AtomicU64::new(0),
        });

        let accept_state = state.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let state = accept_state.clone();
                tokio::spawn(async move {
                    let _ = handle_connection(stream, state).await;
                });
            }
        });

        Self { addr, state }
    }

    /// URL to put in the bridge configuration.
    pub fn url(&self) -> String {
        format!("ws://{}/v1/realtime", self.addr)
    }

    pub fn received(&self) -> Vec<Value> {
        self.state.received.lock().unwrap().clone()
    }

    /// `type` of every client event, in arrival order.
    pub fn received_types(&self) -> Vec<String> {
        self.received()
            .iter()
            .filter_map(|event| event["type"].as_str().map(str::to_string))
            .collect()
    }

    pub fn header(&self, name: &str) -> Option<String> {
        self.state
            .upgrade_headers
            .lock()
            .unwrap()
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.clone())
    }

    pub fn upgrade_uri(&self) -> Option<String> {
        self.state.upgrade_uri.lock().unwrap().clone()
    }

    pub fn connection_count(&self) -> u64 {
        self.state.connection_count.load(Ordering::Relaxed)
    }

    /// Wait until the client has sent at least `count` events.
    pub async fn wait_for_events(&self, count: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if self.state.received.lock().unwrap().len() >= count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }
}

async fn handle_connection(
    stream: TcpStream,
    state: Arc<RealtimeMockState>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let handshake_state = state.clone();
    let callback = move |request: &Request, response: Response| {
        let headers = request
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
            .collect();
        *handshake_state.upgrade_headers.lock().unwrap() = headers;
        *handshake_state.upgrade_uri.lock().unwrap() = Some(request.uri().to_string());

        if let Some(expected) = &handshake_state.expected_api_key {
            let presented = request
                .headers()
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            if presented != format!("Bearer {expected}") {
                let mut rejection = ErrorResponse::new(Some("invalid_api_key".to_string()));
                *rejection.status_mut() = StatusCode::UNAUTHORIZED;
                return Err(rejection);
            }
        }
        Ok(response)
    };

    let ws_stream = accept_hdr_async(stream, callback).await?;
    let (mut write, mut read) = ws_stream.split();

    let conn_id = state.connection_count.fetch_add(1, Ordering::Relaxed) + 1;

    let created = json!({
        "type": "session.created",
        "event_id": format!("event_mock_{conn_id}"),
        "session": {"id": format!("sess_mock_{conn_id}"), "object": "realtime.session"}
    });
    write.send(Message::Text(created.to_string().into())).await?;

    while let Some(msg) = read.next().await {
        match msg? {
            Message::Text(text) => {
                let event: Value = serde_json::from_str(text.as_str())?;
                let is_response_create = event["type"] == "response.create";
                state.received.lock().unwrap().push(event);

                if !is_response_create {
                    continue;
                }

                for step in &state.script {
                    match step {
                        ScriptStep::Send(event) => {
                            write.send(Message::Text(event.to_string().into())).await?;
                        }
                        ScriptStep::Raw(text) => {
                            write.send(Message::Text(text.clone().into())).await?;
                        }
                        ScriptStep::Close => {
                            write.send(Message::Close(None)).await?;
                            return Ok(());
                        }
                    }
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    Ok(())
}

// =============================================================================
// Server event builders
// =============================================================================

pub fn response_created() -> Value {
    json!({"type": "response.created", "response": {"id": "resp_mock", "status": "in_progress"}})
}

pub fn audio_delta(delta: &str) -> Value {
    json!({"type": "response.audio.delta", "response_id": "resp_mock", "delta": delta})
}

pub fn transcript_delta(delta: &str) -> Value {
    json!({"type": "response.audio_transcript.delta", "response_id": "resp_mock", "delta": delta})
}

pub fn input_transcription_completed(transcript: &str) -> Value {
    json!({
        "type": "conversation.item.input_audio_transcription.completed",
        "item_id": "item_mock",
        "content_index": 0,
        "transcript": transcript
    })
}

pub fn response_done() -> Value {
    json!({"type": "response.done", "response": {"id": "resp_mock", "status": "completed"}})
}

/// Noise the real API sends that the bridge does not act on.
pub fn rate_limits_updated() -> Value {
    json!({"type": "rate_limits.updated", "rate_limits": []})
}

/// A response whose input transcript arrives after the first transcript deltas.
pub fn late_input_transcript_script() -> Vec<ScriptStep> {
    vec![
        response_created().into(),
        transcript_delta("Bon").into(),
        audio_delta("AAAA").into(),
        rate_limits_updated().into(),
        transcript_delta("jour").into(),
        input_transcription_completed("Hello").into(),
        transcript_delta("!").into(),
        audio_delta("BBBB").into(),
        response_done().into(),
    ]
}
