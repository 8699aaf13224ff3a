//! Outbound event producer.
//!
//! Serializes [`ClientEvent`]s and writes them as text frames, one frame per
//! event, in call order.

use std::fmt::Display;

use futures::{Sink, SinkExt};
use tokio_tungstenite::tungstenite::Message;

use super::messages::ClientEvent;
use super::tools::FunctionTool;
use crate::core::realtime::error::{RealtimeError, RealtimeResult};

/// Writes client events to the upstream socket.
pub struct OpenAIEventProducer<S> {
    sink: S,
}

impl<S> OpenAIEventProducer<S>
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    /// Send one event.
    pub async fn send(&mut self, event: ClientEvent) -> RealtimeResult<()> {
        let json = serde_json::to_string(&event)?;
        tracing::debug!("Sending {}", event.event_type());
        self.sink
            .send(Message::Text(json.into()))
            .await
            .map_err(|e| RealtimeError::WebSocketError(e.to_string()))
    }

    pub async fn session_update(
        &mut self,
        tools: &[FunctionTool],
        transcription_model: &str,
    ) -> RealtimeResult<()> {
        self.send(ClientEvent::session_update(tools, transcription_model))
            .await
    }

    /// Append base64 pcm16 audio to the input buffer.
    pub async fn append_audio(&mut self, audio: String) -> RealtimeResult<()> {
        self.send(ClientEvent::InputAudioBufferAppend { audio })
            .await
    }

    pub async fn commit_audio(&mut self) -> RealtimeResult<()> {
        self.send(ClientEvent::InputAudioBufferCommit).await
    }

    pub async fn create_response(&mut self, tools: &[FunctionTool]) -> RealtimeResult<()> {
        self.send(ClientEvent::response_create(tools)).await
    }

    /// Send a close frame.
    pub async fn close(&mut self) -> RealtimeResult<()> {
        self.sink
            .close()
            .await
            .map_err(|e| RealtimeError::WebSocketError(e.to_string()))
    }
}
