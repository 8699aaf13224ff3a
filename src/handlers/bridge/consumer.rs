//! Client-originated events.

use std::fmt::Display;

use futures::Sink;
use tokio_tungstenite::tungstenite::Message;

use crate::core::realtime::RealtimeResult;
use crate::core::realtime::openai::{FunctionTool, OpenAIEventProducer};

/// Turns client actions into upstream events.
pub struct ClientEventConsumer<S> {
    producer: OpenAIEventProducer<S>,
}

impl<S> ClientEventConsumer<S>
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    pub fn new(producer: OpenAIEventProducer<S>) -> Self {
        Self { producer }
    }

    /// Append a complete utterance and commit it.
    pub async fn on_audio(&mut self, audio: String) -> RealtimeResult<()> {
        self.producer.append_audio(audio).await?;
        self.producer.commit_audio().await
    }

    pub async fn on_response_create(&mut self, tools: &[FunctionTool]) -> RealtimeResult<()> {
        self.producer.create_response(tools).await
    }

    pub fn producer_mut(&mut self) -> &mut OpenAIEventProducer<S> {
        &mut self.producer
    }
}
