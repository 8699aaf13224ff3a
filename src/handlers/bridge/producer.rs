//! Client-facing output sink.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::messages::{BridgeMessageRoute, UiMessage};
use crate::core::realtime::{OutputSink, SinkError, SinkResult};

/// Presents reconciled events to the client by queueing [`UiMessage`]s on the
/// connection's sender channel.
pub struct UiEventProducer {
    tx: mpsc::Sender<BridgeMessageRoute>,
}

impl UiEventProducer {
    pub fn new(tx: mpsc::Sender<BridgeMessageRoute>) -> Self {
        Self { tx }
    }

    async fn send(&self, msg: UiMessage) -> SinkResult<()> {
        self.tx
            .send(BridgeMessageRoute::Outgoing(msg))
            .await
            .map_err(|_| SinkError::Closed)
    }
}

#[async_trait]
impl OutputSink for UiEventProducer {
    async fn play_audio(&mut self, audio: &str) -> SinkResult<()> {
        self.send(UiMessage::Audio(audio.to_string())).await
    }

    async fn show_transcript(&mut self, text: &str) -> SinkResult<()> {
        self.send(UiMessage::Transcript(text.to_string())).await
    }

    async fn show_input_transcript(&mut self, text: &str) -> SinkResult<()> {
        self.send(UiMessage::InputTranscript(text.to_string()))
            .await
    }

    // The client has no use for a start notice.
    async fn response_started(&mut self) -> SinkResult<()> {
        Ok(())
    }

    async fn response_ended(&mut self) -> SinkResult<()> {
        self.send(UiMessage::response_done()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::realtime::Reconciler;
    use serde_json::json;

    fn drain(rx: &mut mpsc::Receiver<BridgeMessageRoute>) -> Vec<UiMessage> {
        let mut out = Vec::new();
        while let Ok(route) = rx.try_recv() {
            match route {
                BridgeMessageRoute::Outgoing(msg) => out.push(msg),
                BridgeMessageRoute::Close => panic!("Unexpected close"),
            }
        }
        out
    }

    #[tokio::test]
    async fn test_sink_operations_map_to_ui_messages() {
        let (tx, mut rx) = mpsc::channel(16);
        let mut producer = UiEventProducer::new(tx);

        producer.response_started().await.unwrap();
        producer.play_audio("AAAA").await.unwrap();
        producer.show_input_transcript("Bonjour").await.unwrap();
        producer.show_transcript("Hi").await.unwrap();
        producer.response_ended().await.unwrap();

        assert_eq!(
            drain(&mut rx),
            vec![
                UiMessage::Audio("AAAA".to_string()),
                UiMessage::InputTranscript("Bonjour".to_string()),
                UiMessage::Transcript("Hi".to_string()),
                UiMessage::response_done(),
            ]
        );
    }

    #[tokio::test]
    async fn test_closed_channel_is_sink_closed() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let mut producer = UiEventProducer::new(tx);

        assert!(matches!(
            producer.show_transcript("lost").await,
            Err(SinkError::Closed)
        ));
        // Nothing is sent, so nothing can fail.
        assert!(producer.response_started().await.is_ok());
    }

    #[tokio::test]
    async fn test_reconciler_drives_ui_producer() {
        let (tx, mut rx) = mpsc::channel(16);
        let mut reconciler = Reconciler::ordered(UiEventProducer::new(tx));

        for event in [
            json!({"type": "response.audio_transcript.delta", "delta": "Hi"}),
            json!({"type": "conversation.item.input_audio_transcription.completed", "transcript": "Bonjour"}),
            json!({"type": "response.done"}),
        ] {
            reconciler.on_event(&event).await.unwrap();
        }

        assert_eq!(
            drain(&mut rx),
            vec![
                UiMessage::InputTranscript("Bonjour".to_string()),
                UiMessage::Transcript("Hi".to_string()),
                UiMessage::response_done(),
            ]
        );
    }
}
