//! Output sink abstraction consumed by the reconciler.
//!
//! A sink is whatever presents reconciled events: the client websocket in
//! production, a `Vec<SinkCall>` in tests, a terminal printer while debugging.

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by an output sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The downstream consumer has gone away
    #[error("Output sink closed")]
    Closed,
}

/// Result type for sink operations.
pub type SinkResult<T> = Result<T, SinkError>;

/// Side effects a reconciler can request.
///
/// Implementations must not block indefinitely: the reconciler awaits each
/// call before processing the next event.
#[async_trait]
pub trait OutputSink: Send {
    /// Play a chunk of response audio (base64 text, as received).
    async fn play_audio(&mut self, audio: &str) -> SinkResult<()>;

    /// Display assistant transcript text.
    async fn show_transcript(&mut self, text: &str) -> SinkResult<()>;

    /// Display the transcript of the user's input audio.
    async fn show_input_transcript(&mut self, text: &str) -> SinkResult<()>;

    /// A response started.
    async fn response_started(&mut self) -> SinkResult<()>;

    /// A response finished.
    async fn response_ended(&mut self) -> SinkResult<()>;
}

/// One requested sink operation, as a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    PlayAudio(String),
    ShowTranscript(String),
    ShowInputTranscript(String),
    ResponseStarted,
    ResponseEnded,
}

impl SinkCall {
    /// Invoke the matching operation on `sink`.
    pub async fn apply<S>(&self, sink: &mut S) -> SinkResult<()>
    where
        S: OutputSink + ?Sized,
    {
        match self {
            SinkCall::PlayAudio(audio) => sink.play_audio(audio).await,
            SinkCall::ShowTranscript(text) => sink.show_transcript(text).await,
            SinkCall::ShowInputTranscript(text) => sink.show_input_transcript(text).await,
            SinkCall::ResponseStarted => sink.response_started().await,
            SinkCall::ResponseEnded => sink.response_ended().await,
        }
    }
}

/// Records every call in order.
#[async_trait]
impl OutputSink for Vec<SinkCall> {
    async fn play_audio(&mut self, audio: &str) -> SinkResult<()> {
        self.push(SinkCall::PlayAudio(audio.to_string()));
        Ok(())
    }

    async fn show_transcript(&mut self, text: &str) -> SinkResult<()> {
        self.push(SinkCall::ShowTranscript(text.to_string()));
        Ok(())
    }

    async fn show_input_transcript(&mut self, text: &str) -> SinkResult<()> {
        self.push(SinkCall::ShowInputTranscript(text.to_string()));
        Ok(())
    }

    async fn response_started(&mut self) -> SinkResult<()> {
        self.push(SinkCall::ResponseStarted);
        Ok(())
    }

    async fn response_ended(&mut self) -> SinkResult<()> {
        self.push(SinkCall::ResponseEnded);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_apply_dispatches_to_matching_operation() {
        let mut sink: Vec<SinkCall> = Vec::new();
        let calls = vec![
            SinkCall::ResponseStarted,
            SinkCall::PlayAudio("AAAA".to_string()),
            SinkCall::ShowInputTranscript("Bonjour".to_string()),
            SinkCall::ShowTranscript("Hi".to_string()),
            SinkCall::ResponseEnded,
        ];

        for call in &calls {
            call.apply(&mut sink).await.unwrap();
        }

        assert_eq!(sink, calls);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(SinkError::Closed.to_string(), "Output sink closed");
    }
}
