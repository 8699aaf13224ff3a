//! Event reconciliation.
//!
//! The Realtime API may send fragments of the assistant's transcript before it
//! reports the transcription of the user's utterance that prompted them. A
//! [`Reconciler`] turns the raw inbound stream into an ordered sequence of
//! [`OutputSink`] calls, according to its [`ReorderingPolicy`]:
//!
//! - [`ReorderingPolicy::Streaming`] forwards every event as it arrives.
//! - [`ReorderingPolicy::WaitInputTranscript`] holds assistant transcript text
//!   back until the input transcript has been shown, then releases it in
//!   original order. Audio is never held back.
//!
//! # State machine (`WaitInputTranscript`)
//!
//! | phase | transcript delta | input transcript completed | response done |
//! |---|---|---|---|
//! | `AwaitingInputTranscript` | buffer | show input, flush, -> `AwaitingResponseDone` | flush, end, stay |
//! | `AwaitingResponseDone` | flush-merge or show | show input, stay | end, -> `AwaitingInputTranscript` |
//!
//! State is committed before the sink calls it enables are made, so a failing
//! sink never leaves a half-updated buffer behind.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::events::{DecodeError, Event, EventDecoder};
use super::sink::{OutputSink, SinkCall, SinkError};

/// Errors surfaced by [`Reconciler::on_event`].
///
/// Unknown event types never appear here; they are dropped.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// A recognized event did not match its schema
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The output sink failed
    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// How transcript fragments are ordered relative to the input transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReorderingPolicy {
    /// Forward events in arrival order
    #[default]
    #[serde(alias = "none")]
    Streaming,
    /// Show the input transcript before any assistant transcript that
    /// arrived ahead of it
    #[serde(alias = "ordered")]
    WaitInputTranscript,
}

impl ReorderingPolicy {
    /// Convert to the configuration value.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Streaming => "streaming",
            Self::WaitInputTranscript => "wait_input_transcript",
        }
    }
}

impl fmt::Display for ReorderingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ReorderingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "streaming" | "none" => Ok(Self::Streaming),
            "wait_input_transcript" | "ordered" => Ok(Self::WaitInputTranscript),
            other => Err(format!(
                "Invalid reordering policy '{other}'. Expected 'streaming' or 'ordered'"
            )),
        }
    }
}

/// Position in the response cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// The user's input transcript has not been shown yet
    #[default]
    AwaitingInputTranscript,
    /// The input transcript was shown; transcript text flows straight through
    AwaitingResponseDone,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::AwaitingInputTranscript => write!(f, "AwaitingInputTranscript"),
            Phase::AwaitingResponseDone => write!(f, "AwaitingResponseDone"),
        }
    }
}

/// Converts inbound events into ordered sink calls.
///
/// One instance serves one connection; `on_event` takes `&mut self`, so calls
/// are sequential by construction.
pub struct Reconciler<S> {
    decoder: EventDecoder,
    sink: S,
    policy: ReorderingPolicy,
    phase: Phase,
    pending_transcript: String,
}

impl<S: OutputSink> Reconciler<S> {
    /// Create a reconciler.
    pub fn new(decoder: EventDecoder, sink: S, policy: ReorderingPolicy) -> Self {
        Self {
            decoder,
            sink,
            policy,
            phase: Phase::default(),
            pending_transcript: String::new(),
        }
    }

    /// Pass-through reconciler over the full event set.
    pub fn streaming(sink: S) -> Self {
        Self::new(EventDecoder::new(), sink, ReorderingPolicy::Streaming)
    }

    /// Input-transcript-aware reconciler over the full event set.
    pub fn ordered(sink: S) -> Self {
        Self::new(
            EventDecoder::new(),
            sink,
            ReorderingPolicy::WaitInputTranscript,
        )
    }

    pub fn policy(&self) -> ReorderingPolicy {
        self.policy
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Assistant transcript text held back, awaiting a flush.
    pub fn pending_transcript(&self) -> &str {
        &self.pending_transcript
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Handle one raw inbound message.
    ///
    /// Unknown event types are dropped. Malformed events for a known type and
    /// sink failures are returned; the reconciler stays usable either way.
    pub async fn on_event(&mut self, raw: &Value) -> Result<(), ReconcileError> {
        let event = match self.decoder.decode(raw) {
            Ok(event) => event,
            Err(e) if e.is_unknown() => {
                tracing::trace!("Dropping event: {}", e);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        for call in self.transition(event) {
            call.apply(&mut self.sink).await?;
        }
        Ok(())
    }

    /// Apply `event` to the state and return the sink calls it produces.
    pub fn transition(&mut self, event: Event) -> Vec<SinkCall> {
        match self.policy {
            ReorderingPolicy::Streaming => Self::stream(event),
            ReorderingPolicy::WaitInputTranscript => self.reorder(event),
        }
    }

    fn stream(event: Event) -> Vec<SinkCall> {
        match event {
            Event::AudioDelta { delta } => vec![SinkCall::PlayAudio(delta)],
            Event::TranscriptDelta { delta } if delta.is_empty() => Vec::new(),
            Event::TranscriptDelta { delta } => vec![SinkCall::ShowTranscript(delta)],
            Event::ResponseCreated => vec![SinkCall::ResponseStarted],
            Event::ResponseDone => vec![SinkCall::ResponseEnded],
            Event::InputTranscriptionCompleted { transcript } => {
                vec![SinkCall::ShowInputTranscript(transcript)]
            }
        }
    }

    fn reorder(&mut self, event: Event) -> Vec<SinkCall> {
        match event {
            Event::AudioDelta { delta } => vec![SinkCall::PlayAudio(delta)],
            Event::TranscriptDelta { delta } => match self.phase {
                Phase::AwaitingInputTranscript => {
                    self.pending_transcript.push_str(&delta);
                    Vec::new()
                }
                Phase::AwaitingResponseDone => {
                    if let Some(mut merged) = self.take_pending() {
                        merged.push_str(&delta);
                        vec![SinkCall::ShowTranscript(merged)]
                    } else if !delta.is_empty() {
                        vec![SinkCall::ShowTranscript(delta)]
                    } else {
                        Vec::new()
                    }
                }
            },
            Event::ResponseCreated => vec![SinkCall::ResponseStarted],
            Event::ResponseDone => {
                let mut calls = Vec::with_capacity(2);
                if let Some(pending) = self.take_pending() {
                    calls.push(SinkCall::ShowTranscript(pending));
                }
                calls.push(SinkCall::ResponseEnded);
                self.phase = Phase::AwaitingInputTranscript;
                calls
            }
            Event::InputTranscriptionCompleted { transcript } => {
                if self.phase == Phase::AwaitingResponseDone {
                    tracing::debug!("Input transcript completed twice in one response cycle");
                }
                let mut calls = vec![SinkCall::ShowInputTranscript(transcript)];
                if let Some(pending) = self.take_pending() {
                    calls.push(SinkCall::ShowTranscript(pending));
                }
                self.phase = Phase::AwaitingResponseDone;
                calls
            }
        }
    }

    /// Empty the buffer, returning its contents if there were any.
    fn take_pending(&mut self) -> Option<String> {
        if self.pending_transcript.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.pending_transcript))
        }
    }
}
