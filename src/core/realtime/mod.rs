//! Realtime event processing.
//!
//! Inbound events from the OpenAI Realtime API flow through three stages:
//!
//! - [`EventDecoder`] recognizes a fixed set of event types and parses them
//!   into typed [`Event`]s; everything else is dropped.
//! - [`Reconciler`] turns events into ordered [`OutputSink`] calls, either
//!   streaming them through or holding assistant transcript text until the
//!   user's input transcript has been shown.
//! - An [`OutputSink`] presents the result (the client websocket in the
//!   bridge, a `Vec<SinkCall>` in tests).
//!
//! [`pump_upstream`] drives a reconciler from an upstream socket.
//!
//! # Example
//!
//! ```rust,ignore
//! use realtime_bridge::core::realtime::{Reconciler, SinkCall};
//! use serde_json::json;
//!
//! let mut reconciler = Reconciler::ordered(Vec::<SinkCall>::new());
//! reconciler.on_event(&json!({"type": "response.audio_transcript.delta", "delta": "Hi"})).await?;
//! reconciler.on_event(&json!({
//!     "type": "conversation.item.input_audio_transcription.completed",
//!     "transcript": "Bonjour"
//! })).await?;
//! // [ShowInputTranscript("Bonjour"), ShowTranscript("Hi")]
//! ```

mod error;
pub mod events;
pub mod openai;
mod pump;
pub mod reconciler;
pub mod sink;

pub use error::{RealtimeError, RealtimeResult};
pub use events::{DecodeError, Event, EventDecoder, EventKind};
pub use pump::{PumpExit, pump_upstream};
pub use reconciler::{Phase, ReconcileError, Reconciler, ReorderingPolicy};
pub use sink::{OutputSink, SinkCall, SinkError, SinkResult};
