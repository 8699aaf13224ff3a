//! OpenAI Realtime API module.
//!
//! Connection setup and outbound events for the OpenAI Realtime API. Inbound
//! events are handled by the reconciler in the parent module.
//!
//! # Audio Format
//!
//! Input audio is PCM 16-bit signed little-endian, mono, at 24kHz, sent as
//! base64 in `input_audio_buffer.append`.
//!
//! # Example
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use realtime_bridge::core::realtime::openai::{OpenAIEventProducer, OpenAIRealtimeConfig, connect};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = OpenAIRealtimeConfig::new("sk-...");
//!     let (sink, stream) = connect(&config).await.unwrap().split();
//!
//!     let mut producer = OpenAIEventProducer::new(sink);
//!     producer.session_update(&[], &config.transcription_model).await.unwrap();
//!     producer.append_audio(audio_b64).await.unwrap();
//!     producer.commit_audio().await.unwrap();
//!     producer.create_response(&[]).await.unwrap();
//! }
//! ```

mod client;
mod config;
mod messages;
mod producer;
mod tools;

pub use client::{UpstreamSocket, build_request, connect};
pub use config::{
    DEFAULT_REALTIME_MODEL, DEFAULT_TRANSCRIPTION_MODEL, OPENAI_BETA_HEADER,
    OPENAI_REALTIME_SAMPLE_RATE, OPENAI_REALTIME_URL, OpenAIRealtimeConfig,
};
pub use messages::{ClientEvent, InputAudioTranscription, ResponseConfig, SessionConfig};
pub use producer::OpenAIEventProducer;
pub use tools::{FunctionTool, ParameterKind, ToolParameter};
