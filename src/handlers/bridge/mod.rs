//! Client bridge WebSocket handlers
//!
//! Bridges a browser client to the OpenAI Realtime API.
//!
//! # Protocol
//!
//! ## Client → Server
//!
//! - **Binary frames**: one complete utterance per frame, either a WAV file or
//!   raw PCM 16-bit, 24kHz, mono
//!
//! ## Server → Client
//!
//! - **audio**: base64 pcm16 response audio
//! - **transcript**: assistant transcript text
//! - **input_transcript**: transcript of the user's utterance
//! - **message**: `response.done` when a response has finished
//! - **error**: an upload could not be processed, or the upstream is unavailable

mod consumer;
mod handler;
pub mod messages;
mod producer;

pub use consumer::ClientEventConsumer;
pub use handler::{ClientExit, bridge_handler, run_client_loop};
pub use producer::UiEventProducer;
