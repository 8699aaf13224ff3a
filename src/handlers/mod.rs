//! HTTP and WebSocket request handlers
//!
//! - `api` - Health check endpoint
//! - `bridge` - Client WebSocket bridged to the OpenAI Realtime API

pub mod api;
pub mod bridge;

// Re-export commonly used handlers for convenient access
pub use bridge::bridge_handler;
