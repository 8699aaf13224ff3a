//! Bridge WebSocket route configuration

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::bridge_handler;
use crate::state::AppState;
use std::sync::Arc;

/// Create the bridge WebSocket router
///
/// # Endpoint
///
/// `GET /ws` - WebSocket upgrade bridged to the OpenAI Realtime API
///
/// # Example
///
/// ```json
/// // Client sends a WAV recording as one binary frame
/// // Server responds
/// {"type": "input_transcript", "data": "What's in stock?"}
/// {"type": "audio", "data": "<base64 pcm16>"}
/// {"type": "transcript", "data": "We have"}
/// {"type": "message", "data": "response.done"}
/// ```
pub fn create_bridge_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ws", get(bridge_handler))
        .layer(TraceLayer::new_for_http())
}
