use axum::{Json, extract::State};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::state::AppState;

/// Health check handler
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "OK",
        "version": env!("CARGO_PKG_VERSION"),
        "model": state.config.realtime_model,
        "reordering_policy": state.config.reordering_policy.as_str(),
        "upstream_configured": state.config.openai_api_key.is_some(),
    }))
}
