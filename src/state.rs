use std::sync::Arc;

use crate::config::ServerConfig;

/// Shared application state.
pub struct AppState {
    pub config: ServerConfig,
}

impl AppState {
    pub async fn new(config: ServerConfig) -> Arc<Self> {
        Arc::new(Self { config })
    }
}
