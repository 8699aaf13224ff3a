//! OpenAI Realtime API connection settings.

use std::fmt;

use url::Url;
use zeroize::Zeroize;

use crate::core::realtime::error::{RealtimeError, RealtimeResult};

/// OpenAI Realtime API WebSocket endpoint.
pub const OPENAI_REALTIME_URL: &str = "wss://api.openai.com/v1/realtime";

/// Model requested when none is configured.
pub const DEFAULT_REALTIME_MODEL: &str = "gpt-4o-realtime-preview-2024-10-01";

/// Model used to transcribe the user's input audio.
pub const DEFAULT_TRANSCRIPTION_MODEL: &str = "whisper-1";

/// Audio sample rate expected by the Realtime API for pcm16 input.
pub const OPENAI_REALTIME_SAMPLE_RATE: u32 = 24000;

/// Beta header value required by the Realtime API.
pub const OPENAI_BETA_HEADER: &str = "realtime=v1";

/// Settings for one upstream connection.
#[derive(Clone)]
pub struct OpenAIRealtimeConfig {
    pub api_key: String,
    /// Base WebSocket URL, without query
    pub url: String,
    pub model: String,
    pub transcription_model: String,
}

impl OpenAIRealtimeConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        let mut config = Self::default();
        config.api_key = api_key.into();
        config
    }

    /// Full WebSocket URL with the model query parameter.
    pub fn ws_url(&self) -> RealtimeResult<Url> {
        let mut url = Url::parse(&self.url).map_err(|e| {
            RealtimeError::InvalidConfiguration(format!("Invalid realtime URL '{}': {e}", self.url))
        })?;
        match url.scheme() {
            "ws" | "wss" => {}
            other => {
                return Err(RealtimeError::InvalidConfiguration(format!(
                    "Realtime URL must use ws or wss, got '{other}'"
                )));
            }
        }
        url.query_pairs_mut().append_pair("model", &self.model);
        Ok(url)
    }

    pub fn validate(&self) -> RealtimeResult<()> {
        if self.api_key.is_empty() {
            return Err(RealtimeError::InvalidConfiguration(
                "OpenAI API key is required".to_string(),
            ));
        }
        if self.model.is_empty() {
            return Err(RealtimeError::InvalidConfiguration(
                "Realtime model must not be empty".to_string(),
            ));
        }
        self.ws_url().map(|_| ())
    }
}

impl Default for OpenAIRealtimeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            url: OPENAI_REALTIME_URL.to_string(),
            model: DEFAULT_REALTIME_MODEL.to_string(),
            transcription_model: DEFAULT_TRANSCRIPTION_MODEL.to_string(),
        }
    }
}

impl fmt::Debug for OpenAIRealtimeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAIRealtimeConfig")
            .field("api_key", &"[REDACTED]")
            .field("url", &self.url)
            .field("model", &self.model)
            .field("transcription_model", &self.transcription_model)
            .finish()
    }
}

impl Drop for OpenAIRealtimeConfig {
    fn drop(&mut self) {
        self.api_key.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ws_url_appends_model() {
        let config = OpenAIRealtimeConfig::new("sk-test");
        let url = config.ws_url().unwrap();
        assert_eq!(
            url.as_str(),
            "wss://api.openai.com/v1/realtime?model=gpt-4o-realtime-preview-2024-10-01"
        );
    }

    #[test]
    fn test_ws_url_custom_endpoint() {
        let mut config = OpenAIRealtimeConfig::new("sk-test");
        config.url = "ws://127.0.0.1:9000/v1/realtime".to_string();
        config.model = "gpt-4o-mini-realtime-preview".to_string();

        let url = config.ws_url().unwrap();
        assert_eq!(url.host_str(), Some("127.0.0.1"));
        assert_eq!(url.port(), Some(9000));
        assert_eq!(url.query(), Some("model=gpt-4o-mini-realtime-preview"));
    }

    #[test]
    fn test_rejects_non_websocket_url() {
        let mut config = OpenAIRealtimeConfig::new("sk-test");
        config.url = "https://api.openai.com/v1/realtime".to_string();
        assert!(matches!(
            config.ws_url(),
            Err(RealtimeError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_validate_requires_api_key() {
        let config = OpenAIRealtimeConfig::default();
        assert!(config.validate().is_err());
        assert!(OpenAIRealtimeConfig::new("sk-test").validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = OpenAIRealtimeConfig::new("sk-very-secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-very-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
