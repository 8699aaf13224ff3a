//! Configuration module for the realtime bridge
//!
//! This module handles server configuration from various sources: .env files, YAML files,
//! and environment variables. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//!
//! # Example
//! ```rust,no_run
//! use realtime_bridge::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

mod env;
mod yaml;

use crate::core::realtime::ReorderingPolicy;
use crate::core::realtime::openai::{
    DEFAULT_REALTIME_MODEL, DEFAULT_TRANSCRIPTION_MODEL, FunctionTool, OPENAI_REALTIME_URL,
    OpenAIRealtimeConfig,
};
use crate::core::realtime::{RealtimeError, RealtimeResult};

pub use yaml::YamlConfig;

/// Origins allowed by default: the bundled UI served locally.
pub const DEFAULT_CORS_ALLOWED_ORIGINS: &str =
    "http://localhost,http://localhost:8000,http://127.0.0.1,http://127.0.0.1:8000";

/// TLS configuration for HTTPS and WSS
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// Path to the TLS certificate file (PEM format)
    pub cert_path: PathBuf,
    /// Path to the TLS private key file (PEM format)
    pub key_path: PathBuf,
}

/// Server configuration
///
/// Contains everything needed to run the bridge:
/// - Listen address and optional TLS
/// - OpenAI Realtime API credentials and model selection
/// - Reconciliation behaviour and advertised tools
/// - CORS origins
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // TLS configuration (optional)
    pub tls: Option<TlsConfig>,

    // OpenAI Realtime API
    pub openai_api_key: Option<String>,
    pub realtime_url: String,
    pub realtime_model: String,
    pub transcription_model: String,

    // Bridge behaviour
    pub reordering_policy: ReorderingPolicy,
    /// End the bridge on an event that matches a known type but not its schema
    pub fail_on_malformed_event: bool,
    pub tools: Vec<FunctionTool>,

    /// CORS allowed origins (comma-separated list or "*" for all)
    /// None: same-origin only
    pub cors_allowed_origins: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            tls: None,
            openai_api_key: None,
            realtime_url: OPENAI_REALTIME_URL.to_string(),
            realtime_model: DEFAULT_REALTIME_MODEL.to_string(),
            transcription_model: DEFAULT_TRANSCRIPTION_MODEL.to_string(),
            reordering_policy: ReorderingPolicy::default(),
            fail_on_malformed_event: false,
            tools: Vec::new(),
            cors_allowed_origins: Some(DEFAULT_CORS_ALLOWED_ORIGINS.to_string()),
        }
    }
}

/// Zeroize secret fields when ServerConfig is dropped.
impl Drop for ServerConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        if let Some(ref mut key) = self.openai_api_key {
            key.zeroize();
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// Missing variables fall back to defaults. The .env file is loaded in
    /// `main` before this is called.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let config = env::load_from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file with environment variable base
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let yaml_config = YamlConfig::from_file(path)?;
        let mut config = env::load_from_env()?;
        config.apply_yaml(yaml_config)?;
        config.validate()?;
        Ok(config)
    }

    fn apply_yaml(&mut self, yaml: YamlConfig) -> Result<(), String> {
        if let Some(server) = yaml.server {
            if let Some(host) = server.host {
                self.host = host;
            }
            if let Some(port) = server.port {
                self.port = port;
            }
            if let Some(tls) = server.tls {
                match (tls.cert_path, tls.key_path) {
                    (Some(cert), Some(key)) => {
                        self.tls = Some(TlsConfig {
                            cert_path: PathBuf::from(cert),
                            key_path: PathBuf::from(key),
                        });
                    }
                    (None, None) => {}
                    _ => {
                        return Err(
                            "server.tls.cert_path and server.tls.key_path must be set together"
                                .to_string(),
                        );
                    }
                }
            }
        }

        if let Some(openai) = yaml.openai {
            if let Some(key) = openai.api_key {
                self.openai_api_key = Some(key);
            }
            if let Some(url) = openai.realtime_url {
                self.realtime_url = url;
            }
            if let Some(model) = openai.model {
                self.realtime_model = model;
            }
            if let Some(model) = openai.transcription_model {
                self.transcription_model = model;
            }
        }

        if let Some(bridge) = yaml.bridge {
            if let Some(policy) = bridge.reordering_policy {
                self.reordering_policy = policy;
            }
            if let Some(flag) = bridge.fail_on_malformed_event {
                self.fail_on_malformed_event = flag;
            }
            if let Some(tools) = bridge.tools {
                self.tools = tools;
            }
        }

        if let Some(security) = yaml.security
            && let Some(origins) = security.cors_allowed_origins
        {
            self.cors_allowed_origins = Some(origins);
        }

        Ok(())
    }

    fn validate(&self) -> Result<(), String> {
        if self.realtime_model.trim().is_empty() {
            return Err("Realtime model must not be empty".to_string());
        }
        if !(self.realtime_url.starts_with("ws://") || self.realtime_url.starts_with("wss://")) {
            return Err(format!(
                "Realtime URL must start with ws:// or wss://, got '{}'",
                self.realtime_url
            ));
        }
        let mut names = std::collections::HashSet::new();
        for tool in &self.tools {
            if !names.insert(tool.name.as_str()) {
                return Err(format!("Duplicate tool name '{}'", tool.name));
            }
        }
        Ok(())
    }

    /// Get the server address as a string
    ///
    /// Returns the address in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if TLS is enabled
    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }

    /// Upstream connection settings.
    ///
    /// Fails when no API key is configured; the server itself can start without
    /// one, but no bridge can be opened.
    pub fn realtime_config(&self) -> RealtimeResult<OpenAIRealtimeConfig> {
        let api_key = self.openai_api_key.as_deref().ok_or_else(|| {
            RealtimeError::InvalidConfiguration(
                "OpenAI API key not configured. Set OPENAI_API_KEY or openai.api_key".to_string(),
            )
        })?;

        let mut config = OpenAIRealtimeConfig::new(api_key);
        config.url = self.realtime_url.clone();
        config.model = self.realtime_model.clone();
        config.transcription_model = self.transcription_model.clone();
        Ok(config)
    }
}
