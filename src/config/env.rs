//! Environment variable loading.

use std::env;
use std::path::PathBuf;

use super::{DEFAULT_CORS_ALLOWED_ORIGINS, ServerConfig, TlsConfig};
use crate::core::realtime::ReorderingPolicy;

/// Read a variable, treating empty values as unset.
pub(crate) fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Parse a boolean flag (`true`/`false`/`1`/`0`/`yes`/`no`).
pub(crate) fn parse_bool(name: &str, value: &str) -> Result<bool, String> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(format!("Invalid value for {name}: '{other}' is not a boolean")),
    }
}

/// Build a configuration from defaults overridden by environment variables.
pub(crate) fn load_from_env() -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let mut config = ServerConfig::default();

    if let Some(host) = var("HOST") {
        config.host = host;
    }
    if let Some(port) = var("PORT") {
        config.port = port
            .trim()
            .parse()
            .map_err(|e| format!("Invalid value for PORT: '{port}': {e}"))?;
    }

    config.tls = tls_from_env()?;

    if let Some(key) = var("OPENAI_API_KEY") {
        config.openai_api_key = Some(key);
    }
    if let Some(url) = var("OPENAI_REALTIME_URL") {
        config.realtime_url = url;
    }
    if let Some(model) = var("OPENAI_REALTIME_MODEL") {
        config.realtime_model = model;
    }
    if let Some(model) = var("OPENAI_TRANSCRIPTION_MODEL") {
        config.transcription_model = model;
    }

    if let Some(policy) = var("REORDERING_POLICY") {
        config.reordering_policy = policy
            .parse::<ReorderingPolicy>()
            .map_err(|e| format!("Invalid value for REORDERING_POLICY: {e}"))?;
    }
    if let Some(flag) = var("FAIL_ON_MALFORMED_EVENT") {
        config.fail_on_malformed_event = parse_bool("FAIL_ON_MALFORMED_EVENT", &flag)?;
    }

    config.cors_allowed_origins = Some(
        var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|| DEFAULT_CORS_ALLOWED_ORIGINS.to_string()),
    );

    Ok(config)
}

fn tls_from_env() -> Result<Option<TlsConfig>, String> {
    match (var("TLS_CERT_PATH"), var("TLS_KEY_PATH")) {
        (Some(cert), Some(key)) => Ok(Some(TlsConfig {
            cert_path: PathBuf::from(cert),
            key_path: PathBuf::from(key),
        })),
        (None, None) => Ok(None),
        _ => Err("TLS_CERT_PATH and TLS_KEY_PATH must be set together".to_string()),
    }
}
