//! OpenAI Realtime API WebSocket connection.
//!
//! # Example
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use realtime_bridge::core::realtime::openai::{OpenAIRealtimeConfig, connect};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = OpenAIRealtimeConfig::new("sk-...");
//!     let socket = connect(&config).await.unwrap();
//!     let (sink, stream) = socket.split();
//! }
//! ```

use http::{HeaderValue, StatusCode};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, client::IntoClientRequest};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use super::config::{OPENAI_BETA_HEADER, OpenAIRealtimeConfig};
use crate::core::realtime::error::{RealtimeError, RealtimeResult};

/// An open upstream connection.
pub type UpstreamSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Build the upgrade request with authentication headers.
pub fn build_request(
    config: &OpenAIRealtimeConfig,
) -> RealtimeResult<http::Request<()>> {
    let url = config.ws_url()?;
    let mut request = url
        .as_str()
        .into_client_request()
        .map_err(|e| RealtimeError::ConnectionFailed(e.to_string()))?;

    let auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
        .map_err(|e| RealtimeError::InvalidConfiguration(format!("Invalid API key: {e}")))?;
    let headers = request.headers_mut();
    headers.insert(http::header::AUTHORIZATION, auth);
    headers.insert("OpenAI-Beta", HeaderValue::from_static(OPENAI_BETA_HEADER));

    Ok(request)
}

/// Open a WebSocket to the Realtime API.
pub async fn connect(config: &OpenAIRealtimeConfig) -> RealtimeResult<UpstreamSocket> {
    config.validate()?;
    let request = build_request(config)?;

    let (socket, response) = tokio_tungstenite::connect_async(request)
        .await
        .map_err(connect_error)?;

    tracing::info!(
        "Connected to OpenAI Realtime API (model: {}, status: {})",
        config.model,
        response.status()
    );
    Ok(socket)
}

fn connect_error(e: tungstenite::Error) -> RealtimeError {
    match &e {
        tungstenite::Error::Http(response)
            if response.status() == StatusCode::UNAUTHORIZED
                || response.status() == StatusCode::FORBIDDEN =>
        {
            RealtimeError::AuthenticationFailed(format!(
                "Realtime API rejected the API key ({})",
                response.status()
            ))
        }
        _ => RealtimeError::ConnectionFailed(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request_headers() {
        let config = OpenAIRealtimeConfig::new("sk-test");
        let request = build_request(&config).unwrap();

        assert_eq!(
            request.uri().to_string(),
            "wss://api.openai.com/v1/realtime?model=gpt-4o-realtime-preview-2024-10-01"
        );
        assert_eq!(request.headers()["authorization"], "Bearer sk-test");
        assert_eq!(request.headers()["openai-beta"], "realtime=v1");
        assert!(request.headers().contains_key("sec-websocket-key"));
    }

    #[test]
    fn test_build_request_rejects_header_breaking_key() {
        let config = OpenAIRealtimeConfig::new("sk-test\nX-Injected: 1");
        assert!(matches!(
            build_request(&config),
            Err(RealtimeError::InvalidConfiguration(_))
        ));
    }

    #[tokio::test]
    async fn test_connect_requires_api_key() {
        let config = OpenAIRealtimeConfig::default();
        let result = connect(&config).await;
        assert!(matches!(
            result,
            Err(RealtimeError::InvalidConfiguration(_))
        ));
    }

    #[tokio::test]
    async fn test_http_401_is_authentication_failure() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf).await;
            stream
                .write_all(b"HTTP/1.1 401 Unauthorized\r\nContent-Length: 0\r\n\r\n")
                .await
                .unwrap();
        });

        let mut config = OpenAIRealtimeConfig::new("sk-wrong");
        config.url = format!("ws://{addr}/v1/realtime");

        let result = connect(&config).await;
        assert!(matches!(
            result,
            Err(RealtimeError::AuthenticationFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut config = OpenAIRealtimeConfig::new("sk-test");
        config.url = format!("ws://{addr}/v1/realtime");

        let result = connect(&config).await;
        assert!(matches!(result, Err(RealtimeError::ConnectionFailed(_))));
    }
}
