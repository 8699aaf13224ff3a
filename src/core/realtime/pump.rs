//! Upstream receive loop.
//!
//! Reads frames from the Realtime API socket and feeds each text frame, parsed
//! as JSON, to a [`Reconciler`]. Returns once the stream ends or a failure
//! makes continuing pointless.

use futures::{Stream, StreamExt};
use serde_json::Value;
use tokio_tungstenite::tungstenite::{self, Message};

use super::events::DecodeError;
use super::reconciler::{ReconcileError, Reconciler};
use super::sink::{OutputSink, SinkError};

/// Why the upstream loop stopped.
#[derive(Debug)]
pub enum PumpExit {
    /// The upstream closed the connection or the stream ended
    UpstreamClosed,
    /// The upstream socket failed
    UpstreamError(String),
    /// The output sink failed; nothing further can be presented
    SinkFailed(SinkError),
    /// A recognized event did not match its schema and malformed events are fatal
    MalformedEvent(DecodeError),
}

impl PumpExit {
    pub fn is_clean(&self) -> bool {
        matches!(self, PumpExit::UpstreamClosed)
    }
}

/// Drive `reconciler` from `stream` until it ends.
///
/// Non-JSON text frames and binary frames are skipped. Malformed events are
/// logged and skipped unless `fail_on_malformed` is set.
pub async fn pump_upstream<St, S>(
    stream: &mut St,
    reconciler: &mut Reconciler<S>,
    fail_on_malformed: bool,
) -> PumpExit
where
    St: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
    S: OutputSink,
{
    while let Some(msg) = stream.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let raw: Value = match serde_json::from_str(&text) {
                    Ok(value) => value,
                    Err(e) => {
                        tracing::warn!("Ignoring non-JSON upstream frame: {}", e);
                        continue;
                    }
                };

                match reconciler.on_event(&raw).await {
                    Ok(()) => {}
                    Err(ReconcileError::Decode(e)) => {
                        if fail_on_malformed {
                            tracing::error!("Malformed upstream event: {}", e);
                            return PumpExit::MalformedEvent(e);
                        }
                        tracing::warn!("Skipping malformed upstream event: {}", e);
                    }
                    Err(ReconcileError::Sink(e)) => {
                        tracing::info!("Output sink failed, stopping upstream loop: {}", e);
                        return PumpExit::SinkFailed(e);
                    }
                }
            }
            Ok(Message::Close(frame)) => {
                tracing::info!("Upstream closed: {:?}", frame);
                return PumpExit::UpstreamClosed;
            }
            Ok(Message::Binary(data)) => {
                tracing::debug!("Ignoring {} byte binary upstream frame", data.len());
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!("Upstream WebSocket error: {}", e);
                return PumpExit::UpstreamError(e.to_string());
            }
        }
    }

    PumpExit::UpstreamClosed
}
