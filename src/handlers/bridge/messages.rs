//! Bridge WebSocket message types
//!
//! Every server-to-client message is a JSON object `{"type": ..., "data": ...}`.

use serde::{Deserialize, Serialize};

/// Notice sent when a response has finished.
pub const RESPONSE_DONE_NOTICE: &str = "response.done";

// =============================================================================
// Outgoing Messages (Server -> Client)
// =============================================================================

/// Outgoing WebSocket messages to client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum UiMessage {
    /// Base64 pcm16 audio chunk of the assistant's response
    #[serde(rename = "audio")]
    Audio(String),

    /// Assistant transcript text
    #[serde(rename = "transcript")]
    Transcript(String),

    /// Transcript of the user's input audio
    #[serde(rename = "input_transcript")]
    InputTranscript(String),

    /// Lifecycle notice, e.g. `response.done`
    #[serde(rename = "message")]
    Message(String),

    /// The last client upload could not be processed
    #[serde(rename = "error")]
    Error(String),
}

impl UiMessage {
    pub fn response_done() -> Self {
        UiMessage::Message(RESPONSE_DONE_NOTICE.to_string())
    }
}

// =============================================================================
// Message Routing
// =============================================================================

/// Message routing to the client sender task
#[derive(Debug)]
pub enum BridgeMessageRoute {
    /// JSON text message
    Outgoing(UiMessage),
    /// Close connection
    Close,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ui_message_shapes() {
        let cases = [
            (UiMessage::Audio("AAAA".to_string()), json!({"type": "audio", "data": "AAAA"})),
            (
                UiMessage::Transcript("Hi".to_string()),
                json!({"type": "transcript", "data": "Hi"}),
            ),
            (
                UiMessage::InputTranscript("Bonjour".to_string()),
                json!({"type": "input_transcript", "data": "Bonjour"}),
            ),
            (
                UiMessage::response_done(),
                json!({"type": "message", "data": "response.done"}),
            ),
        ];

        for (msg, expected) in cases {
            assert_eq!(serde_json::to_value(&msg).expect("Should serialize"), expected);
        }
    }

    #[test]
    fn test_ui_message_deserialization() {
        let msg: UiMessage =
            serde_json::from_str(r#"{"type":"input_transcript","data":"hello"}"#)
                .expect("Should deserialize");
        assert_eq!(msg, UiMessage::InputTranscript("hello".to_string()));
    }
}
