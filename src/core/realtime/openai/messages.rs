//! OpenAI Realtime API client event types.
//!
//! Client events sent by the bridge:
//! - session.update - Advertise tools and enable input transcription
//! - input_audio_buffer.append - Append audio to buffer
//! - input_audio_buffer.commit - Commit audio buffer
//! - response.create - Generate a response
//!
//! Server events are decoded by [`crate::core::realtime::events`].

use serde::Serialize;

use super::tools::FunctionTool;

// =============================================================================
// Session Configuration
// =============================================================================

/// Session configuration sent in `session.update`.
#[derive(Debug, Clone, Serialize)]
pub struct SessionConfig {
    /// Tool definitions
    pub tools: Vec<FunctionTool>,

    /// Input audio transcription configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_audio_transcription: Option<InputAudioTranscription>,
}

/// Input audio transcription configuration.
#[derive(Debug, Clone, Serialize)]
pub struct InputAudioTranscription {
    /// Transcription model (e.g., "whisper-1")
    pub model: String,
}

// =============================================================================
// Response Configuration
// =============================================================================

/// Response configuration sent in `response.create`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResponseConfig {
    /// Tools available for this response
    pub tools: Vec<FunctionTool>,
}

// =============================================================================
// Client Events (sent to server)
// =============================================================================

/// Client events sent to the OpenAI Realtime API.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Update session configuration
    #[serde(rename = "session.update")]
    SessionUpdate {
        /// Session configuration
        session: SessionConfig,
    },

    /// Append audio to input buffer
    #[serde(rename = "input_audio_buffer.append")]
    InputAudioBufferAppend {
        /// Base64-encoded pcm16 audio
        audio: String,
    },

    /// Commit the input audio buffer
    #[serde(rename = "input_audio_buffer.commit")]
    InputAudioBufferCommit,

    /// Create a response
    #[serde(rename = "response.create")]
    ResponseCreate {
        /// Response configuration
        response: ResponseConfig,
    },
}

impl ClientEvent {
    /// `session.update` advertising `tools` with input transcription enabled.
    pub fn session_update(tools: &[FunctionTool], transcription_model: &str) -> Self {
        ClientEvent::SessionUpdate {
            session: SessionConfig {
                tools: tools.to_vec(),
                input_audio_transcription: Some(InputAudioTranscription {
                    model: transcription_model.to_string(),
                }),
            },
        }
    }

    pub fn response_create(tools: &[FunctionTool]) -> Self {
        ClientEvent::ResponseCreate {
            response: ResponseConfig {
                tools: tools.to_vec(),
            },
        }
    }

    /// The `type` tag this event serializes with.
    pub fn event_type(&self) -> &'static str {
        match self {
            ClientEvent::SessionUpdate { .. } => "session.update",
            ClientEvent::InputAudioBufferAppend { .. } => "input_audio_buffer.append",
            ClientEvent::InputAudioBufferCommit => "input_audio_buffer.commit",
            ClientEvent::ResponseCreate { .. } => "response.create",
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
