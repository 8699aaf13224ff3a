//! Inbound Realtime API events.
//!
//! The upstream API emits many more event types than the bridge reacts to.
//! This module decodes the handful that drive the UI into a closed [`Event`]
//! enum, and classifies everything else as either an unknown type (expected,
//! dropped by the reconciler) or a malformed payload for a known type
//! (surfaced to the caller).
//!
//! # Recognized events
//!
//! | tag | required fields |
//! |---|---|
//! | `response.audio.delta` | `delta: string` |
//! | `response.audio_transcript.delta` | `delta: string` |
//! | `response.created` | - |
//! | `response.done` | - |
//! | `conversation.item.input_audio_transcription.completed` | `transcript: string` |

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

/// Errors produced while decoding an inbound event.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The `type` tag is not one of the decoder's recognized tags
    #[error("Unknown event type: {0}")]
    UnknownEventType(String),

    /// The message carries no string `type` field
    #[error("Event has no type tag")]
    MissingEventType,

    /// The message is not a JSON object
    #[error("Event is not a JSON object")]
    NotAnObject,

    /// The tag is recognized but the payload does not match its schema
    #[error("Malformed {tag} event: {source}")]
    MalformedEvent {
        /// Tag of the recognized event
        tag: &'static str,
        /// Underlying schema mismatch
        #[source]
        source: serde_json::Error,
    },
}

impl DecodeError {
    /// Whether this error means "not an event we handle" rather than a
    /// protocol mismatch.
    pub fn is_unknown(&self) -> bool {
        matches!(
            self,
            DecodeError::UnknownEventType(_) | DecodeError::MissingEventType
        )
    }
}

// =============================================================================
// Events
// =============================================================================

/// A decoded inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Chunk of response audio, base64 text as received
    AudioDelta { delta: String },
    /// Chunk of the response audio transcript (may be empty)
    TranscriptDelta { delta: String },
    /// A response started
    ResponseCreated,
    /// A response finished
    ResponseDone,
    /// Transcription of the user's input audio finished
    InputTranscriptionCompleted { transcript: String },
}

/// Parser for one event kind.
pub type EventParser = fn(&Value) -> Result<Event, serde_json::Error>;

/// The recognized event kinds, one per wire tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    AudioDelta,
    TranscriptDelta,
    ResponseCreated,
    ResponseDone,
    InputTranscriptionCompleted,
}

impl EventKind {
    /// Every recognized kind.
    pub const ALL: [EventKind; 5] = [
        EventKind::AudioDelta,
        EventKind::TranscriptDelta,
        EventKind::ResponseCreated,
        EventKind::ResponseDone,
        EventKind::InputTranscriptionCompleted,
    ];

    /// The wire tag carried in the message's `type` field.
    #[inline]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::AudioDelta => "response.audio.delta",
            Self::TranscriptDelta => "response.audio_transcript.delta",
            Self::ResponseCreated => "response.created",
            Self::ResponseDone => "response.done",
            Self::InputTranscriptionCompleted => {
                "conversation.item.input_audio_transcription.completed"
            }
        }
    }

    /// The structural parser for this kind.
    pub fn parser(&self) -> EventParser {
        match self {
            Self::AudioDelta => parse_audio_delta,
            Self::TranscriptDelta => parse_transcript_delta,
            Self::ResponseCreated => parse_response_created,
            Self::ResponseDone => parse_response_done,
            Self::InputTranscriptionCompleted => parse_input_transcription_completed,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

#[derive(Deserialize)]
struct DeltaFields {
    delta: String,
}

#[derive(Deserialize)]
struct TranscriptFields {
    transcript: String,
}

#[derive(Deserialize)]
struct NoFields {}

fn parse_audio_delta(raw: &Value) -> Result<Event, serde_json::Error> {
    let fields = DeltaFields::deserialize(raw)?;
    Ok(Event::AudioDelta {
        delta: fields.delta,
    })
}

fn parse_transcript_delta(raw: &Value) -> Result<Event, serde_json::Error> {
    let fields = DeltaFields::deserialize(raw)?;
    Ok(Event::TranscriptDelta {
        delta: fields.delta,
    })
}

fn parse_response_created(raw: &Value) -> Result<Event, serde_json::Error> {
    NoFields::deserialize(raw)?;
    Ok(Event::ResponseCreated)
}

fn parse_response_done(raw: &Value) -> Result<Event, serde_json::Error> {
    NoFields::deserialize(raw)?;
    Ok(Event::ResponseDone)
}

fn parse_input_transcription_completed(raw: &Value) -> Result<Event, serde_json::Error> {
    let fields = TranscriptFields::deserialize(raw)?;
    Ok(Event::InputTranscriptionCompleted {
        transcript: fields.transcript,
    })
}

// =============================================================================
// Decoder
// =============================================================================

/// Table-driven event decoder.
///
/// The table is built once from an explicit list of kinds, so a decoder can
/// recognize a subset of the protocol (tags outside the subset decode as
/// [`DecodeError::UnknownEventType`]).
#[derive(Debug, Clone)]
pub struct EventDecoder {
    parsers: HashMap<&'static str, (EventKind, EventParser)>,
}

impl EventDecoder {
    /// Decoder recognizing every [`EventKind`].
    pub fn new() -> Self {
        Self::with_kinds(&EventKind::ALL)
    }

    /// Decoder recognizing only `kinds`.
    pub fn with_kinds(kinds: &[EventKind]) -> Self {
        let parsers = kinds
            .iter()
            .map(|kind| (kind.tag(), (*kind, kind.parser())))
            .collect();
        Self { parsers }
    }

    /// Whether `kind` is part of this decoder's table.
    pub fn recognizes(&self, kind: EventKind) -> bool {
        self.parsers.contains_key(kind.tag())
    }

    /// Decode an untyped message into an [`Event`].
    pub fn decode(&self, raw: &Value) -> Result<Event, DecodeError> {
        let object = raw.as_object().ok_or(DecodeError::NotAnObject)?;
        let tag = object
            .get("type")
            .and_then(Value::as_str)
            .ok_or(DecodeError::MissingEventType)?;

        let (kind, parser) = self
            .parsers
            .get(tag)
            .ok_or_else(|| DecodeError::UnknownEventType(tag.to_string()))?;

        parser(raw).map_err(|source| DecodeError::MalformedEvent {
            tag: kind.tag(),
            source,
        })
    }
}

impl Default for EventDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn test_decode_audio_delta() {
        let decoder = EventDecoder::new();
        let event = decoder
            .decode(&json!({"type": "response.audio.delta", "delta": "12345"}))
            .unwrap();
        assert_eq!(
            event,
            Event::AudioDelta {
                delta: "12345".to_string()
            }
        );
    }

    #[test]
    fn test_decode_ignores_extra_fields() {
        let decoder = EventDecoder::new();
        let raw = json!({
            "type": "response.audio_transcript.delta",
            "event_id": "event_123",
            "response_id": "resp_001",
            "item_id": "item_001",
            "output_index": 0,
            "content_index": 0,
            "delta": "Hello"
        });
        assert_eq!(
            decoder.decode(&raw).unwrap(),
            Event::TranscriptDelta {
                delta: "Hello".to_string()
            }
        );
    }

    #[test]
    fn test_decode_fieldless_events() {
        let decoder = EventDecoder::new();
        let created = json!({"type": "response.created", "response": {"id": "resp_001"}});
        let done = json!({"type": "response.done"});
        assert_eq!(decoder.decode(&created).unwrap(), Event::ResponseCreated);
        assert_eq!(decoder.decode(&done).unwrap(), Event::ResponseDone);
    }

    #[test]
    fn test_decode_input_transcription_completed() {
        let decoder = EventDecoder::new();
        let raw = json!({
            "type": "conversation.item.input_audio_transcription.completed",
            "item_id": "item_002",
            "content_index": 0,
            "transcript": "Bonjour\n"
        });
        assert_eq!(
            decoder.decode(&raw).unwrap(),
            Event::InputTranscriptionCompleted {
                transcript: "Bonjour\n".to_string()
            }
        );
    }

    #[test]
    fn test_decode_unknown_type() {
        let decoder = EventDecoder::new();
        let err = decoder.decode(&json!({"type": "unknown_event"})).unwrap_err();
        assert!(err.is_unknown());
        match err {
            DecodeError::UnknownEventType(tag) => assert_eq!(tag, "unknown_event"),
            other => panic!("Expected UnknownEventType, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_missing_or_non_string_type() {
        let decoder = EventDecoder::new();
        let missing = decoder.decode(&json!({"delta": "x"})).unwrap_err();
        let numeric = decoder.decode(&json!({"type": 5})).unwrap_err();
        assert!(matches!(missing, DecodeError::MissingEventType));
        assert!(matches!(numeric, DecodeError::MissingEventType));
        assert!(missing.is_unknown());
    }

    #[test]
    fn test_decode_not_an_object() {
        let decoder = EventDecoder::new();
        let err = decoder.decode(&json!(["response.done"])).unwrap_err();
        assert!(matches!(err, DecodeError::NotAnObject));
        assert!(!err.is_unknown());
    }

    #[test]
    fn test_decode_malformed_known_event() {
        let decoder = EventDecoder::new();

        let missing_delta = decoder
            .decode(&json!({"type": "response.audio.delta"}))
            .unwrap_err();
        match missing_delta {
            DecodeError::MalformedEvent { tag, .. } => assert_eq!(tag, "response.audio.delta"),
            other => panic!("Expected MalformedEvent, got {other:?}"),
        }

        // A number is not coerced into a string
        let wrong_type = decoder
            .decode(&json!({
                "type": "conversation.item.input_audio_transcription.completed",
                "transcript": 42
            }))
            .unwrap_err();
        assert!(matches!(wrong_type, DecodeError::MalformedEvent { .. }));
        assert!(!wrong_type.is_unknown());
    }

    #[test]
    fn test_decoder_subset() {
        let decoder = EventDecoder::with_kinds(&[EventKind::AudioDelta]);
        assert!(decoder.recognizes(EventKind::AudioDelta));
        assert!(!decoder.recognizes(EventKind::ResponseDone));

        assert!(
            decoder
                .decode(&json!({"type": "response.audio.delta", "delta": "AAAA"}))
                .is_ok()
        );
        let err = decoder.decode(&json!({"type": "response.done"})).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownEventType(_)));
    }

    #[test]
    fn test_tags_are_injective() {
        let tags: HashSet<&str> = EventKind::ALL.iter().map(EventKind::tag).collect();
        assert_eq!(tags.len(), EventKind::ALL.len());
    }

    #[test]
    fn test_event_kind_display() {
        assert_eq!(
            EventKind::TranscriptDelta.to_string(),
            "response.audio_transcript.delta"
        );
    }
}
