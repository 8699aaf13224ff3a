pub mod audio;
pub mod realtime;

// Re-export commonly used types for convenience
pub use audio::{AudioError, AudioResult, encode_pcm16_base64};

pub use realtime::{
    DecodeError, Event, EventDecoder, EventKind, OutputSink, Phase, PumpExit, ReconcileError,
    Reconciler, RealtimeError, RealtimeResult, ReorderingPolicy, SinkCall, SinkError, SinkResult,
    pump_upstream,
};
