//! Per-call conversation handling: the event state machine, the turn
//! processor that drives the provider round trip, and the registry of live
//! conversations.

pub mod analysis;
mod hub;
pub mod machine;
mod processor;

pub use analysis::{AudioQualityIssue, detect_audio_quality_issue, detect_slang};
pub use hub::{ConversationHub, SharedSession};
pub use machine::{
    ConversationEvent, ConversationState, Effect, Phase, VOICEMAIL_SILENCE_THRESHOLD, transition,
};
pub use processor::{
    ConversationError, ConversationSession, EventOutcome, TranscriptTurn, TurnServices,
    VoiceProfile,
};
