//! Per-call conversation state machine.
//!
//! The machine is a pure function over a closed event set. It decides what
//! should happen and returns the decisions as [`Effect`]s; executing them
//! (provider calls, metrics, ending the call) is the processor's job.
//!
//! # State Transitions
//!
//! ```text
//! [Idle] ─── SpeechStarted ──► [UserSpeaking] ─── SpeechStopped ──► [UserSilent(t0)]
//!                                    ▲                                    │
//!                                    └──────── SpeechStarted ─────────────┤
//!                                                                         │
//!                       any event, now - t0 > 3.0s, !ai_speaking ─────────┴──► [VoicemailDetected]
//! ```
//!
//! `ai_speaking` is orthogonal to the phase: it is raised after a response
//! has been synthesized and cleared by the next `SpeechStarted`, which counts
//! as an interruption when it was raised. `VoicemailDetected` is terminal.

use std::time::{Duration, Instant};

use serde::Serialize;

/// Silence after the caller stops speaking that is treated as voicemail.
pub const VOICEMAIL_SILENCE_THRESHOLD: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    UserSpeaking,
    UserSilent { since: Instant },
    VoicemailDetected,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::UserSpeaking => "user_speaking",
            Phase::UserSilent { .. } => "user_silent",
            Phase::VoicemailDetected => "voicemail_detected",
        }
    }
}

impl Serialize for Phase {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConversationEvent {
    SpeechStarted,
    SpeechStopped,
    TranscriptionAvailable {
        text: String,
        /// Upstream recognition latency in seconds, when known
        stt_latency: Option<f64>,
    },
    Tick,
}

/// Work requested by a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// The caller talked over synthesized speech
    RecordInterruption,
    /// A new utterance is ready for the response round trip
    ProcessUtterance {
        text: String,
        stt_latency: Option<f64>,
    },
    /// Prolonged silence; the call should be ended
    EndCallVoicemail,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversationState {
    pub phase: Phase,
    pub ai_speaking: bool,
    last_user_input: Option<String>,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            ai_speaking: false,
            last_user_input: None,
        }
    }
}

impl ConversationState {
    pub fn is_terminated(&self) -> bool {
        self.phase == Phase::VoicemailDetected
    }

    /// A response finished synthesizing: the agent is now talking and any
    /// pending silence timer is void.
    pub fn mark_ai_speaking(&mut self) {
        if self.is_terminated() {
            return;
        }
        self.ai_speaking = true;
        if matches!(self.phase, Phase::UserSilent { .. }) {
            self.phase = Phase::Idle;
        }
    }
}

/// Advance the machine by one event observed at `now`.
pub fn transition(
    mut state: ConversationState,
    event: ConversationEvent,
    now: Instant,
) -> (ConversationState, Vec<Effect>) {
    if state.is_terminated() {
        return (state, Vec::new());
    }

    let mut effects = Vec::new();

    match event {
        ConversationEvent::SpeechStarted => {
            if state.ai_speaking {
                effects.push(Effect::RecordInterruption);
            }
            state.ai_speaking = false;
            state.phase = Phase::UserSpeaking;
        }
        ConversationEvent::SpeechStopped => {
            state.phase = Phase::UserSilent { since: now };
        }
        ConversationEvent::TranscriptionAvailable { text, stt_latency } => {
            let fresh = !text.trim().is_empty()
                && state.last_user_input.as_deref() != Some(text.as_str());
            if fresh {
                state.last_user_input = Some(text.clone());
                effects.push(Effect::ProcessUtterance { text, stt_latency });
            }
        }
        ConversationEvent::Tick => {}
    }

    // A turn about to be answered supersedes the silence check; a successful
    // response clears the timer through `mark_ai_speaking`.
    let answering = effects
        .iter()
        .any(|e| matches!(e, Effect::ProcessUtterance { .. }));

    if let Phase::UserSilent { since } = state.phase
        && !state.ai_speaking
        && !answering
        && now.saturating_duration_since(since) > VOICEMAIL_SILENCE_THRESHOLD
    {
        state.phase = Phase::VoicemailDetected;
        effects.push(Effect::EndCallVoicemail);
    }

    (state, effects)
}
