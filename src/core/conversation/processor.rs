//! Per-call conversation processing.
//!
//! A [`ConversationSession`] feeds events through the state machine and
//! executes the resulting effects: language detection and switching,
//! transcript heuristics, metrics, and the LLM then TTS round trip.
//! Provider failures never escape a turn; they are logged and the call
//! carries on.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use super::analysis::{detect_audio_quality_issue, detect_slang};
use super::machine::{ConversationEvent, ConversationState, Effect, Phase, transition};
use crate::core::calls::{CallRegistry, LatencyKind};
use crate::core::language::{
    LanguageDetectionState, LanguageManager, LanguageProfile, LanguageProfileTable, SPANISH_LATAM,
};
use crate::core::llm::{ChatMessage, ChatRole, LLMError, LanguageModel};
use crate::core::metrics::{LATENCY_TARGET_SECONDS, PerformanceMonitor};
use crate::core::stt::RecognitionSettings;
use crate::core::tts::{TTSError, TextToSpeech};

#[derive(Debug, thiserror::Error)]
pub enum ConversationError {
    #[error("LLM request failed: {0}")]
    Llm(#[from] LLMError),
    #[error("TTS request failed: {0}")]
    Tts(#[from] TTSError),
}

/// Language-dependent provider settings for one call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoiceProfile {
    pub language: String,
    pub system_prompt: String,
    pub voice_id: String,
    pub recognition: RecognitionSettings,
}

impl VoiceProfile {
    pub fn from_profile(profile: &LanguageProfile, recognition: &RecognitionSettings) -> Self {
        Self {
            language: profile.code.clone(),
            system_prompt: profile.system_prompt.clone(),
            voice_id: profile.voice_id.clone(),
            recognition: recognition.for_locale(&profile.locale),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptTurn {
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub language: String,
}

/// Shared services a turn reports to and calls out to.
pub struct TurnServices<'a> {
    pub registry: &'a CallRegistry,
    pub monitor: &'a PerformanceMonitor,
    pub llm: &'a dyn LanguageModel,
    pub tts: &'a dyn TextToSpeech,
}

/// Result of feeding one event to a conversation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventOutcome {
    pub call_sid: String,
    pub state: Phase,
    pub ai_speaking: bool,
    pub terminated: bool,
    pub language: String,
}

pub struct ConversationSession {
    call_sid: String,
    state: ConversationState,
    language: LanguageManager,
    voice: VoiceProfile,
    recognition: RecognitionSettings,
    transcript: Vec<TranscriptTurn>,
}

impl ConversationSession {
    pub fn new(
        call_sid: impl Into<String>,
        profiles: Arc<LanguageProfileTable>,
        recognition: RecognitionSettings,
    ) -> Self {
        let language = LanguageManager::new(profiles);
        let voice = VoiceProfile::from_profile(language.current_config(), &recognition);
        Self {
            call_sid: call_sid.into(),
            state: ConversationState::default(),
            language,
            voice,
            recognition,
            transcript: Vec::new(),
        }
    }

    pub fn call_sid(&self) -> &str {
        &self.call_sid
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn voice(&self) -> &VoiceProfile {
        &self.voice
    }

    pub fn transcript(&self) -> &[TranscriptTurn] {
        &self.transcript
    }

    pub fn language_state(&self) -> &LanguageDetectionState {
        self.language.state()
    }

    pub fn outcome(&self) -> EventOutcome {
        EventOutcome {
            call_sid: self.call_sid.clone(),
            state: self.state.phase,
            ai_speaking: self.state.ai_speaking,
            terminated: self.state.is_terminated(),
            language: self.language.current_language().to_string(),
        }
    }

    pub async fn handle_event(
        &mut self,
        event: ConversationEvent,
        services: &TurnServices<'_>,
    ) -> EventOutcome {
        self.handle_event_at(event, Instant::now(), services).await
    }

    pub async fn handle_event_at(
        &mut self,
        event: ConversationEvent,
        now: Instant,
        services: &TurnServices<'_>,
    ) -> EventOutcome {
        let (state, effects) = transition(std::mem::take(&mut self.state), event, now);
        self.state = state;

        for effect in effects {
            match effect {
                Effect::RecordInterruption => {
                    info!("Call {}: caller interrupted synthesized speech", self.call_sid);
                    services.registry.record_interruption(&self.call_sid);
                    services.monitor.record_interruption(&self.call_sid);
                }
                Effect::ProcessUtterance { text, stt_latency } => {
                    self.process_utterance(&text, stt_latency, services).await;
                }
                Effect::EndCallVoicemail => {
                    info!("Call {}: voicemail detected, ending call", self.call_sid);
                }
            }
        }

        self.outcome()
    }

    async fn process_utterance(
        &mut self,
        text: &str,
        stt_latency: Option<f64>,
        services: &TurnServices<'_>,
    ) {
        let call_sid = self.call_sid.as_str();
        info!("Call {}: user said: {}", call_sid, text);

        services.registry.record_utterance(call_sid);
        if let Some(latency) = stt_latency {
            services.registry.record_metric(call_sid, LatencyKind::Stt, latency);
            services.monitor.record_stt_latency(call_sid, latency);
        }

        let detection = self.language.detect(text);
        if let Some(switch) = self
            .language
            .evaluate_switch(&detection.language, detection.confidence)
        {
            services
                .monitor
                .record_language_switch(call_sid, &switch.from, &switch.to);
            services.registry.update_language(call_sid, &switch.to);
            self.voice = VoiceProfile::from_profile(self.language.current_config(), &self.recognition);
            info!(
                "Call {}: voice {} / recognition {} now active",
                call_sid, self.voice.voice_id, self.voice.recognition.language
            );
        }

        if self.language.current_language() == SPANISH_LATAM
            && let Some(phrase) = detect_slang(text)
        {
            info!("Call {}: Mexican Spanish slang detected ({})", call_sid, phrase);
            services.monitor.record_slang_detection(call_sid, &phrase);
        }

        if let Some(issue) = detect_audio_quality_issue(text) {
            info!("Call {}: audio quality issue detected: {}", call_sid, issue);
            services.monitor.record_low_quality_handling(call_sid, issue.as_str());
        }

        self.push_turn(ChatRole::User, text);

        if let Err(e) = self.respond(services).await {
            error!("Call {}: error getting AI response: {}", self.call_sid, e);
        }
    }

    /// LLM completion followed by synthesis, with latency bookkeeping.
    ///
    /// The roundtrip covers only this turn's own work; upstream recognition
    /// time is recorded separately as the STT sample.
    async fn respond(&mut self, services: &TurnServices<'_>) -> Result<(), ConversationError> {
        let call_sid = self.call_sid.clone();
        let started = Instant::now();

        let llm_started = Instant::now();
        let reply = services.llm.complete(&self.chat_messages()).await?;
        let llm_latency = llm_started.elapsed().as_secs_f64();
        services.registry.record_metric(&call_sid, LatencyKind::Llm, llm_latency);
        services.monitor.record_llm_latency(&call_sid, llm_latency);

        let Some(reply) = reply else {
            warn!("Call {}: no response from LLM", call_sid);
            return Ok(());
        };
        info!(
            "Call {}: AI response ({}): {}",
            call_sid,
            self.language.current_language(),
            reply
        );
        self.push_turn(ChatRole::Assistant, &reply);

        let tts_started = Instant::now();
        services.tts.synthesize(&reply, &self.voice.voice_id).await?;
        let tts_latency = tts_started.elapsed().as_secs_f64();
        services.registry.record_metric(&call_sid, LatencyKind::Tts, tts_latency);
        services.monitor.record_tts_latency(&call_sid, tts_latency);

        self.state.mark_ai_speaking();

        let total = started.elapsed().as_secs_f64();
        services.registry.record_metric(&call_sid, LatencyKind::Total, total);
        services.monitor.record_roundtrip_latency(&call_sid, total);
        if total < LATENCY_TARGET_SECONDS {
            info!("Call {}: latency target met: {:.3}s", call_sid, total);
        }

        Ok(())
    }

    /// System prompt of the active language followed by the transcript.
    fn chat_messages(&self) -> Vec<ChatMessage> {
        std::iter::once(ChatMessage::new(
            ChatRole::System,
            self.voice.system_prompt.clone(),
        ))
        .chain(
            self.transcript
                .iter()
                .map(|turn| ChatMessage::new(turn.role, turn.content.clone())),
        )
        .collect()
    }

    fn push_turn(&mut self, role: ChatRole, content: &str) {
        self.transcript.push(TranscriptTurn {
            role,
            content: content.to_string(),
            timestamp: Utc::now(),
            language: self.language.current_language().to_string(),
        });
    }
}
