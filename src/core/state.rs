use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::config::ServerConfig;
use crate::core::calls::{CallDirection, CallRegistry, CallSession};
use crate::core::conversation::{
    ConversationEvent, ConversationHub, ConversationSession, EventOutcome, SharedSession,
    TurnServices,
};
use crate::core::language::{
    LanguageDetectionState, LanguageError, LanguageManager, LanguageProfile, LanguageProfileTable,
};
use crate::core::llm::{LLMError, LanguageModel, OpenAIChat, OpenAIConfig};
use crate::core::metrics::PerformanceMonitor;
use crate::core::stt::RecognitionSettings;
use crate::core::tts::{ElevenLabsConfig, ElevenLabsTTS, TTSError, TextToSpeech};
use crate::core::twiml::CallFlowDocumentBuilder;
use crate::utils::req_manager::{ReqManager, ReqManagerConfig, ReqManagerError};

/// Reason recorded when the voicemail rule ends a call
pub const VOICEMAIL_END_REASON: &str = "voicemail";

#[derive(Debug, thiserror::Error)]
pub enum CoreStateError {
    #[error("Language configuration: {0}")]
    Language(#[from] LanguageError),
    #[error("HTTP client: {0}")]
    Http(#[from] ReqManagerError),
    #[error("LLM provider: {0}")]
    Llm(#[from] LLMError),
    #[error("TTS provider: {0}")]
    Tts(#[from] TTSError),
}

/// Whether each external provider is configured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServiceStatus {
    pub tts: bool,
    pub stt: bool,
    pub llm: bool,
}

/// Core-specific shared state for the application.
///
/// Created once at startup and handed to every handler through `AppState`.
/// Holds the call registry, the performance monitor, the provider clients and
/// the live conversations.
pub struct CoreState {
    pub profiles: Arc<LanguageProfileTable>,
    pub registry: Arc<CallRegistry>,
    pub monitor: Arc<PerformanceMonitor>,
    pub llm: Arc<dyn LanguageModel>,
    pub tts: Arc<dyn TextToSpeech>,
    pub recognition: RecognitionSettings,
    pub documents: CallFlowDocumentBuilder,
    pub conversations: ConversationHub,
    /// Detection state of the most recently processed utterance, any call
    language_state: RwLock<LanguageDetectionState>,
    /// Shared HTTP client behind the real provider clients
    req_manager: Option<Arc<ReqManager>>,
}

impl CoreState {
    /// Initialize core state with the OpenAI and ElevenLabs clients.
    pub fn new(config: &ServerConfig) -> Result<Arc<Self>, CoreStateError> {
        let profiles = LanguageProfileTable::new(&config.primary_language, &config.fallback_language)?;

        let req_manager = Arc::new(ReqManager::new(ReqManagerConfig::with_request_timeout(
            config.provider_timeout(),
        ))?);
        info!(
            "Initialized provider ReqManager with {} concurrent requests",
            req_manager.max_concurrent()
        );

        let llm = OpenAIChat::new(
            OpenAIConfig::new(&config.openai_api_key, &config.openai_model),
            Arc::clone(&req_manager),
        )?;
        let tts = ElevenLabsTTS::new(
            ElevenLabsConfig::new(&config.elevenlabs_api_key, &config.elevenlabs_model),
            Arc::clone(&req_manager),
        )?;

        let mut state = Self::assemble(
            profiles,
            CallFlowDocumentBuilder::new(&config.consent_action_url, &config.voice_stream_url),
            RecognitionSettings::deepgram(&config.deepgram_api_key),
            Arc::new(llm),
            Arc::new(tts),
        );
        state.req_manager = Some(req_manager);

        Ok(Arc::new(state))
    }

    /// Build core state around arbitrary provider implementations.
    pub fn with_providers(
        profiles: LanguageProfileTable,
        documents: CallFlowDocumentBuilder,
        recognition: RecognitionSettings,
        llm: Arc<dyn LanguageModel>,
        tts: Arc<dyn TextToSpeech>,
    ) -> Arc<Self> {
        Arc::new(Self::assemble(profiles, documents, recognition, llm, tts))
    }

    fn assemble(
        profiles: LanguageProfileTable,
        documents: CallFlowDocumentBuilder,
        recognition: RecognitionSettings,
        llm: Arc<dyn LanguageModel>,
        tts: Arc<dyn TextToSpeech>,
    ) -> Self {
        info!(
            "Conversation providers: llm={}, tts={}, stt={}",
            llm.provider_name(),
            tts.provider_name(),
            recognition.provider
        );
        let profiles = Arc::new(profiles);
        let language_state = LanguageManager::new(Arc::clone(&profiles)).state().clone();
        Self {
            registry: Arc::new(CallRegistry::new(profiles.primary_language())),
            monitor: Arc::new(PerformanceMonitor::new()),
            profiles,
            llm,
            tts,
            recognition,
            documents,
            conversations: ConversationHub::new(),
            language_state: RwLock::new(language_state),
            req_manager: None,
        }
    }

    pub fn services(&self) -> TurnServices<'_> {
        TurnServices {
            registry: &self.registry,
            monitor: &self.monitor,
            llm: self.llm.as_ref(),
            tts: self.tts.as_ref(),
        }
    }

    pub fn service_status(&self) -> ServiceStatus {
        ServiceStatus {
            tts: true,
            stt: !self.recognition.api_key.is_empty(),
            llm: true,
        }
    }

    pub fn language_state(&self) -> LanguageDetectionState {
        self.language_state.read().clone()
    }

    pub fn req_manager(&self) -> Option<&Arc<ReqManager>> {
        self.req_manager.as_ref()
    }

    /// Register a call everywhere it is tracked and open its conversation.
    pub fn begin_call(
        &self,
        call_sid: &str,
        phone_number: &str,
        direction: CallDirection,
    ) -> SharedSession {
        self.registry.start_call(call_sid, phone_number, direction);
        self.monitor.start_monitoring(call_sid);
        self.conversations.open(ConversationSession::new(
            call_sid,
            Arc::clone(&self.profiles),
            self.recognition.clone(),
        ))
    }

    /// End a call, freeze its monitoring and drop its conversation.
    ///
    /// Returns the archived session, or `None` if the call was not active.
    pub fn finish_call(&self, call_sid: &str, reason: &str) -> Option<CallSession> {
        let archived = self.registry.end_call(call_sid, reason);
        self.monitor.finish_monitoring(call_sid);
        self.conversations.close(call_sid);
        archived
    }

    /// Feed one event to a call's conversation.
    ///
    /// Returns `None` if the call has no open conversation. A voicemail
    /// outcome ends the call.
    pub async fn dispatch_event(
        &self,
        call_sid: &str,
        event: ConversationEvent,
    ) -> Option<EventOutcome> {
        let session = self.conversations.get(call_sid)?;
        let is_utterance = matches!(event, ConversationEvent::TranscriptionAvailable { .. });

        let outcome = {
            let mut guard = session.lock().await;
            let outcome = guard.handle_event(event, &self.services()).await;
            if is_utterance {
                *self.language_state.write() = guard.language_state().clone();
            }
            outcome
        };

        if outcome.terminated {
            self.finish_call(call_sid, VOICEMAIL_END_REASON);
        }
        Some(outcome)
    }

    /// Tick every idle conversation once; returns how many calls ended.
    ///
    /// Conversations busy with a turn are skipped until the next tick.
    pub async fn tick_conversations(&self) -> usize {
        self.tick_conversations_at(Instant::now()).await
    }

    pub(crate) async fn tick_conversations_at(&self, now: Instant) -> usize {
        let mut ended = Vec::new();

        for call_sid in self.conversations.call_ids() {
            let Some(session) = self.conversations.get(&call_sid) else {
                continue;
            };
            let Ok(mut guard) = session.try_lock() else {
                debug!("Call {}: busy, skipping voicemail tick", call_sid);
                continue;
            };
            let outcome = guard
                .handle_event_at(ConversationEvent::Tick, now, &self.services())
                .await;
            if outcome.terminated {
                ended.push(call_sid);
            }
        }

        for call_sid in &ended {
            self.finish_call(call_sid, VOICEMAIL_END_REASON);
        }
        ended.len()
    }

    /// Run [`CoreState::tick_conversations`] on a fixed interval until aborted.
    pub fn spawn_voicemail_ticker(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let state = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let ended = state.tick_conversations().await;
                if ended > 0 {
                    info!("Voicemail ticker ended {} call(s)", ended);
                }
            }
        })
    }

    /// Profile for documents sent on a call: the conversation's current
    /// language if one is open, the primary profile otherwise.
    pub async fn profile_for_call(&self, call_sid: &str) -> LanguageProfile {
        match self.conversations.get(call_sid) {
            Some(session) => {
                let language = session.lock().await.voice().language.clone();
                self.profiles.resolve(&language).clone()
            }
            None => self.profiles.primary_profile().clone(),
        }
    }
}
