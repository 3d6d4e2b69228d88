//! Speech synthesis providers.

mod elevenlabs;

use async_trait::async_trait;
use bytes::Bytes;

pub use elevenlabs::{ELEVENLABS_TTS_URL, ElevenLabsConfig, ElevenLabsTTS, VoiceSettings};

/// TTS-specific error types
#[derive(Debug, Clone, thiserror::Error)]
pub enum TTSError {
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Provider error ({status}): {body}")]
    ProviderError { status: u16, body: String },
    #[error("Audio generation failed: {0}")]
    AudioGenerationFailed(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

pub type TTSResult<T> = Result<T, TTSError>;

/// Synthesized speech ready to be streamed back to the carrier.
#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    pub data: Bytes,
    /// Provider output format, e.g. `ulaw_8000`
    pub format: String,
}

/// A text-to-speech backend.
///
/// The voice is chosen per request so a language switch takes effect on the
/// very next turn without touching shared provider state.
#[async_trait]
pub trait TextToSpeech: Send + Sync {
    async fn synthesize(&self, text: &str, voice_id: &str) -> TTSResult<SynthesizedAudio>;

    fn provider_name(&self) -> &'static str;
}
