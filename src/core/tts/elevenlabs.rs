use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::{SynthesizedAudio, TTSError, TTSResult, TextToSpeech};
use crate::utils::req_manager::ReqManager;

pub const ELEVENLABS_TTS_URL: &str = "https://api.elevenlabs.io/v1/text-to-speech";

/// Voice settings for ElevenLabs TTS
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceSettings {
    /// Voice stability (0.0 to 1.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stability: Option<f64>,
    /// Similarity boost (0.0 to 1.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity_boost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_speaker_boost: Option<bool>,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: Some(0.5),
            similarity_boost: Some(0.8),
            style: Some(0.0),
            use_speaker_boost: Some(false),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ElevenLabsConfig {
    pub api_key: String,
    pub model: String,
    /// Carrier media streams carry 8 kHz mu-law
    pub output_format: String,
    pub voice_settings: VoiceSettings,
}

impl ElevenLabsConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            output_format: "ulaw_8000".to_string(),
            voice_settings: VoiceSettings::default(),
        }
    }
}

/// Accept header matching an ElevenLabs output format.
fn accept_header(output_format: &str) -> &'static str {
    if output_format.starts_with("mp3") {
        "audio/mpeg"
    } else if output_format.starts_with("ulaw") {
        "audio/basic"
    } else {
        "audio/pcm"
    }
}

/// ElevenLabs TTS over the HTTP REST API
pub struct ElevenLabsTTS {
    config: ElevenLabsConfig,
    req_manager: Arc<ReqManager>,
}

impl ElevenLabsTTS {
    pub fn new(config: ElevenLabsConfig, req_manager: Arc<ReqManager>) -> TTSResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(TTSError::InvalidConfiguration(
                "API key is required for ElevenLabs".to_string(),
            ));
        }
        Ok(Self {
            config,
            req_manager,
        })
    }

    fn build_http_request(
        &self,
        client: &reqwest::Client,
        text: &str,
        voice_id: &str,
    ) -> reqwest::RequestBuilder {
        let url = format!(
            "{ELEVENLABS_TTS_URL}/{voice_id}?output_format={}",
            self.config.output_format
        );

        let mut body = json!({
            "text": text,
            "voice_settings": self.config.voice_settings,
        });
        if !self.config.model.is_empty() {
            body["model_id"] = json!(self.config.model);
        }

        client
            .post(url)
            .header("xi-api-key", &self.config.api_key)
            .header("Content-Type", "application/json")
            .header("Accept", accept_header(&self.config.output_format))
            .json(&body)
    }
}

#[async_trait]
impl TextToSpeech for ElevenLabsTTS {
    async fn synthesize(&self, text: &str, voice_id: &str) -> TTSResult<SynthesizedAudio> {
        let guard = self
            .req_manager
            .acquire()
            .await
            .map_err(|e| TTSError::NetworkError(e.to_string()))?;

        let request = self.build_http_request(guard.client(), text, voice_id);
        let response = guard
            .send(request)
            .await
            .map_err(|e| TTSError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TTSError::ProviderError {
                status: status.as_u16(),
                body,
            });
        }

        let data = response
            .bytes()
            .await
            .map_err(|e| TTSError::AudioGenerationFailed(e.to_string()))?;
        if data.is_empty() {
            return Err(TTSError::AudioGenerationFailed(
                "Provider returned no audio".to_string(),
            ));
        }

        debug!("ElevenLabs synthesized {} bytes with voice {}", data.len(), voice_id);
        Ok(SynthesizedAudio {
            data,
            format: self.config.output_format.clone(),
        })
    }

    fn provider_name(&self) -> &'static str {
        "elevenlabs"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::req_manager::ReqManagerConfig;

    fn req_manager() -> Arc<ReqManager> {
        Arc::new(ReqManager::new(ReqManagerConfig::default()).unwrap())
    }

    #[test]
    fn test_elevenlabs_tts_invalid_config() {
        let result = ElevenLabsTTS::new(
            ElevenLabsConfig::new("", "eleven_multilingual_v2"),
            req_manager(),
        );
        assert!(matches!(result, Err(TTSError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_http_request_building() {
        let tts = ElevenLabsTTS::new(
            ElevenLabsConfig::new("test_key", "eleven_multilingual_v2"),
            req_manager(),
        )
        .unwrap();
        let request = tts
            .build_http_request(&reqwest::Client::new(), "Hola", "voice_es")
            .build()
            .unwrap();

        let url = request.url().to_string();
        assert!(url.starts_with("https://api.elevenlabs.io/v1/text-to-speech/voice_es"));
        assert!(url.contains("output_format=ulaw_8000"));

        let headers = request.headers();
        assert_eq!(headers.get("xi-api-key").unwrap(), "test_key");
        assert_eq!(headers.get("accept").unwrap(), "audio/basic");

        let body: serde_json::Value =
            serde_json::from_slice(request.body().unwrap().as_bytes().unwrap()).unwrap();
        assert_eq!(body["text"], "Hola");
        assert_eq!(body["model_id"], "eleven_multilingual_v2");
        assert_eq!(body["voice_settings"]["similarity_boost"], 0.8);
        assert_eq!(body["voice_settings"]["stability"], 0.5);
    }

    #[test]
    fn test_voice_changes_per_request() {
        let tts = ElevenLabsTTS::new(ElevenLabsConfig::new("k", ""), req_manager()).unwrap();
        let client = reqwest::Client::new();
        let first = tts.build_http_request(&client, "a", "voice_a").build().unwrap();
        let second = tts.build_http_request(&client, "b", "voice_b").build().unwrap();
        assert!(first.url().path().ends_with("/voice_a"));
        assert!(second.url().path().ends_with("/voice_b"));

        let body: serde_json::Value =
            serde_json::from_slice(first.body().unwrap().as_bytes().unwrap()).unwrap();
        assert!(body.get("model_id").is_none());
    }

    #[test]
    fn test_accept_header_mapping() {
        assert_eq!(accept_header("mp3_44100_128"), "audio/mpeg");
        assert_eq!(accept_header("pcm_16000"), "audio/pcm");
        assert_eq!(accept_header("ulaw_8000"), "audio/basic");
    }
}
