#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, Response},
};
use bytes::Bytes;
use serde_json::Value;

use voxcall::ServerConfig;
use voxcall::core::CoreState;
use voxcall::core::language::LanguageProfileTable;
use voxcall::core::llm::{ChatMessage, LLMResult, LanguageModel};
use voxcall::core::stt::RecognitionSettings;
use voxcall::core::tts::{SynthesizedAudio, TTSResult, TextToSpeech};
use voxcall::core::twiml::CallFlowDocumentBuilder;
use voxcall::{routes, state::AppState};

pub struct StubLlm;

#[async_trait]
impl LanguageModel for StubLlm {
    async fn complete(&self, messages: &[ChatMessage]) -> LLMResult<Option<String>> {
        Ok(messages
            .last()
            .map(|message| format!("You said: {}", message.content)))
    }

    fn provider_name(&self) -> &'static str {
        "stub"
    }
}

pub struct StubTts;

#[async_trait]
impl TextToSpeech for StubTts {
    async fn synthesize(&self, _text: &str, _voice_id: &str) -> TTSResult<SynthesizedAudio> {
        Ok(SynthesizedAudio {
            data: Bytes::from_static(&[0x7f; 160]),
            format: "ulaw_8000".to_string(),
        })
    }

    fn provider_name(&self) -> &'static str {
        "stub"
    }
}

pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 5001,
        voice_stream_url: "wss://agent.test/voice-stream".to_string(),
        consent_action_url: "/consent-response".to_string(),
        openai_api_key: "sk-test".to_string(),
        openai_model: "gpt-4o-mini".to_string(),
        elevenlabs_api_key: "el-test".to_string(),
        elevenlabs_model: "eleven_multilingual_v2".to_string(),
        deepgram_api_key: "dg-test".to_string(),
        provider_timeout_seconds: 10,
        primary_language: "es-LA".to_string(),
        fallback_language: "en-US".to_string(),
        voicemail_tick_ms: 250,
    }
}

/// Application state with stub providers; no network access.
pub fn test_state() -> Arc<AppState> {
    let config = test_config();
    let core = CoreState::with_providers(
        LanguageProfileTable::default(),
        CallFlowDocumentBuilder::new(&config.consent_action_url, &config.voice_stream_url),
        RecognitionSettings::deepgram(&config.deepgram_api_key),
        Arc::new(StubLlm),
        Arc::new(StubTts),
    );
    AppState::with_core(config, core)
}

pub fn app(state: Arc<AppState>) -> Router {
    routes::create_app(state)
}

pub fn form_post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn json_post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}
