//! Synthetic call driver
//!
//! Lets integration tests and operators exercise the call lifecycle and the
//! conversation processor without a telephony carrier.

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use bytes::Bytes;
use chrono::Utc;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::core::calls::{CallDirection, LatencyKind};
use crate::core::conversation::{ConversationEvent, EventOutcome};
use crate::errors::{AppError, AppResult};
use crate::state::AppState;

pub const DEFAULT_TEST_PHONE: &str = "+1234567890";
pub const TEST_END_REASON: &str = "test_completed";
const NO_DATA: &str = "No data provided";

/// Latencies seeded into every synthetic call
const SEEDED_LATENCIES: [(LatencyKind, f64); 4] = [
    (LatencyKind::Stt, 0.15),
    (LatencyKind::Llm, 0.2),
    (LatencyKind::Tts, 0.1),
    (LatencyKind::Total, 0.45),
];

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TestCallRequest {
    pub phone_number: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EndTestCallRequest {
    pub call_sid: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    SpeechStarted,
    SpeechStopped,
    Transcription,
    Tick,
}

#[derive(Debug, Deserialize)]
pub struct ConversationEventRequest {
    pub call_sid: String,
    pub event: EventKind,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub stt_latency: Option<f64>,
}

impl ConversationEventRequest {
    fn into_event(self) -> Result<ConversationEvent, AppError> {
        Ok(match self.event {
            EventKind::SpeechStarted => ConversationEvent::SpeechStarted,
            EventKind::SpeechStopped => ConversationEvent::SpeechStopped,
            EventKind::Tick => ConversationEvent::Tick,
            EventKind::Transcription => ConversationEvent::TranscriptionAvailable {
                text: self.text.ok_or_else(|| {
                    AppError::BadRequest("transcription event without text".to_string())
                })?,
                stt_latency: self.stt_latency,
            },
        })
    }
}

/// Parse a JSON body, treating an empty body as absent.
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> AppResult<Option<T>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|e| AppError::BadRequest(format!("invalid JSON body: {e}")))
}

/// Start a synthetic call with seeded latency samples.
///
/// The body is required, but `{}` is enough to get the default number.
pub async fn start_test_call(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> AppResult<(StatusCode, Json<Value>)> {
    let request: TestCallRequest = parse_body(&body)?
        .ok_or_else(|| AppError::BadRequest(NO_DATA.to_string()))?;
    let phone_number = request
        .phone_number
        .unwrap_or_else(|| DEFAULT_TEST_PHONE.to_string());
    let call_sid = format!("test_{}", Utc::now().timestamp());

    let core = &state.core_state;
    core.begin_call(&call_sid, &phone_number, CallDirection::Test);

    for (kind, seconds) in SEEDED_LATENCIES {
        core.registry.record_metric(&call_sid, kind, seconds);
        match kind {
            LatencyKind::Stt => core.monitor.record_stt_latency(&call_sid, seconds),
            LatencyKind::Llm => core.monitor.record_llm_latency(&call_sid, seconds),
            LatencyKind::Tts => core.monitor.record_tts_latency(&call_sid, seconds),
            LatencyKind::Total => core.monitor.record_roundtrip_latency(&call_sid, seconds),
        }
    }
    core.registry
        .update_language(&call_sid, core.profiles.fallback_language());

    info!("Test call {} started for {}", call_sid, phone_number);

    Ok((
        StatusCode::OK,
        Json(json!({
            "status": "success",
            "call_sid": call_sid,
            "phone_number": phone_number,
            "message": "Test call started successfully",
        })),
    ))
}

/// End a synthetic call. Ending an unknown call is a no-op, like every
/// other registry mutation, and still answers success.
pub async fn end_test_call(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> AppResult<Json<Value>> {
    let request: EndTestCallRequest = parse_body(&body)?
        .ok_or_else(|| AppError::BadRequest(NO_DATA.to_string()))?;

    let archived = state
        .core_state
        .finish_call(&request.call_sid, TEST_END_REASON);
    match &archived {
        Some(_) => info!("Test call {} ended", request.call_sid),
        None => debug!("Test call {} was not active", request.call_sid),
    }

    let mut response = json!({
        "status": "success",
        "call_sid": request.call_sid,
        "message": "Test call ended successfully",
    });
    if let Some(duration) = archived.and_then(|session| session.duration) {
        response["duration"] = json!(duration);
    }

    Ok(Json(response))
}

/// Feed one speech/transcription/tick event to a call's conversation.
pub async fn conversation_event(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> AppResult<Json<EventOutcome>> {
    let request: ConversationEventRequest = parse_body(&body)?
        .ok_or_else(|| AppError::BadRequest("event body is required".to_string()))?;
    let call_sid = request.call_sid.clone();
    let event = request.into_event()?;

    state
        .core_state
        .dispatch_event(&call_sid, event)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No conversation for {call_sid}")))
}
