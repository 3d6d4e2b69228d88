//! Telephony webhooks
//!
//! The carrier posts form-encoded fields and expects a voice-control XML
//! document back. Failures answer `500` with a bare `Error` body; the
//! detail only goes to the log.

use std::sync::Arc;

use axum::{
    Form,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{error, info};

use crate::core::calls::CallDirection;
use crate::core::twiml::{VoiceDocument, is_consent};
use crate::state::AppState;

/// Reason recorded when the caller declines the recording consent
pub const CONSENT_DECLINED_REASON: &str = "consent_declined";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct IncomingCallForm {
    #[serde(rename = "CallSid")]
    pub call_sid: Option<String>,
    #[serde(rename = "From")]
    pub from: Option<String>,
    #[serde(rename = "To")]
    pub to: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConsentForm {
    #[serde(rename = "CallSid")]
    pub call_sid: Option<String>,
    #[serde(rename = "SpeechResult")]
    pub speech_result: Option<String>,
}

fn xml_response(document: VoiceDocument) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/xml")],
        document.to_xml(),
    )
        .into_response()
}

fn webhook_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Error").into_response()
}

/// Incoming call: register it and ask for recording consent.
pub async fn incoming_call(
    State(state): State<Arc<AppState>>,
    Form(form): Form<IncomingCallForm>,
) -> Response {
    let Some(call_sid) = form.call_sid.filter(|sid| !sid.trim().is_empty()) else {
        error!("Incoming call webhook without CallSid");
        return webhook_error();
    };
    let from = form.from.unwrap_or_default();
    let to = form.to.unwrap_or_default();

    info!("Incoming call {} from {} to {}", call_sid, from, to);

    let core = &state.core_state;
    core.begin_call(&call_sid, &from, CallDirection::Inbound);

    xml_response(core.documents.consent(core.profiles.primary_profile()))
}

/// Consent answer: greet and connect the media stream, or say goodbye.
pub async fn consent_response(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ConsentForm>,
) -> Response {
    let core = &state.core_state;
    let speech = form.speech_result.unwrap_or_default();
    let call_sid = form.call_sid.unwrap_or_default();

    let profile = core.profile_for_call(&call_sid).await;

    if is_consent(&speech) {
        info!("Call {}: consent given ({:?})", call_sid, speech);
        xml_response(core.documents.greeting(&profile))
    } else {
        info!("Call {}: consent declined ({:?})", call_sid, speech);
        core.finish_call(&call_sid, CONSENT_DECLINED_REASON);
        xml_response(core.documents.goodbye(&profile))
    }
}

/// Placeholder for the live media channel.
pub async fn voice_stream() -> impl IntoResponse {
    (StatusCode::OK, "Voice stream endpoint")
}
