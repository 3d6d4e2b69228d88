use axum::{Router, routing::post};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::handlers::twilio;
use crate::state::AppState;

/// Create the router for carrier webhooks
///
/// These endpoints are called by the telephony provider with form-encoded
/// bodies and answer with voice-control XML.
pub fn create_webhook_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/webhook", post(twilio::incoming_call))
        .route("/consent-response", post(twilio::consent_response))
        .route("/voice-stream", post(twilio::voice_stream))
        .layer(TraceLayer::new_for_http())
}
