use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::core::calls::{CallPerformance, CallSession};
use crate::errors::{AppError, AppResult};
use crate::state::AppState;

/// Default number of entries returned by `/calls/recent`
const DEFAULT_RECENT_LIMIT: usize = 10;

#[derive(Debug, Default, Deserialize)]
pub struct CallQuery {
    pub call_sid: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

/// Health check handler
///
/// Reports active calls, provider availability and the agent-wide language
/// detection state.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    let core = &state.core_state;
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "active_calls": core.registry.active_call_count(),
        "services": core.service_status(),
        "language": core.language_state(),
    }))
}

/// Global registry snapshot, or one active call's performance view.
pub async fn performance(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallQuery>,
) -> AppResult<Response> {
    let registry = &state.core_state.registry;

    match query.call_sid {
        None => Ok(Json(registry.snapshot_global_metrics()).into_response()),
        Some(call_sid) => registry
            .get_call_info(&call_sid)
            .map(|session| Json(CallPerformance::from(&session)).into_response())
            .ok_or_else(|| AppError::NotFound(format!("Call {call_sid} is not active"))),
    }
}

/// Detection state, supported languages, and the active profile together
/// with the recognition stream it selects.
pub async fn language_info(State(state): State<Arc<AppState>>) -> AppResult<Json<Value>> {
    let core = &state.core_state;
    let detection = core.language_state();
    let current = core.profiles.resolve(&detection.current_language);
    let recognition = core.recognition.for_locale(&current.locale);
    let listen_url = recognition
        .websocket_url()
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    Ok(Json(json!({
        "language_manager": detection,
        "supported_languages": core.profiles.codes(),
        "current_config": current,
        "recognition": {
            "settings": recognition,
            "listen_url": listen_url,
        },
    })))
}

pub async fn active_calls(State(state): State<Arc<AppState>>) -> Json<Vec<CallSession>> {
    Json(state.core_state.registry.active_calls())
}

pub async fn recent_calls(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RecentQuery>,
) -> Json<Vec<CallSession>> {
    let limit = query.limit.unwrap_or(DEFAULT_RECENT_LIMIT);
    Json(state.core_state.registry.recent_history(limit))
}

/// Latency SLA and edge-case summaries.
pub async fn monitor_summary(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallQuery>,
) -> AppResult<Response> {
    let monitor = &state.core_state.monitor;

    match query.call_sid {
        None => Ok(Json(monitor.global_summary()).into_response()),
        Some(call_sid) => monitor
            .call_summary(&call_sid)
            .map(|summary| Json(summary).into_response())
            .ok_or_else(|| AppError::NotFound(format!("No monitoring data for {call_sid}"))),
    }
}
