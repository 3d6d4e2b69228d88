use axum::{Router, routing::get};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::api;
use crate::state::AppState;
use std::sync::Arc;

/// JSON endpoints read by dashboards, with permissive CORS
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(api::health_check))
        .route("/performance", get(api::performance))
        .route("/language", get(api::language_info))
        .route("/calls/active", get(api::active_calls))
        .route("/calls/recent", get(api::recent_calls))
        .route("/monitor", get(api::monitor_summary))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
