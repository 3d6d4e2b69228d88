use axum::{Router, routing::post};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::handlers::testing;
use crate::state::AppState;

/// Synthetic call lifecycle and conversation event endpoints
pub fn create_testing_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/test-call", post(testing::start_test_call))
        .route("/end-test-call", post(testing::end_test_call))
        .route("/conversation/events", post(testing::conversation_event))
        .layer(TraceLayer::new_for_http())
}
