//! Router construction
//!
//! [`create_app`] merges every router and attaches the shared state.

pub mod api;
pub mod testing;
pub mod webhooks;

use axum::Router;
use std::sync::Arc;

use crate::state::AppState;

pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(webhooks::create_webhook_router())
        .merge(api::create_api_router())
        .merge(testing::create_testing_router())
        .with_state(state)
}
