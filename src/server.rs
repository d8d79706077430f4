//! Router assembly and shared handler state.

use std::sync::Arc;

use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::CorsLayer;

use crate::auth::IdentityVerifier;
use crate::onboarding::routes::onboarding_routes;
use crate::proposals::routes::proposal_routes;
use crate::store::Database;

/// Application state shared across handlers.
///
/// Constructed once at startup and passed by reference into every
/// handler — the process-wide component registry.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn Database>,
    pub verifier: Arc<dyn IdentityVerifier>,
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "fundbridge"
    }))
}

/// Build the full application router.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(onboarding_routes(state.clone()))
        .merge(proposal_routes(state))
        .layer(CorsLayer::permissive())
}
