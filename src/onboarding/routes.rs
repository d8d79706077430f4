//! REST endpoints for onboarding submission and profile reads.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tracing::info;

use super::model::{OnboardingPayload, Role};
use crate::error::ApiError;
use crate::server::AppState;

/// POST /api/onboarding
///
/// One endpoint serves both roles, branching on the `role` discriminant
/// supplied by the caller. The body is taken as raw JSON so the payload
/// can be stored verbatim alongside the typed fields.
async fn submit_onboarding(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(raw): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let user_id = state
        .verifier
        .verify(&headers)
        .await
        .ok_or(ApiError::Unauthorized)?;

    let role = raw
        .get("role")
        .and_then(Value::as_str)
        .and_then(Role::parse)
        .ok_or_else(|| {
            ApiError::InvalidInput(
                "User role ('student' or 'investor') is required in data payload.".to_string(),
            )
        })?;

    let payload: OnboardingPayload = serde_json::from_value(raw.clone())
        .map_err(|e| ApiError::InvalidInput(format!("Malformed onboarding payload: {e}")))?;

    let profile = state
        .db
        .submit_onboarding(&user_id, role, &payload, &raw)
        .await
        .map_err(|e| ApiError::internal("Failed to save onboarding data", e))?;

    info!(user_id = %profile.user_id, %role, "Onboarding data saved");

    // Confirmation carries the shared profile sections, never the
    // role-specific record.
    Ok(Json(json!({
        "success": true,
        "message": format!("Onboarding data saved successfully for {role}."),
        "data": {
            "userId": profile.user_id,
            "personalDetails": profile.personal_details,
            "education": profile.education,
            "skills": profile.skills,
            "career": profile.career,
        }
    })))
}

/// GET /api/onboarding/profile
///
/// Returns the caller's profile sections, or 404 if onboarding has never
/// been submitted for this identity.
async fn get_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let user_id = state
        .verifier
        .verify(&headers)
        .await
        .ok_or(ApiError::Unauthorized)?;

    let profile = state
        .db
        .get_profile(&user_id)
        .await
        .map_err(|e| ApiError::internal("Failed to load profile", e))?
        .ok_or(ApiError::NotFound { entity: "Profile" })?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "userId": profile.user_id,
            "personalDetails": profile.personal_details,
            "education": profile.education,
            "skills": profile.skills,
            "career": profile.career,
            "createdAt": profile.created_at,
            "updatedAt": profile.updated_at,
        }
    })))
}

/// Build the onboarding REST routes.
pub fn onboarding_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/onboarding", post(submit_onboarding))
        .route("/api/onboarding/profile", get(get_profile))
        .with_state(state)
}
