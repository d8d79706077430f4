//! REST endpoints for funding proposals.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;
use uuid::Uuid;

use super::model::{Proposal, ProposalStatus, ProposalSubmission};
use crate::error::ApiError;
use crate::server::AppState;

/// POST /api/proposals
///
/// Creates a proposal with status `submitted`, linked to the caller's
/// profile when one exists.
async fn submit_proposal(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(raw): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let user_id = state
        .verifier
        .verify(&headers)
        .await
        .ok_or(ApiError::Unauthorized)?;

    let submission: ProposalSubmission = serde_json::from_value(raw)
        .map_err(|e| ApiError::InvalidInput(format!("Malformed proposal: {e}")))?;

    let profile_id = state
        .db
        .get_profile(&user_id)
        .await
        .map_err(|e| ApiError::internal("Failed to save proposal", e))?
        .map(|p| p.id);

    let proposal = Proposal::from_submission(submission, profile_id);
    state
        .db
        .insert_proposal(&proposal)
        .await
        .map_err(|e| ApiError::internal("Failed to save proposal", e))?;

    info!(user_id, proposal_id = %proposal.id, "Proposal submitted");

    Ok(Json(json!({
        "success": true,
        "message": "Proposal submitted successfully.",
        "data": proposal,
    })))
}

/// GET /api/proposals
///
/// Lists the caller's proposals, most recent first. An identity with no
/// profile yet has no linked proposals and gets an empty list.
async fn list_proposals(
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
        .map_err(|e| ApiError::internal("Failed to load proposals", e))?;

    let proposals = match profile {
        Some(profile) => state
            .db
            .list_proposals_for_profile(profile.id)
            .await
            .map_err(|e| ApiError::internal("Failed to load proposals", e))?,
        None => Vec::new(),
    };

    Ok(Json(json!({"success": true, "data": proposals})))
}

/// Fetch a proposal the caller is allowed to act on.
///
/// A proposal linked to a profile is visible only to that profile's
/// owner; others get 404 rather than confirmation that the id exists.
/// Unlinked proposals (submitted before onboarding) stay open to any
/// authenticated caller.
async fn fetch_owned(state: &AppState, user_id: &str, id: Uuid) -> Result<Proposal, ApiError> {
    let proposal = state
        .db
        .get_proposal(id)
        .await
        .map_err(|e| ApiError::internal("Failed to load proposal", e))?
        .ok_or(ApiError::NotFound { entity: "Proposal" })?;

    if let Some(owner) = proposal.profile_id {
        let caller = state
            .db
            .get_profile(user_id)
            .await
            .map_err(|e| ApiError::internal("Failed to load proposal", e))?;
        if caller.map(|p| p.id) != Some(owner) {
            return Err(ApiError::NotFound { entity: "Proposal" });
        }
    }
    Ok(proposal)
}

/// GET /api/proposals/{id}
async fn get_proposal(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let user_id = state
        .verifier
        .verify(&headers)
        .await
        .ok_or(ApiError::Unauthorized)?;

    let proposal = fetch_owned(&state, &user_id, id).await?;

    Ok(Json(json!({"success": true, "data": proposal})))
}

#[derive(Debug, Deserialize)]
struct StatusChange {
    status: ProposalStatus,
}

/// POST /api/proposals/{id}/status
///
/// Applies one lifecycle transition. The store update is conditional on
/// the status observed here, so two concurrent reviewers cannot both
/// apply the same transition.
async fn change_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(raw): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let user_id = state
        .verifier
        .verify(&headers)
        .await
        .ok_or(ApiError::Unauthorized)?;

    let change: StatusChange = serde_json::from_value(raw)
        .map_err(|e| ApiError::InvalidInput(format!("Malformed status change: {e}")))?;

    let proposal = fetch_owned(&state, &user_id, id).await?;

    if !proposal.status.can_transition_to(change.status) {
        return Err(ApiError::InvalidInput(format!(
            "Cannot transition proposal from {} to {}.",
            proposal.status, change.status
        )));
    }

    let applied = state
        .db
        .update_proposal_status(id, proposal.status, change.status)
        .await
        .map_err(|e| ApiError::internal("Failed to update proposal", e))?;

    if !applied {
        return Err(ApiError::InvalidInput(format!(
            "Proposal is no longer in status {}.",
            proposal.status
        )));
    }

    info!(proposal_id = %id, from = %proposal.status, to = %change.status, "Proposal status changed");

    Ok(Json(json!({
        "success": true,
        "message": format!("Proposal moved to {}.", change.status),
        "data": {"id": id, "status": change.status},
    })))
}

/// Build the proposal REST routes.
pub fn proposal_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/proposals", post(submit_proposal).get(list_proposals))
        .route("/api/proposals/{id}", get(get_proposal))
        .route("/api/proposals/{id}/status", post(change_status))
        .with_state(state)
}
