//! Admin moderation: event approval and organizer account review.

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::policy::Operation;
use crate::auth::AuthUser;
use crate::models::event::Event;
use crate::models::user::{OrganizerStatus, User};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

pub async fn pending_events(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Response, AppError> {
    user.require(Operation::Moderate)?;

    let events = sqlx::query_as::<_, Event>(
        "SELECT * FROM events
         WHERE NOT is_approved AND status <> 'cancelled'
         ORDER BY created_at ASC",
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(success(events, "Pending events fetched").into_response())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveEventRequest {
    pub approved: bool,
}

pub async fn approve_event(
    State(state): State<AppState>,
    user: AuthUser,
    Path(event_id): Path<Uuid>,
    Json(body): Json<ApproveEventRequest>,
) -> Result<Response, AppError> {
    user.require(Operation::Moderate)?;

    let event = sqlx::query_as::<_, Event>(
        "UPDATE events SET is_approved = $2, updated_at = now()
         WHERE id = $1
         RETURNING *",
    )
    .bind(event_id)
    .bind(body.approved)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

    let message = if body.approved {
        "Event approved"
    } else {
        "Event approval revoked"
    };
    Ok(success(event, message).into_response())
}

pub async fn list_organizers(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Response, AppError> {
    user.require(Operation::Moderate)?;

    let organizers = sqlx::query_as::<_, User>(
        "SELECT * FROM users
         WHERE role = 'organizer'
         ORDER BY organizer_status, created_at ASC",
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(success(organizers, "Organizers fetched").into_response())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizerReviewRequest {
    pub status: OrganizerStatus,
}

pub async fn review_organizer(
    State(state): State<AppState>,
    user: AuthUser,
    Path(user_id): Path<Uuid>,
    Json(body): Json<OrganizerReviewRequest>,
) -> Result<Response, AppError> {
    user.require(Operation::Moderate)?;

    let organizer = sqlx::query_as::<_, User>(
        "UPDATE users SET organizer_status = $2, updated_at = now()
         WHERE id = $1 AND role = 'organizer'
         RETURNING *",
    )
    .bind(user_id)
    .bind(body.status)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Organizer not found".to_string()))?;

    Ok(success(organizer, "Organizer status updated").into_response())
}
