//! Profile endpoints. The password hash never leaves the database: the
//! [`User`] model simply has no field for it.

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::models::organization::OrganizationSummary;
use crate::models::user::User;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

const USER_COLUMNS: &str = "id, email, first_name, last_name, role, organizer_status,
    student_id, phone_number, profile_picture, organization_id, created_at, updated_at";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    #[serde(flatten)]
    pub user: User,
    pub organization: Option<OrganizationSummary>,
}

pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Response, AppError> {
    let profile = fetch_profile(&state, user.id).await?;
    Ok(success(profile, "Profile fetched").into_response())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub profile_picture: Option<String>,
}

pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Response, AppError> {
    if matches!(&body.first_name, Some(n) if n.trim().is_empty())
        || matches!(&body.last_name, Some(n) if n.trim().is_empty())
    {
        return Err(AppError::ValidationError(
            "Name fields cannot be empty".to_string(),
        ));
    }

    let profile = sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET
            first_name = COALESCE($2, first_name),
            last_name = COALESCE($3, last_name),
            phone_number = COALESCE($4, phone_number),
            profile_picture = COALESCE($5, profile_picture),
            updated_at = now()
         WHERE id = $1
         RETURNING {USER_COLUMNS}",
    ))
    .bind(user.id)
    .bind(&body.first_name)
    .bind(&body.last_name)
    .bind(&body.phone_number)
    .bind(&body.profile_picture)
    .fetch_one(&state.pool)
    .await?;

    let organization = fetch_organization(&state, profile.organization_id).await?;
    let view = ProfileView {
        user: profile,
        organization,
    };
    Ok(success(view, "Profile updated").into_response())
}

pub async fn get_user(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let profile = fetch_profile(&state, user_id).await?;
    Ok(success(profile, "User fetched").into_response())
}

async fn fetch_profile(state: &AppState, user_id: Uuid) -> Result<ProfileView, AppError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1",
    ))
    .bind(user_id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let organization = fetch_organization(state, user.organization_id).await?;
    Ok(ProfileView { user, organization })
}

async fn fetch_organization(
    state: &AppState,
    organization_id: Option<Uuid>,
) -> Result<Option<OrganizationSummary>, AppError> {
    let Some(organization_id) = organization_id else {
        return Ok(None);
    };

    let organization = sqlx::query_as::<_, OrganizationSummary>(
        "SELECT id, name, logo_url FROM organizations WHERE id = $1",
    )
    .bind(organization_id)
    .fetch_optional(&state.pool)
    .await?;

    Ok(organization)
}
