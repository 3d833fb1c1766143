pub mod policy;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::user::{OrganizerStatus, Role};
use crate::state::AppState;
use crate::utils::error::AppError;

const TOKEN_TTL_HOURS: i64 = 24;

/// JWT signing material, shared through [`AppState`].
#[derive(Clone)]
pub struct AuthKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl AuthKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issues a token for a user id. Registration/login live in a separate
    /// service; this is kept for operational tooling and tests.
    pub fn issue(&self, user_id: Uuid) -> Result<String, AppError> {
        let claims = Claims {
            sub: user_id,
            exp: (Utc::now() + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {e}")))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| AppError::AuthError("Token is not valid".to_string()))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub exp: i64,
}

/// The authenticated caller, loaded fresh from the database so role and
/// approval changes take effect on the next request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
    pub organizer_status: OrganizerStatus,
    pub organization_id: Option<Uuid>,
}

impl AuthUser {
    /// Capability check: one call per operation instead of per-route
    /// middleware stacks. See [`policy::can_perform`].
    pub fn require(&self, operation: policy::Operation) -> Result<(), AppError> {
        if policy::can_perform(self, operation) {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Access denied. Insufficient permissions.".to_string(),
            ))
        }
    }

    async fn load(pool: &PgPool, user_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, (Uuid, Role, OrganizerStatus, Option<Uuid>)>(
            "SELECT id, role, organizer_status, organization_id FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map(|row| {
            row.map(|(id, role, organizer_status, organization_id)| AuthUser {
                id,
                role,
                organizer_status,
                organization_id,
            })
        })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = state.auth.verify(&token)?;

        AuthUser::load(&state.pool, claims.sub)
            .await?
            .ok_or_else(|| AppError::AuthError("Token is not valid".to_string()))
    }
}

fn bearer_token(parts: &Parts) -> Result<String, AppError> {
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::AuthError("No token, authorization denied".to_string()))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::AuthError("Expected 'Bearer <token>'".to_string()))?;

    if token.is_empty() {
        return Err(AppError::AuthError("Empty bearer token".to_string()));
    }

    Ok(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify_round_trip() {
        let keys = AuthKeys::new("test-secret");
        let user_id = Uuid::new_v4();

        let token = keys.issue(user_id).unwrap();
        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.sub, user_id);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let keys = AuthKeys::new("test-secret");
        let other = AuthKeys::new("other-secret");

        let token = keys.issue(Uuid::new_v4()).unwrap();
        assert!(other.verify(&token).is_err());
    }
}
