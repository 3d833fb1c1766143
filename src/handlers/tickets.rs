//! Ticket lifecycle: claim, validate, redeem, return.
//!
//! Every status transition and the capacity check are single conditional
//! SQL statements, so two concurrent claims of the last seat or two
//! organizers scanning the same badge cannot both succeed. A missed
//! conditional update is classified afterwards through
//! [`TicketStatus::redeem`] / [`TicketStatus::cancel`] so the "only active
//! tickets transition" rule lives in one place.

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::auth::policy::Operation;
use crate::auth::AuthUser;
use crate::models::event::Event;
use crate::models::ticket::{ReturnReason, Ticket, TicketStatus, TransitionError};
use crate::models::user::Role;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::qr::{self, QrPayload};
use crate::utils::response::{created, empty_success, success};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRequest {
    pub event_id: Uuid,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    pub id: Uuid,
    pub title: String,
    pub date: DateTime<Utc>,
    pub start_time: String,
    pub end_time: String,
    pub location: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketView {
    #[serde(flatten)]
    pub ticket: Ticket,
    pub event: EventSummary,
    pub qr_code_image: String,
}

pub async fn claim_ticket(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<ClaimRequest>,
) -> Result<Response, AppError> {
    user.require(Operation::ClaimTicket)?;

    // Fast-path duplicate check; the race window it leaves is closed by the
    // partial unique index on (event_id, user_id).
    let existing = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM tickets
         WHERE event_id = $1 AND user_id = $2 AND status IN ('active', 'used')",
    )
    .bind(body.event_id)
    .bind(user.id)
    .fetch_one(&state.pool)
    .await?;

    if existing > 0 {
        return Err(AppError::conflict(
            "You already have a ticket for this event",
        ));
    }

    let mut tx = state.pool.begin().await?;

    // Atomic increment-with-ceiling: claims past capacity, on unpublished,
    // unapproved or past events all miss this update.
    let event = sqlx::query_as::<_, Event>(
        "UPDATE events
         SET registrations = registrations + 1, updated_at = now()
         WHERE id = $1
           AND status = 'published'
           AND is_approved
           AND date >= now()
           AND registrations < capacity
         RETURNING *",
    )
    .bind(body.event_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(event) = event else {
        tx.rollback().await?;
        return Err(classify_unclaimable(&state, body.event_id).await?);
    };

    let ticket_id = Uuid::new_v4().to_string();
    let qr_code = QrPayload::new(&ticket_id, event.id, user.id).encode()?;
    let price = event.ticket_price_for_claim();

    let ticket = sqlx::query_as::<_, Ticket>(
        "INSERT INTO tickets (ticket_id, event_id, user_id, qr_code, price)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING *",
    )
    .bind(&ticket_id)
    .bind(event.id)
    .bind(user.id)
    .bind(&qr_code)
    .bind(price)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::conflict("You already have a ticket for this event")
        }
        _ => AppError::from(e),
    })?;

    tx.commit().await?;

    let qr_code_image = qr::render_data_url(&ticket.qr_code)?;
    let view = TicketView {
        ticket,
        event: EventSummary {
            id: event.id,
            title: event.title,
            date: event.date,
            start_time: event.start_time,
            end_time: event.end_time,
            location: event.location,
        },
        qr_code_image,
    };

    Ok(created(view, "Ticket claimed").into_response())
}

/// Explains why the conditional claim update matched nothing.
async fn classify_unclaimable(state: &AppState, event_id: Uuid) -> Result<AppError, AppError> {
    let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
        .bind(event_id)
        .fetch_optional(&state.pool)
        .await?;

    let Some(event) = event else {
        return Ok(AppError::NotFound("Event not found".to_string()));
    };

    let now = Utc::now();
    if event.date < now {
        return Ok(AppError::InvalidState("Event already passed".to_string()));
    }
    if !event.is_claimable(now) {
        return Ok(AppError::InvalidState(
            "Event is not available for claiming".to_string(),
        ));
    }

    Ok(AppError::conflict("Event is sold out"))
}

/// Ticket row flattened with the columns of its event the clients render.
#[derive(FromRow)]
struct TicketWithEventRow {
    #[sqlx(flatten)]
    ticket: Ticket,
    event_title: String,
    event_date: DateTime<Utc>,
    event_start_time: String,
    event_end_time: String,
    event_location: String,
}

impl TicketWithEventRow {
    fn into_view(self) -> Result<TicketView, AppError> {
        let qr_code_image = qr::render_data_url(&self.ticket.qr_code)?;
        Ok(TicketView {
            event: EventSummary {
                id: self.ticket.event_id,
                title: self.event_title,
                date: self.event_date,
                start_time: self.event_start_time,
                end_time: self.event_end_time,
                location: self.event_location,
            },
            ticket: self.ticket,
            qr_code_image,
        })
    }
}

const TICKET_WITH_EVENT_COLUMNS: &str = "t.*,
    e.title AS event_title,
    e.date AS event_date,
    e.start_time AS event_start_time,
    e.end_time AS event_end_time,
    e.location AS event_location";

pub async fn my_tickets(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Response, AppError> {
    user.require(Operation::ViewOwnTickets)?;

    let rows = sqlx::query_as::<_, TicketWithEventRow>(&format!(
        "SELECT {TICKET_WITH_EVENT_COLUMNS}
         FROM tickets t
         JOIN events e ON e.id = t.event_id
         WHERE t.user_id = $1
         ORDER BY t.created_at DESC",
    ))
    .bind(user.id)
    .fetch_all(&state.pool)
    .await?;

    let tickets: Vec<TicketView> = rows
        .into_iter()
        .map(TicketWithEventRow::into_view)
        .collect::<Result<_, _>>()?;

    Ok(success(tickets, "Tickets fetched").into_response())
}

pub async fn ticket_details(
    State(state): State<AppState>,
    user: AuthUser,
    Path(ticket_id): Path<String>,
) -> Result<Response, AppError> {
    let row = sqlx::query_as::<_, TicketWithEventRow>(&format!(
        "SELECT {TICKET_WITH_EVENT_COLUMNS}
         FROM tickets t
         JOIN events e ON e.id = t.event_id
         WHERE t.ticket_id = $1",
    ))
    .bind(&ticket_id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Ticket not found".to_string()))?;

    // Owner, or an organizer from the event's organization.
    let event_org = event_organization(&state, row.ticket.event_id).await?;
    let is_owner = user.role == Role::Student && row.ticket.user_id == user.id;
    let is_event_organizer =
        user.role == Role::Organizer && user.organization_id == Some(event_org);

    if !is_owner && !is_event_organizer {
        return Err(AppError::Forbidden("Access denied".to_string()));
    }

    Ok(success(row.into_view()?, "Ticket fetched").into_response())
}

async fn event_organization(state: &AppState, event_id: Uuid) -> Result<Uuid, AppError> {
    sqlx::query_scalar::<_, Uuid>("SELECT organization_id FROM events WHERE id = $1")
        .bind(event_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    pub qr_data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    pub valid: bool,
    pub ticket: ValidatedTicket,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedTicket {
    pub ticket_id: String,
    pub status: TicketStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_at: Option<DateTime<Utc>>,
}

/// Reports a scanned ticket's status without mutating anything, so
/// repeated scans of the same payload always answer the same.
pub async fn validate_ticket(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<ValidateRequest>,
) -> Result<Response, AppError> {
    user.require(Operation::ValidateTicket)?;

    // Reject garbage before touching the database. Lookup is still by the
    // exact stored string, not the parsed fields.
    QrPayload::parse(&body.qr_data)?;

    let row = sqlx::query_as::<_, (String, TicketStatus, Option<DateTime<Utc>>, Uuid)>(
        "SELECT t.ticket_id, t.status, t.used_at, e.organization_id
         FROM tickets t
         JOIN events e ON e.id = t.event_id
         WHERE t.qr_code = $1",
    )
    .bind(&body.qr_data)
    .fetch_optional(&state.pool)
    .await?;

    let Some((ticket_id, status, used_at, organization_id)) = row else {
        return Err(AppError::NotFound("Ticket not found".to_string()));
    };

    if user.organization_id != Some(organization_id) {
        return Err(AppError::Forbidden(
            "Ticket does not belong to your organization".to_string(),
        ));
    }

    let response = ValidateResponse {
        valid: status == TicketStatus::Active,
        ticket: ValidatedTicket {
            ticket_id,
            status,
            used_at,
        },
    };

    Ok(success(response, "Ticket validated").into_response())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemedTicket {
    pub ticket_id: String,
    pub status: TicketStatus,
    pub used_at: Option<DateTime<Utc>>,
}

pub async fn use_ticket(
    State(state): State<AppState>,
    user: AuthUser,
    Path(ticket_id): Path<String>,
) -> Result<Response, AppError> {
    user.require(Operation::RedeemTicket)?;

    let organization_id = user.organization_id.ok_or_else(|| {
        AppError::Forbidden("Organizer account has no organization".to_string())
    })?;

    // The status check and the write are one statement: of two concurrent
    // scans of the same badge, exactly one matches.
    let redeemed = sqlx::query_as::<_, (String, TicketStatus, Option<DateTime<Utc>>)>(
        "UPDATE tickets t
         SET status = 'used', used_at = now(), used_by = $2, updated_at = now()
         FROM events e
         WHERE t.ticket_id = $1
           AND t.event_id = e.id
           AND e.organization_id = $3
           AND t.status = 'active'
         RETURNING t.ticket_id, t.status, t.used_at",
    )
    .bind(&ticket_id)
    .bind(user.id)
    .bind(organization_id)
    .fetch_optional(&state.pool)
    .await?;

    if let Some((ticket_id, status, used_at)) = redeemed {
        let view = RedeemedTicket {
            ticket_id,
            status,
            used_at,
        };
        return Ok(success(view, "Ticket marked as used").into_response());
    }

    // The update missed: absent, foreign, or no longer active.
    let current = sqlx::query_as::<_, (TicketStatus, Option<DateTime<Utc>>, Uuid)>(
        "SELECT t.status, t.used_at, e.organization_id
         FROM tickets t
         JOIN events e ON e.id = t.event_id
         WHERE t.ticket_id = $1",
    )
    .bind(&ticket_id)
    .fetch_optional(&state.pool)
    .await?;

    let Some((status, used_at, ticket_org)) = current else {
        return Err(AppError::NotFound("Ticket not found".to_string()));
    };

    if ticket_org != organization_id {
        return Err(AppError::Forbidden(
            "Ticket does not belong to your organization".to_string(),
        ));
    }

    match status.redeem() {
        // No transition re-enters 'active', so with owner and org agreeing
        // this arm cannot match; kept as a guard instead of a panic.
        Ok(_) => Err(AppError::conflict("Ticket was redeemed concurrently")),
        Err(e) => Err(refused_transition("used", e, used_at)),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRequest {
    pub reason: ReturnReason,
    pub comment: Option<String>,
}

pub async fn return_ticket(
    State(state): State<AppState>,
    user: AuthUser,
    Path(ticket_id): Path<String>,
    Json(body): Json<ReturnRequest>,
) -> Result<Response, AppError> {
    user.require(Operation::ReturnTicket)?;

    let mut tx = state.pool.begin().await?;

    let event_id = sqlx::query_scalar::<_, Uuid>(
        "UPDATE tickets
         SET status = 'cancelled',
             return_reason = $2,
             return_comment = $3,
             returned_at = now(),
             updated_at = now()
         WHERE ticket_id = $1 AND user_id = $4 AND status = 'active'
         RETURNING event_id",
    )
    .bind(&ticket_id)
    .bind(body.reason)
    .bind(&body.comment)
    .bind(user.id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(event_id) = event_id else {
        tx.rollback().await?;
        return Err(classify_unreturnable(&state, &ticket_id, user.id).await?);
    };

    // Registration counter release, floored at zero.
    sqlx::query(
        "UPDATE events
         SET registrations = GREATEST(registrations - 1, 0), updated_at = now()
         WHERE id = $1",
    )
    .bind(event_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(empty_success("Ticket returned successfully").into_response())
}

async fn classify_unreturnable(
    state: &AppState,
    ticket_id: &str,
    user_id: Uuid,
) -> Result<AppError, AppError> {
    let ticket = sqlx::query_as::<_, (Uuid, TicketStatus, Option<DateTime<Utc>>)>(
        "SELECT user_id, status, used_at FROM tickets WHERE ticket_id = $1",
    )
    .bind(ticket_id)
    .fetch_optional(&state.pool)
    .await?;

    let Some((owner, status, used_at)) = ticket else {
        return Ok(AppError::NotFound("Ticket not found".to_string()));
    };

    if owner != user_id {
        return Ok(AppError::Forbidden("Access denied".to_string()));
    }

    match status.cancel() {
        // Same guard as in use_ticket: nothing re-enters 'active'.
        Ok(_) => Ok(AppError::conflict("Ticket was returned concurrently")),
        Err(e) => Ok(refused_transition("cancelled", e, used_at)),
    }
}

/// Maps a refused state transition onto the error taxonomy: an operation
/// that already happened is a Conflict carrying the current status, any
/// other non-active state is InvalidState.
fn refused_transition(
    attempted: &str,
    err: TransitionError,
    used_at: Option<DateTime<Utc>>,
) -> AppError {
    match err {
        TransitionError::AlreadyDone(status) => AppError::Conflict(
            format!("Ticket is already {}", status.as_str()),
            Some(json!({ "status": status, "usedAt": used_at })),
        ),
        TransitionError::NotActive(status) => AppError::InvalidState(format!(
            "Ticket is {}, cannot be {}",
            status.as_str(),
            attempted
        )),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use sqlx::PgPool;

    use super::*;
    use crate::auth::AuthKeys;
    use crate::models::user::OrganizerStatus;

    #[test]
    fn test_second_redeem_is_conflict_with_previous_used_at() {
        let used_at = Some(Utc::now());
        let err = TicketStatus::Used.redeem().unwrap_err();

        let app_err = refused_transition("used", err, used_at);
        assert_eq!(app_err.code(), "CONFLICT");
        match app_err {
            AppError::Conflict(_, Some(details)) => {
                assert_eq!(details["status"], "used");
                assert!(!details["usedAt"].is_null());
            }
            other => panic!("expected conflict with details, got {other:?}"),
        }
    }

    #[test]
    fn test_redeem_of_returned_ticket_is_invalid_state() {
        let err = TicketStatus::Cancelled.redeem().unwrap_err();
        let app_err = refused_transition("used", err, None);
        assert_eq!(app_err.code(), "INVALID_STATE");
    }

    #[test]
    fn test_double_return_is_conflict() {
        let err = TicketStatus::Cancelled.cancel().unwrap_err();
        let app_err = refused_transition("cancelled", err, None);
        assert_eq!(app_err.code(), "CONFLICT");
    }

    // Database-backed lifecycle tests. The capacity ceiling, the one-live-
    // ticket index and the conditional transitions live in the SQL, so they
    // are exercised against a real schema.

    fn state_for(pool: PgPool) -> AppState {
        AppState::new(pool, AuthKeys::new("test-secret"))
    }

    fn student(id: Uuid) -> AuthUser {
        AuthUser {
            id,
            role: Role::Student,
            organizer_status: OrganizerStatus::Pending,
            organization_id: None,
        }
    }

    fn organizer(id: Uuid, org: Uuid) -> AuthUser {
        AuthUser {
            id,
            role: Role::Organizer,
            organizer_status: OrganizerStatus::Approved,
            organization_id: Some(org),
        }
    }

    async fn seed_org(pool: &PgPool) -> Uuid {
        sqlx::query_scalar(
            "INSERT INTO organizations (name, contact_email)
             VALUES ('Chess Club', 'chess@campus.edu')
             RETURNING id",
        )
        .fetch_one(pool)
        .await
        .unwrap()
    }

    async fn seed_user(pool: &PgPool, email: &str, role: &str, org: Option<Uuid>) -> Uuid {
        sqlx::query_scalar(
            "INSERT INTO users
                (email, password_hash, first_name, last_name, role,
                 organizer_status, organization_id)
             VALUES ($1, 'x', 'Test', 'User', $2::user_role,
                     'approved', $3)
             RETURNING id",
        )
        .bind(email)
        .bind(role)
        .bind(org)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    async fn seed_event(pool: &PgPool, org: Uuid, creator: Uuid, capacity: i32) -> Uuid {
        sqlx::query_scalar(
            "INSERT INTO events
                (title, description, date, start_time, end_time, location,
                 category, ticket_type, capacity, status, is_approved,
                 organization_id, created_by)
             VALUES ('Career Fair', 'Annual fair', now() + interval '7 days',
                     '10:00', '16:00', 'Main Hall', 'career', 'free', $1,
                     'published', TRUE, $2, $3)
             RETURNING id",
        )
        .bind(capacity)
        .bind(org)
        .bind(creator)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    async fn registrations(pool: &PgPool, event_id: Uuid) -> i32 {
        sqlx::query_scalar("SELECT registrations FROM events WHERE id = $1")
            .bind(event_id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    async fn ticket_id_of(pool: &PgPool, user_id: Uuid, event_id: Uuid) -> String {
        sqlx::query_scalar(
            "SELECT ticket_id FROM tickets
             WHERE user_id = $1 AND event_id = $2 AND status = 'active'",
        )
        .bind(user_id)
        .bind(event_id)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    async fn claim(state: &AppState, user: &AuthUser, event_id: Uuid) -> Result<Response, AppError> {
        claim_ticket(
            State(state.clone()),
            user.clone(),
            Json(ClaimRequest { event_id }),
        )
        .await
    }

    #[sqlx::test]
    async fn test_claim_fills_last_seat_then_sells_out(pool: PgPool) {
        let org = seed_org(&pool).await;
        let creator = seed_user(&pool, "org@campus.edu", "organizer", Some(org)).await;
        let event_id = seed_event(&pool, org, creator, 1).await;
        let alice = student(seed_user(&pool, "alice@campus.edu", "student", None).await);
        let bob = student(seed_user(&pool, "bob@campus.edu", "student", None).await);
        let state = state_for(pool.clone());

        let resp = claim(&state, &alice, event_id).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(registrations(&pool, event_id).await, 1);

        let err = claim(&state, &bob, event_id).await.unwrap_err();
        assert_eq!(err.code(), "CONFLICT");
        // The losing claim must not have moved the counter past capacity.
        assert_eq!(registrations(&pool, event_id).await, 1);
    }

    #[sqlx::test]
    async fn test_duplicate_claim_refused_and_index_closes_the_race(pool: PgPool) {
        let org = seed_org(&pool).await;
        let creator = seed_user(&pool, "org@campus.edu", "organizer", Some(org)).await;
        let event_id = seed_event(&pool, org, creator, 5).await;
        let alice = student(seed_user(&pool, "alice@campus.edu", "student", None).await);
        let state = state_for(pool.clone());

        claim(&state, &alice, event_id).await.unwrap();

        let err = claim(&state, &alice, event_id).await.unwrap_err();
        assert_eq!(err.code(), "CONFLICT");

        // A racing insert that slips past the handler's pre-check still hits
        // the partial unique index.
        let err = sqlx::query(
            "INSERT INTO tickets (ticket_id, event_id, user_id, qr_code)
             VALUES ('dup-ticket', $1, $2, 'dup-qr')",
        )
        .bind(event_id)
        .bind(alice.id)
        .execute(&pool)
        .await
        .unwrap_err();
        match err {
            sqlx::Error::Database(db) => assert!(db.is_unique_violation()),
            other => panic!("expected unique violation, got {other:?}"),
        }
    }

    #[sqlx::test]
    async fn test_redeem_marks_used_exactly_once(pool: PgPool) {
        let org = seed_org(&pool).await;
        let scanner = organizer(seed_user(&pool, "org@campus.edu", "organizer", Some(org)).await, org);
        let event_id = seed_event(&pool, org, scanner.id, 5).await;
        let alice = student(seed_user(&pool, "alice@campus.edu", "student", None).await);
        let state = state_for(pool.clone());

        claim(&state, &alice, event_id).await.unwrap();
        let ticket_id = ticket_id_of(&pool, alice.id, event_id).await;

        let resp = use_ticket(State(state.clone()), scanner.clone(), Path(ticket_id.clone()))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let err = use_ticket(State(state.clone()), scanner, Path(ticket_id))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "CONFLICT");
        match err {
            AppError::Conflict(_, Some(details)) => {
                assert_eq!(details["status"], "used");
                assert!(!details["usedAt"].is_null());
            }
            other => panic!("expected conflict with details, got {other:?}"),
        }
    }

    #[sqlx::test]
    async fn test_return_releases_seat_and_never_goes_negative(pool: PgPool) {
        let org = seed_org(&pool).await;
        let creator = seed_user(&pool, "org@campus.edu", "organizer", Some(org)).await;
        let event_id = seed_event(&pool, org, creator, 5).await;
        let alice = student(seed_user(&pool, "alice@campus.edu", "student", None).await);
        let state = state_for(pool.clone());

        claim(&state, &alice, event_id).await.unwrap();
        let ticket_id = ticket_id_of(&pool, alice.id, event_id).await;

        let body = ReturnRequest {
            reason: ReturnReason::UnableToAttend,
            comment: None,
        };
        return_ticket(
            State(state.clone()),
            alice.clone(),
            Path(ticket_id.clone()),
            Json(body),
        )
        .await
        .unwrap();
        assert_eq!(registrations(&pool, event_id).await, 0);

        let body = ReturnRequest {
            reason: ReturnReason::UnableToAttend,
            comment: None,
        };
        let err = return_ticket(
            State(state.clone()),
            alice.clone(),
            Path(ticket_id),
            Json(body),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), "CONFLICT");

        // Cancelled tickets do not count against the index, so the seat can
        // be claimed again.
        claim(&state, &alice, event_id).await.unwrap();
        let ticket_id = ticket_id_of(&pool, alice.id, event_id).await;

        // Counter release is floored at zero even if the counter was reset
        // underneath the return.
        sqlx::query("UPDATE events SET registrations = 0 WHERE id = $1")
            .bind(event_id)
            .execute(&pool)
            .await
            .unwrap();
        let body = ReturnRequest {
            reason: ReturnReason::ScheduleConflict,
            comment: None,
        };
        return_ticket(State(state.clone()), alice, Path(ticket_id), Json(body))
            .await
            .unwrap();
        assert_eq!(registrations(&pool, event_id).await, 0);
    }
}
