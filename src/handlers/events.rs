//! Public event browsing plus organizer-owned event management and the
//! student saved-events list.

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::auth::policy::Operation;
use crate::auth::AuthUser;
use crate::models::event::{Event, EventCategory, EventStatus, TicketType};
use crate::models::organization::OrganizationSummary;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::pagination::{Page, PageQuery, Pagination};
use crate::utils::response::{created, empty_success, success};

#[derive(Deserialize)]
pub struct ListEventsQuery {
    pub category: Option<EventCategory>,
    pub date: Option<NaiveDate>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(FromRow)]
struct EventWithCountsRow {
    #[sqlx(flatten)]
    event: Event,
    tickets_issued: i64,
    org_name: String,
    org_logo: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventView {
    #[serde(flatten)]
    pub event: Event,
    pub tickets_issued: i64,
    pub remaining_capacity: i64,
    pub organization: OrganizationSummary,
}

impl EventWithCountsRow {
    fn into_view(self) -> EventView {
        let remaining = i64::from(self.event.capacity) - self.tickets_issued;
        EventView {
            remaining_capacity: remaining.max(0),
            tickets_issued: self.tickets_issued,
            organization: OrganizationSummary {
                id: self.event.organization_id,
                name: self.org_name,
                logo_url: self.org_logo,
            },
            event: self.event,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventListResponse {
    pub events: Vec<EventView>,
    pub pagination: Pagination,
}

const LIST_FILTER: &str = "e.status = 'published'
      AND e.is_approved
      AND ($1::event_category IS NULL OR e.category = $1)
      AND (CASE
             WHEN $2::date IS NULL THEN e.date >= now()
             ELSE e.date >= $2 AND e.date < $2 + INTERVAL '1 day'
           END)
      AND ($3::text IS NULL
           OR e.title ILIKE '%' || $3 || '%'
           OR e.description ILIKE '%' || $3 || '%'
           OR e.location ILIKE '%' || $3 || '%')";

pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<ListEventsQuery>,
) -> Result<Response, AppError> {
    let page = Page::from_query(&PageQuery {
        page: query.page,
        limit: query.limit,
    });

    let rows = sqlx::query_as::<_, EventWithCountsRow>(&format!(
        "SELECT e.*,
                (SELECT COUNT(*) FROM tickets t
                  WHERE t.event_id = e.id AND t.status = 'active') AS tickets_issued,
                o.name AS org_name,
                o.logo_url AS org_logo
         FROM events e
         JOIN organizations o ON o.id = e.organization_id
         WHERE {LIST_FILTER}
         ORDER BY e.date ASC
         LIMIT $4 OFFSET $5",
    ))
    .bind(query.category)
    .bind(query.date)
    .bind(&query.search)
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(&state.pool)
    .await?;

    let total = sqlx::query_scalar::<_, i64>(&format!(
        "SELECT COUNT(*) FROM events e WHERE {LIST_FILTER}",
    ))
    .bind(query.category)
    .bind(query.date)
    .bind(&query.search)
    .fetch_one(&state.pool)
    .await?;

    let returned = rows.len();
    let response = EventListResponse {
        events: rows.into_iter().map(EventWithCountsRow::into_view).collect(),
        pagination: Pagination::new(page, total, returned),
    };

    Ok(success(response, "Events fetched").into_response())
}

pub async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let row = sqlx::query_as::<_, EventWithCountsRow>(
        "SELECT e.*,
                (SELECT COUNT(*) FROM tickets t
                  WHERE t.event_id = e.id AND t.status = 'active') AS tickets_issued,
                o.name AS org_name,
                o.logo_url AS org_logo
         FROM events e
         JOIN organizations o ON o.id = e.organization_id
         WHERE e.id = $1",
    )
    .bind(event_id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

    Ok(success(row.into_view(), "Event fetched").into_response())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub start_time: String,
    pub end_time: String,
    pub location: String,
    pub category: EventCategory,
    pub ticket_type: TicketType,
    pub ticket_price: Option<Decimal>,
    pub capacity: i32,
    #[serde(default)]
    pub tags: Vec<String>,
}

pub async fn create_event(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<CreateEventRequest>,
) -> Result<Response, AppError> {
    user.require(Operation::ManageEvents)?;
    let organization_id = user.organization_id.ok_or_else(|| {
        AppError::Forbidden("Organizer account has no organization".to_string())
    })?;

    if body.title.trim().is_empty() || body.description.trim().is_empty() {
        return Err(AppError::ValidationError(
            "Title and description are required".to_string(),
        ));
    }
    if body.capacity < 1 {
        return Err(AppError::ValidationError(
            "Capacity must be at least 1".to_string(),
        ));
    }
    if body.ticket_type == TicketType::Paid && body.ticket_price.is_none() {
        return Err(AppError::ValidationError(
            "Paid events require a ticket price".to_string(),
        ));
    }

    // New events start as unapproved drafts and go through moderation.
    let event = sqlx::query_as::<_, Event>(
        "INSERT INTO events
            (title, description, date, start_time, end_time, location, category,
             ticket_type, ticket_price, capacity, tags, organization_id, created_by)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
         RETURNING *",
    )
    .bind(body.title.trim())
    .bind(body.description.trim())
    .bind(body.date)
    .bind(&body.start_time)
    .bind(&body.end_time)
    .bind(&body.location)
    .bind(body.category)
    .bind(body.ticket_type)
    .bind(body.ticket_price)
    .bind(body.capacity)
    .bind(&body.tags)
    .bind(organization_id)
    .bind(user.id)
    .fetch_one(&state.pool)
    .await?;

    Ok(created(event, "Event created").into_response())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub location: Option<String>,
    pub category: Option<EventCategory>,
    pub ticket_type: Option<TicketType>,
    pub ticket_price: Option<Decimal>,
    pub capacity: Option<i32>,
    pub status: Option<EventStatus>,
    pub tags: Option<Vec<String>>,
}

pub async fn update_event(
    State(state): State<AppState>,
    user: AuthUser,
    Path(event_id): Path<Uuid>,
    Json(body): Json<UpdateEventRequest>,
) -> Result<Response, AppError> {
    user.require(Operation::ManageEvents)?;
    require_owner(&state, event_id, user.id).await?;

    if let Some(capacity) = body.capacity {
        if capacity < 1 {
            return Err(AppError::ValidationError(
                "Capacity must be at least 1".to_string(),
            ));
        }
    }

    let event = sqlx::query_as::<_, Event>(
        "UPDATE events SET
            title = COALESCE($2, title),
            description = COALESCE($3, description),
            date = COALESCE($4, date),
            start_time = COALESCE($5, start_time),
            end_time = COALESCE($6, end_time),
            location = COALESCE($7, location),
            category = COALESCE($8, category),
            ticket_type = COALESCE($9, ticket_type),
            ticket_price = COALESCE($10, ticket_price),
            capacity = COALESCE($11, capacity),
            status = COALESCE($12, status),
            tags = COALESCE($13, tags),
            updated_at = now()
         WHERE id = $1
         RETURNING *",
    )
    .bind(event_id)
    .bind(&body.title)
    .bind(&body.description)
    .bind(body.date)
    .bind(&body.start_time)
    .bind(&body.end_time)
    .bind(&body.location)
    .bind(body.category)
    .bind(body.ticket_type)
    .bind(body.ticket_price)
    .bind(body.capacity)
    .bind(body.status)
    .bind(&body.tags)
    .fetch_one(&state.pool)
    .await?;

    Ok(success(event, "Event updated").into_response())
}

pub async fn delete_event(
    State(state): State<AppState>,
    user: AuthUser,
    Path(event_id): Path<Uuid>,
) -> Result<Response, AppError> {
    user.require(Operation::ManageEvents)?;
    require_owner(&state, event_id, user.id).await?;

    // Both deletes commit together: if the tickets FK refuses the event
    // delete, the saved_events cleanup must roll back with it.
    let mut tx = state.pool.begin().await?;

    sqlx::query("DELETE FROM saved_events WHERE event_id = $1")
        .bind(event_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM events WHERE id = $1")
        .bind(event_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                AppError::conflict("Event has issued tickets and cannot be deleted")
            }
            _ => AppError::from(e),
        })?;

    tx.commit().await?;

    Ok(empty_success("Event deleted successfully").into_response())
}

async fn require_owner(state: &AppState, event_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
    let created_by = sqlx::query_scalar::<_, Uuid>("SELECT created_by FROM events WHERE id = $1")
        .bind(event_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

    if created_by != user_id {
        return Err(AppError::Forbidden("Access denied".to_string()));
    }
    Ok(())
}

pub async fn save_event(
    State(state): State<AppState>,
    user: AuthUser,
    Path(event_id): Path<Uuid>,
) -> Result<Response, AppError> {
    user.require(Operation::ViewOwnTickets)?;

    let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM events WHERE id = $1")
        .bind(event_id)
        .fetch_one(&state.pool)
        .await?;
    if exists == 0 {
        return Err(AppError::NotFound("Event not found".to_string()));
    }

    sqlx::query("INSERT INTO saved_events (user_id, event_id) VALUES ($1, $2)")
        .bind(user.id)
        .bind(event_id)
        .execute(&state.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::conflict("Event already saved")
            }
            _ => AppError::from(e),
        })?;

    Ok(created((), "Event saved successfully").into_response())
}

pub async fn unsave_event(
    State(state): State<AppState>,
    user: AuthUser,
    Path(event_id): Path<Uuid>,
) -> Result<Response, AppError> {
    user.require(Operation::ViewOwnTickets)?;

    let deleted = sqlx::query("DELETE FROM saved_events WHERE user_id = $1 AND event_id = $2")
        .bind(user.id)
        .bind(event_id)
        .execute(&state.pool)
        .await?;

    if deleted.rows_affected() == 0 {
        return Err(AppError::NotFound("Saved event not found".to_string()));
    }

    Ok(empty_success("Event removed from saved events").into_response())
}

pub async fn my_saved_events(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Response, AppError> {
    user.require(Operation::ViewOwnTickets)?;

    let rows = sqlx::query_as::<_, EventWithCountsRow>(
        "SELECT e.*,
                (SELECT COUNT(*) FROM tickets t
                  WHERE t.event_id = e.id AND t.status = 'active') AS tickets_issued,
                o.name AS org_name,
                o.logo_url AS org_logo
         FROM saved_events s
         JOIN events e ON e.id = s.event_id
         JOIN organizations o ON o.id = e.organization_id
         WHERE s.user_id = $1
         ORDER BY s.saved_at DESC",
    )
    .bind(user.id)
    .fetch_all(&state.pool)
    .await?;

    let events: Vec<EventView> = rows.into_iter().map(EventWithCountsRow::into_view).collect();
    Ok(success(events, "Saved events fetched").into_response())
}

#[cfg(test)]
mod tests {
    use sqlx::PgPool;

    use super::*;
    use crate::auth::AuthKeys;
    use crate::models::user::{OrganizerStatus, Role};

    async fn seed_fixture(pool: &PgPool) -> (AuthUser, Uuid, Uuid) {
        let org: Uuid = sqlx::query_scalar(
            "INSERT INTO organizations (name, contact_email)
             VALUES ('Chess Club', 'chess@campus.edu')
             RETURNING id",
        )
        .fetch_one(pool)
        .await
        .unwrap();

        let creator: Uuid = sqlx::query_scalar(
            "INSERT INTO users
                (email, password_hash, first_name, last_name, role,
                 organizer_status, organization_id)
             VALUES ('org@campus.edu', 'x', 'Test', 'User', 'organizer',
                     'approved', $1)
             RETURNING id",
        )
        .bind(org)
        .fetch_one(pool)
        .await
        .unwrap();

        let student: Uuid = sqlx::query_scalar(
            "INSERT INTO users (email, password_hash, first_name, last_name, role)
             VALUES ('alice@campus.edu', 'x', 'Test', 'User', 'student')
             RETURNING id",
        )
        .fetch_one(pool)
        .await
        .unwrap();

        let event_id: Uuid = sqlx::query_scalar(
            "INSERT INTO events
                (title, description, date, start_time, end_time, location,
                 category, ticket_type, capacity, status, is_approved,
                 organization_id, created_by)
             VALUES ('Career Fair', 'Annual fair', now() + interval '7 days',
                     '10:00', '16:00', 'Main Hall', 'career', 'free', 5,
                     'published', TRUE, $1, $2)
             RETURNING id",
        )
        .bind(org)
        .bind(creator)
        .fetch_one(pool)
        .await
        .unwrap();

        let owner = AuthUser {
            id: creator,
            role: Role::Organizer,
            organizer_status: OrganizerStatus::Approved,
            organization_id: Some(org),
        };
        (owner, student, event_id)
    }

    #[sqlx::test]
    async fn test_refused_delete_keeps_saved_events(pool: PgPool) {
        let (owner, student, event_id) = seed_fixture(&pool).await;

        sqlx::query("INSERT INTO saved_events (user_id, event_id) VALUES ($1, $2)")
            .bind(student)
            .bind(event_id)
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO tickets (ticket_id, event_id, user_id, qr_code)
             VALUES ('t-1', $1, $2, 'qr-1')",
        )
        .bind(event_id)
        .bind(student)
        .execute(&pool)
        .await
        .unwrap();

        let state = AppState::new(pool.clone(), AuthKeys::new("test-secret"));
        let err = delete_event(State(state), owner, Path(event_id))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "CONFLICT");

        // The bookmark cleanup rolls back with the refused event delete.
        let saved: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM saved_events WHERE event_id = $1",
        )
        .bind(event_id)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(saved, 1);
    }

    #[sqlx::test]
    async fn test_delete_without_tickets_removes_bookmarks(pool: PgPool) {
        let (owner, student, event_id) = seed_fixture(&pool).await;

        sqlx::query("INSERT INTO saved_events (user_id, event_id) VALUES ($1, $2)")
            .bind(student)
            .bind(event_id)
            .execute(&pool)
            .await
            .unwrap();

        let state = AppState::new(pool.clone(), AuthKeys::new("test-secret"));
        delete_event(State(state), owner, Path(event_id))
            .await
            .unwrap();

        let saved: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM saved_events")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(saved, 0);
    }
}
