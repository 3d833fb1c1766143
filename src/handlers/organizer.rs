//! Organizer-facing reporting: dashboard, own events, per-event analytics
//! and attendee lists. All aggregation happens in SQL.

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::auth::policy::Operation;
use crate::auth::AuthUser;
use crate::models::event::{Event, EventStatus, TicketType};
use crate::models::ticket::{ReturnReason, TicketStatus};
use crate::models::user::Role;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_events: i64,
    pub published_events: i64,
    pub pending_events: i64,
    pub total_tickets: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status: TicketStatus,
    pub count: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventStatusCount {
    pub status: EventStatus,
    pub count: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReasonCount {
    pub reason: ReturnReason,
    pub count: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTickets {
    pub month: DateTime<Utc>,
    pub ticket_count: i64,
}

#[derive(FromRow)]
struct OrganizerEventRow {
    #[sqlx(flatten)]
    event: Event,
    tickets_issued: i64,
    tickets_used: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizerEventView {
    #[serde(flatten)]
    pub event: Event,
    pub tickets_issued: i64,
    pub tickets_used: i64,
    pub remaining_capacity: i64,
}

impl OrganizerEventRow {
    fn into_view(self) -> OrganizerEventView {
        let remaining = i64::from(self.event.capacity) - self.tickets_issued;
        OrganizerEventView {
            remaining_capacity: remaining.max(0),
            tickets_issued: self.tickets_issued,
            tickets_used: self.tickets_used,
            event: self.event,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub stats: DashboardStats,
    pub ticket_status_breakdown: Vec<StatusCount>,
    pub cancelled_tickets_analytics: Vec<ReasonCount>,
    pub event_status_breakdown: Vec<EventStatusCount>,
    pub recent_events: Vec<OrganizerEventView>,
    pub upcoming_events: Vec<OrganizerEventView>,
    pub monthly_tickets: Vec<MonthlyTickets>,
}

const ORGANIZER_EVENT_COLUMNS: &str = "e.*,
    (SELECT COUNT(*) FROM tickets t
      WHERE t.event_id = e.id AND t.status IN ('active', 'used')) AS tickets_issued,
    (SELECT COUNT(*) FROM tickets t
      WHERE t.event_id = e.id AND t.status = 'used') AS tickets_used";

pub async fn dashboard(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Response, AppError> {
    user.require(Operation::ViewOrganizerReports)?;

    let (total_events, published_events) = sqlx::query_as::<_, (i64, i64)>(
        "SELECT COUNT(*),
                COUNT(*) FILTER (WHERE status = 'published' AND is_approved)
         FROM events WHERE created_by = $1",
    )
    .bind(user.id)
    .fetch_one(&state.pool)
    .await?;

    let total_tickets = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM tickets t
         JOIN events e ON e.id = t.event_id
         WHERE e.created_by = $1",
    )
    .bind(user.id)
    .fetch_one(&state.pool)
    .await?;

    let ticket_status_breakdown = sqlx::query_as::<_, (TicketStatus, i64)>(
        "SELECT t.status, COUNT(*) FROM tickets t
         JOIN events e ON e.id = t.event_id
         WHERE e.created_by = $1
         GROUP BY t.status",
    )
    .bind(user.id)
    .fetch_all(&state.pool)
    .await?
    .into_iter()
    .map(|(status, count)| StatusCount { status, count })
    .collect();

    let cancelled_tickets_analytics = sqlx::query_as::<_, (ReturnReason, i64)>(
        "SELECT t.return_reason, COUNT(*) FROM tickets t
         JOIN events e ON e.id = t.event_id
         WHERE e.created_by = $1 AND t.status = 'cancelled' AND t.return_reason IS NOT NULL
         GROUP BY t.return_reason",
    )
    .bind(user.id)
    .fetch_all(&state.pool)
    .await?
    .into_iter()
    .map(|(reason, count)| ReasonCount { reason, count })
    .collect();

    let event_status_breakdown = sqlx::query_as::<_, (EventStatus, i64)>(
        "SELECT status, COUNT(*) FROM events WHERE created_by = $1 GROUP BY status",
    )
    .bind(user.id)
    .fetch_all(&state.pool)
    .await?
    .into_iter()
    .map(|(status, count)| EventStatusCount { status, count })
    .collect();

    let recent_events = sqlx::query_as::<_, OrganizerEventRow>(&format!(
        "SELECT {ORGANIZER_EVENT_COLUMNS}
         FROM events e
         WHERE e.created_by = $1
         ORDER BY e.created_at DESC
         LIMIT 5",
    ))
    .bind(user.id)
    .fetch_all(&state.pool)
    .await?;

    let upcoming_events = sqlx::query_as::<_, OrganizerEventRow>(&format!(
        "SELECT {ORGANIZER_EVENT_COLUMNS}
         FROM events e
         WHERE e.created_by = $1
           AND e.status = 'published' AND e.is_approved AND e.date >= now()
         ORDER BY e.date ASC
         LIMIT 5",
    ))
    .bind(user.id)
    .fetch_all(&state.pool)
    .await?;

    let monthly_tickets = sqlx::query_as::<_, (DateTime<Utc>, i64)>(
        "SELECT date_trunc('month', t.created_at) AS month, COUNT(*)
         FROM tickets t
         JOIN events e ON e.id = t.event_id
         WHERE e.created_by = $1
         GROUP BY month
         ORDER BY month
         LIMIT 12",
    )
    .bind(user.id)
    .fetch_all(&state.pool)
    .await?
    .into_iter()
    .map(|(month, ticket_count)| MonthlyTickets {
        month,
        ticket_count,
    })
    .collect();

    let response = DashboardResponse {
        stats: DashboardStats {
            pending_events: total_events - published_events,
            total_events,
            published_events,
            total_tickets,
        },
        ticket_status_breakdown,
        cancelled_tickets_analytics,
        event_status_breakdown,
        recent_events: recent_events
            .into_iter()
            .map(OrganizerEventRow::into_view)
            .collect(),
        upcoming_events: upcoming_events
            .into_iter()
            .map(OrganizerEventRow::into_view)
            .collect(),
        monthly_tickets,
    };

    Ok(success(response, "Dashboard fetched").into_response())
}

pub async fn my_events(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Response, AppError> {
    user.require(Operation::ViewOrganizerReports)?;

    let rows = sqlx::query_as::<_, OrganizerEventRow>(&format!(
        "SELECT {ORGANIZER_EVENT_COLUMNS}
         FROM events e
         WHERE e.created_by = $1
         ORDER BY e.created_at DESC",
    ))
    .bind(user.id)
    .fetch_all(&state.pool)
    .await?;

    let events: Vec<OrganizerEventView> =
        rows.into_iter().map(OrganizerEventRow::into_view).collect();
    Ok(success(events, "Events fetched").into_response())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketStats {
    pub total_tickets: i64,
    pub active_tickets: i64,
    pub used_tickets: i64,
    pub cancelled_tickets: i64,
    pub attendance_rate: f64,
    pub capacity_utilization: f64,
}

#[derive(Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RevenueStats {
    pub total_revenue: Decimal,
    pub average_price: Decimal,
    pub max_price: Decimal,
    pub min_price: Decimal,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyCount {
    pub day: DateTime<Utc>,
    pub count: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyCount {
    pub hour: i32,
    pub count: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleCount {
    pub role: Role,
    pub count: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventAnalyticsResponse {
    pub event: AnalyticsEventHeader,
    pub ticket_stats: TicketStats,
    pub revenue: RevenueStats,
    pub tickets_by_day: Vec<DailyCount>,
    pub tickets_by_hour: Vec<HourlyCount>,
    pub attendee_demographics: Vec<RoleCount>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEventHeader {
    pub id: Uuid,
    pub title: String,
    pub date: DateTime<Utc>,
    pub capacity: i32,
    pub ticket_type: TicketType,
    pub ticket_price: Option<Decimal>,
}

pub async fn event_analytics(
    State(state): State<AppState>,
    user: AuthUser,
    Path(event_id): Path<Uuid>,
) -> Result<Response, AppError> {
    user.require(Operation::ViewOrganizerReports)?;
    let event = owned_event(&state, event_id, user.id).await?;

    let (total, active, used, cancelled) = sqlx::query_as::<_, (i64, i64, i64, i64)>(
        "SELECT COUNT(*),
                COUNT(*) FILTER (WHERE status = 'active'),
                COUNT(*) FILTER (WHERE status = 'used'),
                COUNT(*) FILTER (WHERE status = 'cancelled')
         FROM tickets WHERE event_id = $1",
    )
    .bind(event_id)
    .fetch_one(&state.pool)
    .await?;

    let revenue = sqlx::query_as::<_, RevenueStats>(
        "SELECT COALESCE(SUM(price), 0) AS total_revenue,
                COALESCE(AVG(price), 0) AS average_price,
                COALESCE(MAX(price), 0) AS max_price,
                COALESCE(MIN(price), 0) AS min_price
         FROM tickets WHERE event_id = $1 AND price > 0",
    )
    .bind(event_id)
    .fetch_one(&state.pool)
    .await?;

    let tickets_by_day = sqlx::query_as::<_, (DateTime<Utc>, i64)>(
        "SELECT date_trunc('day', created_at) AS day, COUNT(*)
         FROM tickets WHERE event_id = $1
         GROUP BY day ORDER BY day",
    )
    .bind(event_id)
    .fetch_all(&state.pool)
    .await?
    .into_iter()
    .map(|(day, count)| DailyCount { day, count })
    .collect();

    let tickets_by_hour = sqlx::query_as::<_, (i32, i64)>(
        "SELECT EXTRACT(HOUR FROM created_at)::int AS hour, COUNT(*)
         FROM tickets WHERE event_id = $1
         GROUP BY hour ORDER BY hour",
    )
    .bind(event_id)
    .fetch_all(&state.pool)
    .await?
    .into_iter()
    .map(|(hour, count)| HourlyCount { hour, count })
    .collect();

    let attendee_demographics = sqlx::query_as::<_, (Role, i64)>(
        "SELECT u.role, COUNT(*)
         FROM tickets t
         JOIN users u ON u.id = t.user_id
         WHERE t.event_id = $1
         GROUP BY u.role",
    )
    .bind(event_id)
    .fetch_all(&state.pool)
    .await?
    .into_iter()
    .map(|(role, count)| RoleCount { role, count })
    .collect();

    let attendance_rate = if total > 0 {
        used as f64 / total as f64 * 100.0
    } else {
        0.0
    };
    let capacity_utilization = total as f64 / f64::from(event.capacity) * 100.0;

    let response = EventAnalyticsResponse {
        event: AnalyticsEventHeader {
            id: event.id,
            title: event.title,
            date: event.date,
            capacity: event.capacity,
            ticket_type: event.ticket_type,
            ticket_price: event.ticket_price,
        },
        ticket_stats: TicketStats {
            total_tickets: total,
            active_tickets: active,
            used_tickets: used,
            cancelled_tickets: cancelled,
            attendance_rate,
            capacity_utilization,
        },
        revenue,
        tickets_by_day,
        tickets_by_hour,
        attendee_demographics,
    };

    Ok(success(response, "Analytics fetched").into_response())
}

#[derive(Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    pub ticket_id: String,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub student_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendeesResponse {
    pub attendees: Vec<Attendee>,
    pub total_attendees: usize,
}

pub async fn event_attendees(
    State(state): State<AppState>,
    user: AuthUser,
    Path(event_id): Path<Uuid>,
) -> Result<Response, AppError> {
    user.require(Operation::ViewOrganizerReports)?;
    owned_event(&state, event_id, user.id).await?;

    let attendees = sqlx::query_as::<_, Attendee>(
        "SELECT t.ticket_id, t.status, t.created_at, t.used_at,
                u.first_name, u.last_name, u.email, u.student_id
         FROM tickets t
         JOIN users u ON u.id = t.user_id
         WHERE t.event_id = $1
         ORDER BY t.created_at DESC",
    )
    .bind(event_id)
    .fetch_all(&state.pool)
    .await?;

    let response = AttendeesResponse {
        total_attendees: attendees.len(),
        attendees,
    };

    Ok(success(response, "Attendees fetched").into_response())
}

async fn owned_event(state: &AppState, event_id: Uuid, user_id: Uuid) -> Result<Event, AppError> {
    let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
        .bind(event_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

    if event.created_by != user_id {
        return Err(AppError::Forbidden("Access denied".to_string()));
    }
    Ok(event)
}
