//! Cross-event analytics. Organizers see their own organization, admins
//! see everything.

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::policy::Operation;
use crate::auth::AuthUser;
use crate::models::event::EventCategory;
use crate::models::user::Role;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    #[serde(rename = "1month")]
    OneMonth,
    #[serde(rename = "3months")]
    ThreeMonths,
    #[default]
    #[serde(rename = "6months")]
    SixMonths,
    #[serde(rename = "1year")]
    OneYear,
    All,
}

impl TimeRange {
    fn start(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            TimeRange::OneMonth => Some(now - Duration::days(30)),
            TimeRange::ThreeMonths => Some(now - Duration::days(90)),
            TimeRange::SixMonths => Some(now - Duration::days(180)),
            TimeRange::OneYear => Some(now - Duration::days(365)),
            TimeRange::All => None,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQuery {
    #[serde(default)]
    pub time_range: TimeRange,
    pub category: Option<EventCategory>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsResponse {
    pub total_events: i64,
    pub total_registrations: i64,
    pub total_revenue: Decimal,
    pub events_by_category: Vec<CategoryCount>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    pub category: EventCategory,
    pub count: i64,
}

pub async fn event_analytics(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Response, AppError> {
    user.require(Operation::ViewAnalytics)?;

    // Admins see everything; organizers only their organization.
    let organization_scope: Option<Uuid> = match user.role {
        Role::Admin => None,
        _ => Some(user.organization_id.ok_or_else(|| {
            AppError::Forbidden("Organizer account has no organization".to_string())
        })?),
    };
    let since = query.time_range.start(Utc::now());

    const SCOPE_FILTER: &str = "($1::uuid IS NULL OR e.organization_id = $1)
          AND ($2::timestamptz IS NULL OR e.created_at >= $2)
          AND ($3::event_category IS NULL OR e.category = $3)";

    let (total_events, total_registrations) = sqlx::query_as::<_, (i64, i64)>(&format!(
        "SELECT COUNT(DISTINCT e.id),
                COUNT(t.id) FILTER (WHERE t.status IN ('active', 'used'))
         FROM events e
         LEFT JOIN tickets t ON t.event_id = e.id
         WHERE {SCOPE_FILTER}",
    ))
    .bind(organization_scope)
    .bind(since)
    .bind(query.category)
    .fetch_one(&state.pool)
    .await?;

    let total_revenue = sqlx::query_scalar::<_, Decimal>(&format!(
        "SELECT COALESCE(SUM(t.price), 0)
         FROM tickets t
         JOIN events e ON e.id = t.event_id
         WHERE t.status IN ('active', 'used') AND {SCOPE_FILTER}",
    ))
    .bind(organization_scope)
    .bind(since)
    .bind(query.category)
    .fetch_one(&state.pool)
    .await?;

    let events_by_category = sqlx::query_as::<_, (EventCategory, i64)>(&format!(
        "SELECT e.category, COUNT(*)
         FROM events e
         WHERE {SCOPE_FILTER}
         GROUP BY e.category
         ORDER BY COUNT(*) DESC",
    ))
    .bind(organization_scope)
    .bind(since)
    .bind(query.category)
    .fetch_all(&state.pool)
    .await?
    .into_iter()
    .map(|(category, count)| CategoryCount { category, count })
    .collect();

    let response = AnalyticsResponse {
        total_events,
        total_registrations,
        total_revenue,
        events_by_category,
    };

    Ok(success(response, "Analytics fetched").into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_range_parsing() {
        let q: AnalyticsQuery = serde_json::from_str(r#"{"timeRange":"3months"}"#).unwrap();
        assert_eq!(q.time_range, TimeRange::ThreeMonths);

        let q: AnalyticsQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q.time_range, TimeRange::SixMonths);
    }

    #[test]
    fn test_all_range_has_no_lower_bound() {
        assert!(TimeRange::All.start(Utc::now()).is_none());
        assert!(TimeRange::OneMonth.start(Utc::now()).is_some());
    }
}
