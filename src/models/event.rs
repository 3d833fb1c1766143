use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Draft,
    Published,
    Cancelled,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_category", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EventCategory {
    Academic,
    Social,
    Sports,
    Cultural,
    Career,
    Volunteer,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "ticket_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TicketType {
    Free,
    Paid,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
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
    pub status: EventStatus,
    pub is_approved: bool,
    pub registrations: i32,
    pub tags: Vec<String>,
    pub organization_id: Uuid,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Whether students may claim tickets right now. The same predicate is
    /// re-checked atomically inside the claim update; this copy only exists
    /// to classify a missed update into the right error.
    pub fn is_claimable(&self, now: DateTime<Utc>) -> bool {
        self.status == EventStatus::Published && self.is_approved && self.date >= now
    }

    pub fn ticket_price_for_claim(&self) -> Decimal {
        match self.ticket_type {
            TicketType::Paid => self.ticket_price.unwrap_or_default(),
            TicketType::Free => Decimal::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn event(status: EventStatus, approved: bool, in_future: bool) -> Event {
        let now = Utc::now();
        Event {
            id: Uuid::new_v4(),
            title: "Career Fair".to_string(),
            description: "Annual fair".to_string(),
            date: if in_future {
                now + Duration::days(7)
            } else {
                now - Duration::days(1)
            },
            start_time: "10:00".to_string(),
            end_time: "16:00".to_string(),
            location: "Main Hall".to_string(),
            category: EventCategory::Career,
            ticket_type: TicketType::Free,
            ticket_price: None,
            capacity: 100,
            status,
            is_approved: approved,
            registrations: 0,
            tags: vec![],
            organization_id: Uuid::new_v4(),
            created_by: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_only_published_approved_future_events_claimable() {
        let now = Utc::now();
        assert!(event(EventStatus::Published, true, true).is_claimable(now));
        assert!(!event(EventStatus::Draft, true, true).is_claimable(now));
        assert!(!event(EventStatus::Published, false, true).is_claimable(now));
        assert!(!event(EventStatus::Published, true, false).is_claimable(now));
        assert!(!event(EventStatus::Cancelled, true, true).is_claimable(now));
    }

    #[test]
    fn test_free_event_price_is_zero() {
        let mut e = event(EventStatus::Published, true, true);
        e.ticket_price = Some(Decimal::new(2500, 2));
        assert_eq!(e.ticket_price_for_claim(), Decimal::ZERO);

        e.ticket_type = TicketType::Paid;
        assert_eq!(e.ticket_price_for_claim(), Decimal::new(2500, 2));
    }
}
