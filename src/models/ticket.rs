use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Ticket lifecycle. `Active` is the only state with outgoing edges:
///
/// ```text
/// active -> used       (organizer redeems)
/// active -> cancelled  (owner returns)
/// active -> expired    (event passes)
/// ```
///
/// `used`, `cancelled` and `expired` are terminal. Handlers perform the
/// actual transition as a conditional update keyed on `status = 'active'`;
/// this type is the single place that decides which transitions exist and
/// how a refused one is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "ticket_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Active,
    Used,
    Cancelled,
    Expired,
}

/// A transition refused by the state machine, carrying the status the
/// ticket was actually in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    /// The ticket already reached a terminal state through the same kind
    /// of operation (redeem on used, return on cancelled).
    AlreadyDone(TicketStatus),
    /// The ticket is in a state the operation does not apply to.
    NotActive(TicketStatus),
}

impl TicketStatus {
    pub fn redeem(self) -> Result<TicketStatus, TransitionError> {
        match self {
            TicketStatus::Active => Ok(TicketStatus::Used),
            TicketStatus::Used => Err(TransitionError::AlreadyDone(self)),
            TicketStatus::Cancelled | TicketStatus::Expired => {
                Err(TransitionError::NotActive(self))
            }
        }
    }

    pub fn cancel(self) -> Result<TicketStatus, TransitionError> {
        match self {
            TicketStatus::Active => Ok(TicketStatus::Cancelled),
            TicketStatus::Cancelled => Err(TransitionError::AlreadyDone(self)),
            TicketStatus::Used | TicketStatus::Expired => Err(TransitionError::NotActive(self)),
        }
    }

    pub fn expire(self) -> Result<TicketStatus, TransitionError> {
        match self {
            TicketStatus::Active => Ok(TicketStatus::Expired),
            other => Err(TransitionError::NotActive(other)),
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(self, TicketStatus::Active)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            TicketStatus::Active => "active",
            TicketStatus::Used => "used",
            TicketStatus::Cancelled => "cancelled",
            TicketStatus::Expired => "expired",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "return_reason", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReturnReason {
    UnableToAttend,
    NoLongerInterested,
    WrongEvent,
    DuplicateTicket,
    EventCanceled,
    ScheduleConflict,
    PersonalReasons,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: Uuid,
    pub ticket_id: String,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub qr_code: String,
    pub status: TicketStatus,
    pub used_at: Option<DateTime<Utc>>,
    pub used_by: Option<Uuid>,
    pub price: Decimal,
    pub return_reason: Option<ReturnReason>,
    pub return_comment: Option<String>,
    pub returned_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redeem_once() {
        let first = TicketStatus::Active.redeem().unwrap();
        assert_eq!(first, TicketStatus::Used);

        // Second redeem must refuse and report the used state, not toggle.
        let second = first.redeem().unwrap_err();
        assert_eq!(second, TransitionError::AlreadyDone(TicketStatus::Used));
    }

    #[test]
    fn test_return_then_redeem_blocked() {
        let returned = TicketStatus::Active.cancel().unwrap();
        assert_eq!(returned, TicketStatus::Cancelled);

        let err = returned.redeem().unwrap_err();
        assert_eq!(err, TransitionError::NotActive(TicketStatus::Cancelled));
    }

    #[test]
    fn test_terminal_states_have_no_outgoing_edges() {
        for status in [
            TicketStatus::Used,
            TicketStatus::Cancelled,
            TicketStatus::Expired,
        ] {
            assert!(status.is_terminal());
            assert!(status.redeem().is_err());
            assert!(status.cancel().is_err());
            assert!(status.expire().is_err());
        }
        assert!(!TicketStatus::Active.is_terminal());
    }

    #[test]
    fn test_double_return_reports_already_done() {
        let cancelled = TicketStatus::Active.cancel().unwrap();
        assert_eq!(
            cancelled.cancel().unwrap_err(),
            TransitionError::AlreadyDone(TicketStatus::Cancelled)
        );
    }

    #[test]
    fn test_expire_only_from_active() {
        assert_eq!(TicketStatus::Active.expire().unwrap(), TicketStatus::Expired);
    }
}
