//! Role and approval gating, evaluated once per operation.

use crate::auth::AuthUser;
use crate::models::user::{OrganizerStatus, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Claim a ticket for a published event.
    ClaimTicket,
    /// Return one's own active ticket.
    ReturnTicket,
    /// List one's own tickets and saved events.
    ViewOwnTickets,
    /// Scan a QR payload and report the ticket's status.
    ValidateTicket,
    /// Mark a presented ticket as used.
    RedeemTicket,
    /// Create or manage events for one's organization.
    ManageEvents,
    /// Organizer dashboard, per-event analytics, attendee lists.
    ViewOrganizerReports,
    /// Cross-event analytics (organizer: own organization; admin: global).
    ViewAnalytics,
    /// Approve events and organizer accounts.
    Moderate,
}

/// Every permission decision in the API goes through here. Organizer-side
/// operations additionally require the organizer account to be approved.
pub fn can_perform(actor: &AuthUser, operation: Operation) -> bool {
    use Operation::*;

    match operation {
        ClaimTicket | ReturnTicket | ViewOwnTickets => actor.role == Role::Student,
        ValidateTicket | RedeemTicket | ManageEvents | ViewOrganizerReports => {
            approved_organizer(actor)
        }
        ViewAnalytics => approved_organizer(actor) || actor.role == Role::Admin,
        Moderate => actor.role == Role::Admin,
    }
}

fn approved_organizer(actor: &AuthUser) -> bool {
    actor.role == Role::Organizer && actor.organizer_status == OrganizerStatus::Approved
}
