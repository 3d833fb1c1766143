use axum::{
    routing::{get, post, put},
    Router,
};

use crate::config::{create_cors_layer, create_security_headers_layer};
use crate::handlers::{admin, analytics, events, health_check, organizer, tickets, users};
use crate::state::AppState;

pub fn create_routes(state: AppState) -> Router {
    let events = Router::new()
        .route("/", get(events::list_events).post(events::create_event))
        .route("/saved/my", get(events::my_saved_events))
        .route(
            "/:id",
            get(events::get_event)
                .put(events::update_event)
                .delete(events::delete_event),
        )
        .route(
            "/:id/save",
            post(events::save_event).delete(events::unsave_event),
        );

    let tickets = Router::new()
        .route("/claim", post(tickets::claim_ticket))
        .route("/my", get(tickets::my_tickets))
        .route("/validate", post(tickets::validate_ticket))
        .route("/:ticket_id", get(tickets::ticket_details))
        .route("/:ticket_id/use", post(tickets::use_ticket))
        .route("/:ticket_id/return", post(tickets::return_ticket));

    let organizer = Router::new()
        .route("/dashboard", get(organizer::dashboard))
        .route("/events", get(organizer::my_events))
        .route("/events/:id/analytics", get(organizer::event_analytics))
        .route("/events/:id/attendees", get(organizer::event_attendees));

    let admin = Router::new()
        .route("/events/pending", get(admin::pending_events))
        .route("/events/:id/approve", put(admin::approve_event))
        .route("/organizers", get(admin::list_organizers))
        .route("/organizers/:id/status", put(admin::review_organizer));

    let users = Router::new()
        .route(
            "/profile",
            get(users::get_profile).put(users::update_profile),
        )
        .route("/:id", get(users::get_user));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/events", events)
        .nest("/api/tickets", tickets)
        .nest("/api/organizer", organizer)
        .nest("/api/analytics", Router::new().route("/events", get(analytics::event_analytics)))
        .nest("/api/admin", admin)
        .nest("/api/users", users)
        .layer(create_security_headers_layer())
        .layer(create_cors_layer())
        .with_state(state)
}
