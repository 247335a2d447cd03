use axum::{
    Router,
    routing::{get, post, put},
};

pub mod events;
pub mod registrations;
pub mod system;
pub mod users;

/// Endpoints open to anonymous callers.
pub fn public_router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/signup", post(users::signup))
        .route("/login", post(users::login))
        .route("/events", get(events::list_events))
        .route("/events/:id", get(events::get_event))
}

/// Endpoints that act as the authenticated caller.
pub fn protected_router() -> Router {
    Router::new()
        .route("/events", post(events::create_event))
        .route(
            "/events/:id",
            put(events::update_event)
                .patch(events::patch_event)
                .delete(events::delete_event),
        )
        .route(
            "/events/:id/register",
            post(registrations::register).delete(registrations::cancel),
        )
}
