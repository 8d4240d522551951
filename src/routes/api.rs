use crate::{
    AppState,
    handlers::api,
};
use axum::{
    Router,
    routing::{get, post},
};

/// REST API Router Module
///
/// JSON endpoints, nested under `/api`. Reads are open (scoped by role),
/// writes are admin-only, with two exceptions: anyone may send a contact
/// message and any signed-in user may register for an event.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // --- Posts ---
        .route("/posts", get(api::list_posts).post(api::create_post))
        .route("/posts/featured", get(api::featured_posts))
        .route(
            "/posts/{id}",
            get(api::get_post)
                .put(api::replace_post)
                .patch(api::patch_post)
                .delete(api::delete_post),
        )
        .route("/posts/{id}/increment_views", post(api::increment_post_views))
        // --- Events ---
        .route("/events", get(api::list_events).post(api::create_event))
        .route("/events/featured", get(api::featured_events))
        .route("/events/upcoming", get(api::upcoming_events))
        .route(
            "/events/{id}",
            get(api::get_event)
                .put(api::replace_event)
                .patch(api::patch_event)
                .delete(api::delete_event),
        )
        // POST /events/{id}/register
        // Atomic seat reservation; 409 when full.
        .route("/events/{id}/register", post(api::register_event))
        // --- Taxonomy (read-only) ---
        .route("/categories", get(api::list_categories))
        .route("/categories/{id}", get(api::get_category))
        .route("/tags", get(api::list_tags))
        .route("/tags/{id}", get(api::get_tag))
        // --- Contact messages ---
        .route(
            "/contact-messages",
            get(api::list_contact_messages).post(api::create_contact_message),
        )
        .route(
            "/contact-messages/{id}",
            get(api::get_contact_message).delete(api::delete_contact_message),
        )
        .route(
            "/contact-messages/{id}/mark_read",
            post(api::mark_contact_message_read),
        )
        // POST /auth/token
        // Bearer token for API clients.
        .route("/auth/token", post(api::issue_token))
}
