use crate::{
    AppState,
    handlers::admin,
};
use axum::{
    Router,
    routing::{get, post},
};

/// Admin Router Module
///
/// The back-office, nested under `/admin`. The whole router sits behind
/// `access::admin_gate`, and every handler still runs `authorize` for its
/// own resource.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(admin::dashboard))
        // --- Posts ---
        .route("/posts", get(admin::posts_list).post(admin::post_create))
        .route("/posts/new", get(admin::post_new))
        .route("/posts/{id}", get(admin::post_edit_page))
        .route("/posts/{id}/edit", post(admin::post_update))
        .route("/posts/{id}/delete", post(admin::post_delete))
        // --- Events ---
        .route("/events", get(admin::events_list).post(admin::event_create))
        .route("/events/new", get(admin::event_new))
        .route("/events/{id}", get(admin::event_edit_page))
        .route("/events/{id}/edit", post(admin::event_update))
        .route("/events/{id}/delete", post(admin::event_delete))
        // --- Messages ---
        // GET /messages/{id} marks the message read.
        .route("/messages", get(admin::messages_list))
        .route("/messages/{id}", get(admin::message_detail))
        .route("/messages/{id}/read", post(admin::message_mark_read))
        // --- Taxonomy ---
        .route(
            "/categories",
            get(admin::categories_list).post(admin::category_create),
        )
        .route("/categories/{id}/delete", post(admin::category_delete))
        .route("/tags", get(admin::tags_list).post(admin::tag_create))
        .route("/tags/{id}/delete", post(admin::tag_delete))
        // POST /uploads/presigned
        // Short-lived PUT URL for a post or event image.
        .route("/uploads/presigned", post(admin::get_presigned_url))
}
