use crate::{
    AppState,
    handlers::web,
};
use axum::{
    Router,
    routing::get,
};

/// Public Router Module
///
/// Site pages open to any visitor. Listings only ever show published posts
/// and public upcoming events to non-admins; the scoping happens in the
/// query builders, not here.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        .route("/", get(web::home))
        .route("/sobre", get(web::about))
        .route("/projetos", get(web::projects))
        // GET /blog?search=&category=&page=
        .route("/blog", get(web::blog))
        // GET /blog/{slug}
        // Counts one view per successful read.
        .route("/blog/{slug}", get(web::blog_post))
        // GET /projetos/eventos?category=&type=&page=
        .route("/projetos/eventos", get(web::events))
        .route("/evento/{slug}", get(web::event_detail))
        .route("/contato", get(web::contact_page).post(web::contact_submit))
}
