use crate::{
    AppState,
    handlers::{account, web},
};
use axum::{
    Router,
    routing::{get, post},
};

/// Account Router Module
///
/// Sign-in, sign-up and the pages that need a session. Handlers resolve the
/// caller through the `Identity` extractor and send anonymous visitors to
/// `/auth/login` with a flash instead of failing with a bare 401.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET/POST /auth/login
        // Sets the `session` cookie; admins land on the dashboard.
        .route(
            "/auth/login",
            get(account::login_page).post(account::login_submit),
        )
        .route("/auth/logout", get(account::logout))
        // GET/POST /auth/register
        // Public sign-up, always creates a reader.
        .route(
            "/auth/register",
            get(account::register_page).post(account::register_submit),
        )
        .route("/auth/profile", get(account::profile))
        // POST /evento/{slug}/inscrever
        // Takes one seat on the event for the signed-in user.
        .route("/evento/{slug}/inscrever", post(web::event_register))
}
