use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Domain core: roles and capability checks, filters, lifecycle rules.
pub mod access;
pub mod error;
pub mod filters;
pub mod lifecycle;
pub mod models;
pub mod slug;

// Infrastructure: persistence, storage, configuration, identity.
pub mod auth;
pub mod config;
pub mod repository;
pub mod storage;

// HTTP adapters.
pub mod flash;
pub mod forms;
pub mod handlers;
pub mod routes;
use handlers::{admin as admin_handlers, api};
use routes::{admin, api as api_router, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use repository::{PostgresRepository, Repository, RepositoryState};
pub use storage::{MockStorageService, S3StorageClient, StorageState};

/// ApiDoc
///
/// OpenAPI document for the JSON endpoints, served at `/api-docs/openapi.json`.
/// Page contexts of the web routes are not part of it.
#[derive(OpenApi)]
#[openapi(
    paths(
        api::list_posts, api::featured_posts, api::get_post, api::create_post,
        api::replace_post, api::patch_post, api::delete_post, api::increment_post_views,
        api::list_events, api::featured_events, api::upcoming_events, api::get_event,
        api::create_event, api::replace_event, api::patch_event, api::delete_event,
        api::register_event,
        api::list_categories, api::get_category, api::list_tags, api::get_tag,
        api::create_contact_message, api::list_contact_messages, api::get_contact_message,
        api::delete_contact_message, api::mark_contact_message_read,
        api::issue_token,
        admin_handlers::message_mark_read, admin_handlers::get_presigned_url,
    ),
    components(
        schemas(
            models::Role, models::PostStatus, models::Visibility, models::EventType,
            models::EventStatus, models::User, models::Category, models::Tag, models::Author,
            models::CategorySummary, models::Post, models::PostSummary, models::Event,
            models::EventSummary, models::ContactMessage, models::PostInput, models::PostPatch,
            models::EventInput, models::EventPatch, models::ContactMessageInput,
            models::LoginRequest, models::TokenResponse, models::PresignedUrlRequest,
            models::PresignedUrlResponse, models::ViewsResponse, models::MessageResponse,
        )
    ),
    tags(
        (name = "neabi-portal", description = "NEABI outreach portal API")
    )
)]
pub struct ApiDoc;

/// AppState
///
/// Shared by every request: the repository, the object storage client and
/// the immutable configuration.
#[derive(Clone)]
pub struct AppState {
    pub repo: RepositoryState,
    pub storage: StorageState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the site, the account pages, the gated back-office and the
/// JSON API, then wraps everything in the request-id and tracing layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(authenticated::authenticated_routes())
        // Admin pages: anonymous and non-admin callers are redirected before
        // any handler runs.
        .nest(
            "/admin",
            admin::admin_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                access::admin_gate,
            )),
        )
        .nest("/api", api_router::api_routes())
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for every request, tagged with the `x-request-id` set by
/// `SetRequestIdLayer` so all log lines of one request correlate.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
