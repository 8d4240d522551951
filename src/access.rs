use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};

use crate::{
    AppState,
    auth::{Identity, resolve_user},
    error::{AppError, AppResult},
    flash::{Flash, redirect_with},
    models::{Event, Post, Visibility},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Post,
    Event,
    Category,
    Tag,
    ContactMessage,
    Registration,
    Profile,
    Dashboard,
    Upload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
    MarkRead,
}

/// authorize
///
/// The single capability check, called at every mutation entry point and
/// at every admin-only read.
///
/// | caller    | allowed                                                      |
/// |-----------|--------------------------------------------------------------|
/// | anonymous | read posts/events/categories/tags, create contact messages   |
/// | reader    | the above, plus event registration and reading own profile   |
/// | admin     | everything                                                   |
///
/// An anonymous caller asking for a signed-in action gets `Unauthenticated`;
/// everything else that is refused is `PermissionDenied`.
pub fn authorize(identity: &Identity, resource: Resource, action: Action) -> AppResult<()> {
    use Action::*;
    use Resource::*;

    match (resource, action) {
        (Post | Event | Category | Tag, Read) => Ok(()),
        (ContactMessage, Create) => Ok(()),
        (Registration, Create) | (Profile, Read) => identity.require_user().map(|_| ()),
        _ if identity.is_admin() => Ok(()),
        _ => {
            tracing::warn!(
                "access denied: {:?} {:?} by {}",
                action,
                resource,
                identity
                    .user()
                    .map(|u| u.username.as_str())
                    .unwrap_or("anonymous")
            );
            Err(AppError::PermissionDenied)
        }
    }
}

/// Detail-read rule for a single post: admins see everything, others only
/// what is published as of `now`.
pub fn can_view_post(identity: &Identity, post: &Post, now: DateTime<Utc>) -> bool {
    identity.is_admin() || post.is_published_at(now)
}

/// Detail-read rule for a single event page. Past public events stay reachable by slug.
pub fn can_view_event(identity: &Identity, event: &Event) -> bool {
    identity.is_admin() || event.visibility == Visibility::Public
}

/// REST detail reads and every registration (API or web form) use the
/// listing scope: non-admins only reach public events that have not started.
pub fn event_in_api_scope(identity: &Identity, event: &Event, now: DateTime<Utc>) -> bool {
    identity.is_admin() || event.is_public_and_upcoming_at(now)
}

/// admin_gate
///
/// Route layer for the `/admin` web back-office. Anonymous callers are sent
/// to the login page, signed-in non-admins to the home page, both with a flash.
pub async fn admin_gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let identity: Identity = match resolve_user(request.headers(), &state.repo, &state.config).await {
        Ok(user) => user.into(),
        Err(e) => {
            return redirect_with("/", Flash::error(e.public_message())).into_response();
        }
    };

    match authorize(&identity, Resource::Dashboard, Action::Read) {
        Ok(()) => next.run(request).await,
        Err(AppError::PermissionDenied) if identity.user().is_none() => redirect_with(
            "/auth/login",
            Flash::error(AppError::Unauthenticated.to_string()),
        )
        .into_response(),
        Err(e) => redirect_with("/", Flash::error(e.to_string())).into_response(),
    }
}
