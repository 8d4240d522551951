use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;

use crate::{
    AppState,
    access::{Action, Resource, authorize, can_view_post, event_in_api_scope},
    auth::{self, Identity},
    error::{AppError, AppResult},
    filters::{
        API_PAGE_SIZE, EventParams, EventQuery, FEATURED_EVENTS_LIMIT, FEATURED_POSTS_LIMIT,
        Page, PageParams, Pagination, PostParams, PostQuery, UPCOMING_EVENTS_LIMIT,
    },
    models::{
        Category, ContactMessage, ContactMessageInput, Event, EventInput, EventPatch,
        EventSummary, LoginRequest, MessageResponse, Post, PostInput, PostPatch, PostSummary,
        Tag, TokenResponse, ViewsResponse,
    },
};

// --- Posts ---

/// list_posts
///
/// Paginated post listing (10 per page). Anonymous callers and readers only
/// see published posts whose publication date has passed.
#[utoipa::path(
    get,
    path = "/api/posts",
    params(PostParams),
    responses(
        (status = 200, description = "Posts page", body = Page<PostSummary>),
        (status = 400, description = "Invalid facet value")
    )
)]
pub async fn list_posts(
    identity: Identity,
    State(state): State<AppState>,
    Query(params): Query<PostParams>,
) -> AppResult<Json<Page<PostSummary>>> {
    let query = PostQuery::from_params(&params, &identity, Utc::now())?;
    let page = Pagination::from_param(params.page.as_deref(), API_PAGE_SIZE);

    let posts = state.repo.list_posts(&query, page).await?;
    Ok(Json(posts.map(PostSummary::from)))
}

#[utoipa::path(
    get,
    path = "/api/posts/featured",
    responses((status = 200, description = "Up to 3 featured posts", body = [PostSummary]))
)]
pub async fn featured_posts(
    identity: Identity,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<PostSummary>>> {
    let query = PostQuery::scoped(&identity, Utc::now()).featured();
    let page = state
        .repo
        .list_posts(&query, Pagination::new(1, FEATURED_POSTS_LIMIT))
        .await?;
    Ok(Json(page.items.into_iter().map(PostSummary::from).collect()))
}

/// get_post
///
/// A post the caller is not allowed to see is reported as missing.
#[utoipa::path(
    get,
    path = "/api/posts/{id}",
    params(("id" = i64, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post", body = Post),
        (status = 404, description = "Not found or not visible")
    )
)]
pub async fn get_post(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Post>> {
    authorize(&identity, Resource::Post, Action::Read)?;

    let post = state
        .repo
        .get_post(id)
        .await?
        .filter(|post| can_view_post(&identity, post, Utc::now()))
        .ok_or(AppError::NotFound("Post"))?;
    Ok(Json(post))
}

/// create_post
///
/// [Admin] The caller becomes the author.
#[utoipa::path(
    post,
    path = "/api/posts",
    request_body = PostInput,
    responses(
        (status = 201, description = "Created", body = Post),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Not an admin"),
        (status = 409, description = "Slug already taken")
    )
)]
pub async fn create_post(
    identity: Identity,
    State(state): State<AppState>,
    Json(payload): Json<PostInput>,
) -> AppResult<(StatusCode, Json<Post>)> {
    authorize(&identity, Resource::Post, Action::Create)?;
    let author = identity.require_user()?;

    let post = state.repo.create_post(author.id, payload).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

#[utoipa::path(
    put,
    path = "/api/posts/{id}",
    params(("id" = i64, Path, description = "Post id")),
    request_body = PostInput,
    responses(
        (status = 200, description = "Replaced", body = Post),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Not found")
    )
)]
pub async fn replace_post(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<PostInput>,
) -> AppResult<Json<Post>> {
    authorize(&identity, Resource::Post, Action::Update)?;

    let post = state
        .repo
        .update_post(id, PostPatch::from(payload))
        .await?
        .ok_or(AppError::NotFound("Post"))?;
    Ok(Json(post))
}

#[utoipa::path(
    patch,
    path = "/api/posts/{id}",
    params(("id" = i64, Path, description = "Post id")),
    request_body = PostPatch,
    responses(
        (status = 200, description = "Updated", body = Post),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Not found")
    )
)]
pub async fn patch_post(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<PostPatch>,
) -> AppResult<Json<Post>> {
    authorize(&identity, Resource::Post, Action::Update)?;

    let post = state
        .repo
        .update_post(id, payload)
        .await?
        .ok_or(AppError::NotFound("Post"))?;
    Ok(Json(post))
}

#[utoipa::path(
    delete,
    path = "/api/posts/{id}",
    params(("id" = i64, Path, description = "Post id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_post(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    authorize(&identity, Resource::Post, Action::Delete)?;

    if state.repo.delete_post(id).await? {
        tracing::info!("post {} deleted", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("Post"))
    }
}

/// increment_post_views
///
/// Counts one view of a post the caller can see. No deduplication.
#[utoipa::path(
    post,
    path = "/api/posts/{id}/increment_views",
    params(("id" = i64, Path, description = "Post id")),
    responses(
        (status = 200, description = "New view count", body = ViewsResponse),
        (status = 404, description = "Not found or not visible")
    )
)]
pub async fn increment_post_views(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ViewsResponse>> {
    let visible = state
        .repo
        .get_post(id)
        .await?
        .is_some_and(|post| can_view_post(&identity, &post, Utc::now()));
    if !visible {
        return Err(AppError::NotFound("Post"));
    }

    let views = state
        .repo
        .increment_post_views(id)
        .await?
        .ok_or(AppError::NotFound("Post"))?;
    Ok(Json(ViewsResponse { views }))
}

// --- Events ---

/// list_events
///
/// Paginated event listing in start order. Non-admins only see public
/// events that have not started.
#[utoipa::path(
    get,
    path = "/api/events",
    params(EventParams),
    responses(
        (status = 200, description = "Events page", body = Page<EventSummary>),
        (status = 400, description = "Invalid facet value")
    )
)]
pub async fn list_events(
    identity: Identity,
    State(state): State<AppState>,
    Query(params): Query<EventParams>,
) -> AppResult<Json<Page<EventSummary>>> {
    let query = EventQuery::from_params(&params, &identity, Utc::now())?;
    let page = Pagination::from_param(params.page.as_deref(), API_PAGE_SIZE);

    let events = state.repo.list_events(&query, page).await?;
    Ok(Json(events.map(EventSummary::from)))
}

#[utoipa::path(
    get,
    path = "/api/events/featured",
    responses((status = 200, description = "Up to 2 featured events", body = [EventSummary]))
)]
pub async fn featured_events(
    identity: Identity,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<EventSummary>>> {
    let query = EventQuery::scoped(&identity, Utc::now()).featured();
    let page = state
        .repo
        .list_events(&query, Pagination::new(1, FEATURED_EVENTS_LIMIT))
        .await?;
    Ok(Json(page.items.into_iter().map(EventSummary::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/events/upcoming",
    responses((status = 200, description = "Next 5 events", body = [EventSummary]))
)]
pub async fn upcoming_events(
    identity: Identity,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<EventSummary>>> {
    let now = Utc::now();
    let query = EventQuery::scoped(&identity, now).upcoming(now);
    let page = state
        .repo
        .list_events(&query, Pagination::new(1, UPCOMING_EVENTS_LIMIT))
        .await?;
    Ok(Json(page.items.into_iter().map(EventSummary::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/events/{id}",
    params(("id" = i64, Path, description = "Event id")),
    responses(
        (status = 200, description = "Event", body = Event),
        (status = 404, description = "Not found or not visible")
    )
)]
pub async fn get_event(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Event>> {
    authorize(&identity, Resource::Event, Action::Read)?;

    let event = state
        .repo
        .get_event(id)
        .await?
        .filter(|event| event_in_api_scope(&identity, event, Utc::now()))
        .ok_or(AppError::NotFound("Evento"))?;
    Ok(Json(event))
}

#[utoipa::path(
    post,
    path = "/api/events",
    request_body = EventInput,
    responses(
        (status = 201, description = "Created", body = Event),
        (status = 400, description = "Validation failed (e.g. end before start)"),
        (status = 403, description = "Not an admin"),
        (status = 409, description = "Slug already taken")
    )
)]
pub async fn create_event(
    identity: Identity,
    State(state): State<AppState>,
    Json(payload): Json<EventInput>,
) -> AppResult<(StatusCode, Json<Event>)> {
    authorize(&identity, Resource::Event, Action::Create)?;

    let event = state.repo.create_event(payload).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

#[utoipa::path(
    put,
    path = "/api/events/{id}",
    params(("id" = i64, Path, description = "Event id")),
    request_body = EventInput,
    responses(
        (status = 200, description = "Replaced", body = Event),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Not found")
    )
)]
pub async fn replace_event(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<EventInput>,
) -> AppResult<Json<Event>> {
    authorize(&identity, Resource::Event, Action::Update)?;

    let event = state
        .repo
        .update_event(id, EventPatch::from(payload))
        .await?
        .ok_or(AppError::NotFound("Evento"))?;
    Ok(Json(event))
}

/// patch_event
///
/// [Admin] Partial update. Date ordering is validated against the merged row.
#[utoipa::path(
    patch,
    path = "/api/events/{id}",
    params(("id" = i64, Path, description = "Event id")),
    request_body = EventPatch,
    responses(
        (status = 200, description = "Updated", body = Event),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Not found")
    )
)]
pub async fn patch_event(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<EventPatch>,
) -> AppResult<Json<Event>> {
    authorize(&identity, Resource::Event, Action::Update)?;

    let event = state
        .repo
        .update_event(id, payload)
        .await?
        .ok_or(AppError::NotFound("Evento"))?;
    Ok(Json(event))
}

#[utoipa::path(
    delete,
    path = "/api/events/{id}",
    params(("id" = i64, Path, description = "Event id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_event(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    authorize(&identity, Resource::Event, Action::Delete)?;

    if state.repo.delete_event(id).await? {
        tracing::info!("event {} deleted", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("Evento"))
    }
}

/// register_event
///
/// [Authenticated] JSON twin of `POST /evento/{slug}/inscrever`.
#[utoipa::path(
    post,
    path = "/api/events/{id}/register",
    params(("id" = i64, Path, description = "Event id")),
    responses(
        (status = 200, description = "Registered; returns the updated event", body = Event),
        (status = 400, description = "Event does not take registrations"),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Event is full")
    )
)]
pub async fn register_event(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Event>> {
    authorize(&identity, Resource::Registration, Action::Create)?;
    let user = identity.require_user()?;

    let visible = state
        .repo
        .get_event(id)
        .await?
        .is_some_and(|event| event_in_api_scope(&identity, &event, Utc::now()));
    if !visible {
        return Err(AppError::NotFound("Evento"));
    }

    let event = state.repo.register_for_event(id, user.id).await?;
    Ok(Json(event))
}

// --- Categories & Tags (read-only) ---

#[utoipa::path(
    get,
    path = "/api/categories",
    responses((status = 200, description = "All categories", body = [Category]))
)]
pub async fn list_categories(State(state): State<AppState>) -> AppResult<Json<Vec<Category>>> {
    Ok(Json(state.repo.list_categories().await?))
}

#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    params(("id" = i64, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category", body = Category),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Category>> {
    let category = state
        .repo
        .get_category(id)
        .await?
        .ok_or(AppError::NotFound("Categoria"))?;
    Ok(Json(category))
}

#[utoipa::path(
    get,
    path = "/api/tags",
    responses((status = 200, description = "All tags", body = [Tag]))
)]
pub async fn list_tags(State(state): State<AppState>) -> AppResult<Json<Vec<Tag>>> {
    Ok(Json(state.repo.list_tags().await?))
}

#[utoipa::path(
    get,
    path = "/api/tags/{id}",
    params(("id" = i64, Path, description = "Tag id")),
    responses(
        (status = 200, description = "Tag", body = Tag),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_tag(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<Tag>> {
    let tag = state
        .repo
        .get_tag(id)
        .await?
        .ok_or(AppError::NotFound("Tag"))?;
    Ok(Json(tag))
}

// --- Contact Messages ---

/// create_contact_message
///
/// Open to anyone. The stored message is not echoed back.
#[utoipa::path(
    post,
    path = "/api/contact-messages",
    request_body = ContactMessageInput,
    responses(
        (status = 201, description = "Stored", body = MessageResponse),
        (status = 400, description = "Validation failed")
    )
)]
pub async fn create_contact_message(
    identity: Identity,
    State(state): State<AppState>,
    Json(payload): Json<ContactMessageInput>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    authorize(&identity, Resource::ContactMessage, Action::Create)?;

    state.repo.create_message(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Mensagem enviada com sucesso!".to_string(),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/contact-messages",
    params(PageParams),
    responses(
        (status = 200, description = "Messages, newest first", body = Page<ContactMessage>),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn list_contact_messages(
    identity: Identity,
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> AppResult<Json<Page<ContactMessage>>> {
    authorize(&identity, Resource::ContactMessage, Action::Read)?;

    let page = Pagination::from_param(params.page.as_deref(), API_PAGE_SIZE);
    Ok(Json(state.repo.list_messages(page).await?))
}

#[utoipa::path(
    get,
    path = "/api/contact-messages/{id}",
    params(("id" = i64, Path, description = "Message id")),
    responses(
        (status = 200, description = "Message", body = ContactMessage),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_contact_message(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ContactMessage>> {
    authorize(&identity, Resource::ContactMessage, Action::Read)?;

    let message = state
        .repo
        .get_message(id)
        .await?
        .ok_or(AppError::NotFound("Mensagem"))?;
    Ok(Json(message))
}

#[utoipa::path(
    delete,
    path = "/api/contact-messages/{id}",
    params(("id" = i64, Path, description = "Message id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_contact_message(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    authorize(&identity, Resource::ContactMessage, Action::Delete)?;

    if state.repo.delete_message(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("Mensagem"))
    }
}

/// mark_contact_message_read
///
/// [Admin] Idempotent: an already-read message stays read and the call succeeds.
#[utoipa::path(
    post,
    path = "/api/contact-messages/{id}/mark_read",
    params(("id" = i64, Path, description = "Message id")),
    responses(
        (status = 200, description = "Message marked read", body = ContactMessage),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Not found")
    )
)]
pub async fn mark_contact_message_read(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ContactMessage>> {
    authorize(&identity, Resource::ContactMessage, Action::MarkRead)?;

    let message = state
        .repo
        .mark_message_read(id)
        .await?
        .ok_or(AppError::NotFound("Mensagem"))?;
    Ok(Json(message))
}

// --- Auth ---

/// issue_token
///
/// Exchanges a username/password for the bearer token accepted by every
/// API route (the same token the web login keeps in the `session` cookie).
#[utoipa::path(
    post,
    path = "/api/auth/token",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Invalid credentials")
    )
)]
pub async fn issue_token(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let user = auth::authenticate(&state.repo, &payload.username, &payload.password).await?;
    let (access_token, expires_in) = auth::issue_token(user.id, &state.config)?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in,
        user,
    }))
}
