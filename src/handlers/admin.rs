use axum::{
    Json,
    extract::{Path, Query, State},
    response::Response,
};
use chrono::Utc;
use serde_json::{Value, json};

use crate::{
    AppState,
    access::{Action, Resource, authorize},
    auth::Identity,
    error::{AppError, AppResult},
    filters::{
        ADMIN_PAGE_SIZE, EventOrder, EventParams, EventQuery, PageParams, Pagination, PostOrder,
        PostParams, PostQuery, facet,
    },
    flash::{Flash, IncomingFlash, OrBack, WebError, WebForm, WebIdentity, WebPage, redirect_with},
    forms::{EventForm, NameForm, PostForm},
    models::{
        AdminEventForm, AdminEventList, AdminPostForm, AdminPostList, CategoriesPage,
        CategoryInput, ContactMessage, DashboardStats, EventPatch, MessagesPage, PostPatch,
        PresignedUrlRequest, PresignedUrlResponse, TagInput, TagsPage,
    },
    storage,
};

type PageResult<T> = Result<WebPage<T>, WebError>;

/// dashboard
///
/// Counters for posts, events, users and unread messages, plus the latest entries.
pub async fn dashboard(
    WebIdentity(identity): WebIdentity,
    flash: IncomingFlash,
    State(state): State<AppState>,
) -> PageResult<DashboardStats> {
    authorize(&identity, Resource::Dashboard, Action::Read).or_back("/")?;
    let stats = state.repo.get_stats().await.or_back("/")?;
    Ok(WebPage::new(flash, stats))
}

// --- Posts ---

pub async fn posts_list(
    WebIdentity(identity): WebIdentity,
    flash: IncomingFlash,
    State(state): State<AppState>,
    Query(params): Query<PostParams>,
) -> PageResult<AdminPostList> {
    authorize(&identity, Resource::Post, Action::Update).or_back("/admin/dashboard")?;

    let query = PostQuery::from_params(&params, &identity, Utc::now())
        .or_back("/admin/posts")?
        .ordered_by(PostOrder::CreatedDesc);
    let page = Pagination::from_param(params.page.as_deref(), ADMIN_PAGE_SIZE);
    let posts = state.repo.list_posts(&query, page).await.or_back("/admin/dashboard")?;

    Ok(WebPage::new(
        flash,
        AdminPostList {
            posts,
            search: facet(params.search.as_deref()),
            status: facet(params.status.as_deref()),
        },
    ))
}

async fn post_form(state: &AppState, id: Option<i64>) -> AppResult<AdminPostForm> {
    let post = match id {
        Some(id) => Some(state.repo.get_post(id).await?.ok_or(AppError::NotFound("Post"))?),
        None => None,
    };
    Ok(AdminPostForm {
        post,
        categories: state.repo.list_categories().await?,
        tags: state.repo.list_tags().await?,
    })
}

pub async fn post_new(
    WebIdentity(identity): WebIdentity,
    flash: IncomingFlash,
    State(state): State<AppState>,
) -> PageResult<AdminPostForm> {
    authorize(&identity, Resource::Post, Action::Create).or_back("/admin/posts")?;
    let form = post_form(&state, None).await.or_back("/admin/posts")?;
    Ok(WebPage::new(flash, form))
}

pub async fn post_edit_page(
    WebIdentity(identity): WebIdentity,
    flash: IncomingFlash,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> PageResult<AdminPostForm> {
    authorize(&identity, Resource::Post, Action::Update).or_back("/admin/posts")?;
    let form = post_form(&state, Some(id)).await.or_back("/admin/posts")?;
    Ok(WebPage::new(flash, form))
}

pub async fn post_create(
    WebIdentity(identity): WebIdentity,
    State(state): State<AppState>,
    WebForm(form): WebForm<PostForm>,
) -> Result<Response, WebError> {
    let back = "/admin/posts/new";
    authorize(&identity, Resource::Post, Action::Create).or_back(back)?;
    let author = identity.require_user().or_back(back)?;

    let input = form.into_input().or_back(back)?;
    state.repo.create_post(author.id, input).await.or_back(back)?;

    Ok(redirect_with("/admin/posts", Flash::success("Post criado com sucesso!")))
}

/// post_update
///
/// The edit form always carries every field, so it replaces the post.
pub async fn post_update(
    WebIdentity(identity): WebIdentity,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    WebForm(form): WebForm<PostForm>,
) -> Result<Response, WebError> {
    let back = format!("/admin/posts/{id}");
    authorize(&identity, Resource::Post, Action::Update).or_back(&back)?;

    let input = form.into_input().or_back(&back)?;
    state
        .repo
        .update_post(id, PostPatch::from(input))
        .await
        .or_back(&back)?
        .ok_or(AppError::NotFound("Post"))
        .or_back(&back)?;

    Ok(redirect_with("/admin/posts", Flash::success("Post atualizado com sucesso!")))
}

pub async fn post_delete(
    WebIdentity(identity): WebIdentity,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, WebError> {
    authorize(&identity, Resource::Post, Action::Delete).or_back("/admin/posts")?;

    if !state.repo.delete_post(id).await.or_back("/admin/posts")? {
        return Err(WebError::new(AppError::NotFound("Post"), "/admin/posts"));
    }
    Ok(redirect_with("/admin/posts", Flash::success("Post excluído com sucesso!")))
}

// --- Events ---

pub async fn events_list(
    WebIdentity(identity): WebIdentity,
    flash: IncomingFlash,
    State(state): State<AppState>,
    Query(params): Query<EventParams>,
) -> PageResult<AdminEventList> {
    authorize(&identity, Resource::Event, Action::Update).or_back("/admin/dashboard")?;

    let query = EventQuery::from_params(&params, &identity, Utc::now())
        .or_back("/admin/events")?
        .ordered_by(EventOrder::CreatedDesc);
    let page = Pagination::from_param(params.page.as_deref(), ADMIN_PAGE_SIZE);
    let events = state.repo.list_events(&query, page).await.or_back("/admin/dashboard")?;

    Ok(WebPage::new(
        flash,
        AdminEventList {
            events,
            search: facet(params.search.as_deref()),
            visibility: facet(params.visibility.as_deref()),
            status: facet(params.status.as_deref()),
        },
    ))
}

async fn event_form(state: &AppState, id: Option<i64>) -> AppResult<AdminEventForm> {
    let event = match id {
        Some(id) => Some(
            state
                .repo
                .get_event(id)
                .await?
                .ok_or(AppError::NotFound("Evento"))?,
        ),
        None => None,
    };
    Ok(AdminEventForm {
        event,
        tags: state.repo.list_tags().await?,
    })
}

pub async fn event_new(
    WebIdentity(identity): WebIdentity,
    flash: IncomingFlash,
    State(state): State<AppState>,
) -> PageResult<AdminEventForm> {
    authorize(&identity, Resource::Event, Action::Create).or_back("/admin/events")?;
    let form = event_form(&state, None).await.or_back("/admin/events")?;
    Ok(WebPage::new(flash, form))
}

pub async fn event_edit_page(
    WebIdentity(identity): WebIdentity,
    flash: IncomingFlash,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> PageResult<AdminEventForm> {
    authorize(&identity, Resource::Event, Action::Update).or_back("/admin/events")?;
    let form = event_form(&state, Some(id)).await.or_back("/admin/events")?;
    Ok(WebPage::new(flash, form))
}

pub async fn event_create(
    WebIdentity(identity): WebIdentity,
    State(state): State<AppState>,
    WebForm(form): WebForm<EventForm>,
) -> Result<Response, WebError> {
    let back = "/admin/events/new";
    authorize(&identity, Resource::Event, Action::Create).or_back(back)?;

    let input = form.into_input().or_back(back)?;
    state.repo.create_event(input).await.or_back(back)?;

    Ok(redirect_with("/admin/events", Flash::success("Evento criado com sucesso!")))
}

pub async fn event_update(
    WebIdentity(identity): WebIdentity,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    WebForm(form): WebForm<EventForm>,
) -> Result<Response, WebError> {
    let back = format!("/admin/events/{id}");
    authorize(&identity, Resource::Event, Action::Update).or_back(&back)?;

    let input = form.into_input().or_back(&back)?;
    state
        .repo
        .update_event(id, EventPatch::from(input))
        .await
        .or_back(&back)?
        .ok_or(AppError::NotFound("Evento"))
        .or_back(&back)?;

    Ok(redirect_with("/admin/events", Flash::success("Evento atualizado com sucesso!")))
}

pub async fn event_delete(
    WebIdentity(identity): WebIdentity,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, WebError> {
    authorize(&identity, Resource::Event, Action::Delete).or_back("/admin/events")?;

    if !state.repo.delete_event(id).await.or_back("/admin/events")? {
        return Err(WebError::new(AppError::NotFound("Evento"), "/admin/events"));
    }
    Ok(redirect_with("/admin/events", Flash::success("Evento excluído com sucesso!")))
}

// --- Messages ---

pub async fn messages_list(
    WebIdentity(identity): WebIdentity,
    flash: IncomingFlash,
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> PageResult<MessagesPage> {
    authorize(&identity, Resource::ContactMessage, Action::Read).or_back("/admin/dashboard")?;

    let page = Pagination::from_param(params.page.as_deref(), ADMIN_PAGE_SIZE);
    let messages = state.repo.list_messages(page).await.or_back("/admin/dashboard")?;
    let unread_count = state
        .repo
        .count_unread_messages()
        .await
        .or_back("/admin/dashboard")?;

    Ok(WebPage::new(
        flash,
        MessagesPage {
            messages,
            unread_count,
        },
    ))
}

/// message_detail
///
/// Opening a message marks it read.
pub async fn message_detail(
    WebIdentity(identity): WebIdentity,
    flash: IncomingFlash,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> PageResult<ContactMessage> {
    authorize(&identity, Resource::ContactMessage, Action::MarkRead).or_back("/admin/messages")?;

    let message = state
        .repo
        .mark_message_read(id)
        .await
        .or_back("/admin/messages")?
        .ok_or(AppError::NotFound("Mensagem"))
        .or_back("/admin/messages")?;
    Ok(WebPage::new(flash, message))
}

/// message_mark_read
///
/// Called by the messages page script; answers `{"status": "success"}`.
#[utoipa::path(
    post,
    path = "/admin/messages/{id}/read",
    params(("id" = i64, Path, description = "Message id")),
    responses(
        (status = 200, description = "Marked read"),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Not found")
    )
)]
pub async fn message_mark_read(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    authorize(&identity, Resource::ContactMessage, Action::MarkRead)?;

    state
        .repo
        .mark_message_read(id)
        .await?
        .ok_or(AppError::NotFound("Mensagem"))?;
    Ok(Json(json!({ "status": "success" })))
}

// --- Categories & Tags ---

pub async fn categories_list(
    WebIdentity(identity): WebIdentity,
    flash: IncomingFlash,
    State(state): State<AppState>,
) -> PageResult<CategoriesPage> {
    authorize(&identity, Resource::Category, Action::Create).or_back("/admin/dashboard")?;
    let categories = state.repo.list_categories().await.or_back("/admin/dashboard")?;
    Ok(WebPage::new(flash, CategoriesPage { categories }))
}

pub async fn category_create(
    WebIdentity(identity): WebIdentity,
    State(state): State<AppState>,
    WebForm(form): WebForm<NameForm>,
) -> Result<Response, WebError> {
    let back = "/admin/categories";
    authorize(&identity, Resource::Category, Action::Create).or_back(back)?;

    let category = state
        .repo
        .create_category(CategoryInput::from(form))
        .await
        .or_back(back)?;
    Ok(redirect_with(
        back,
        Flash::success(format!("Categoria '{}' criada com sucesso!", category.name)),
    ))
}

pub async fn category_delete(
    WebIdentity(identity): WebIdentity,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, WebError> {
    let back = "/admin/categories";
    authorize(&identity, Resource::Category, Action::Delete).or_back(back)?;

    if !state.repo.delete_category(id).await.or_back(back)? {
        return Err(WebError::new(AppError::NotFound("Categoria"), back));
    }
    Ok(redirect_with(back, Flash::success("Categoria excluída com sucesso!")))
}

pub async fn tags_list(
    WebIdentity(identity): WebIdentity,
    flash: IncomingFlash,
    State(state): State<AppState>,
) -> PageResult<TagsPage> {
    authorize(&identity, Resource::Tag, Action::Create).or_back("/admin/dashboard")?;
    let tags = state.repo.list_tags().await.or_back("/admin/dashboard")?;
    Ok(WebPage::new(flash, TagsPage { tags }))
}

pub async fn tag_create(
    WebIdentity(identity): WebIdentity,
    State(state): State<AppState>,
    WebForm(form): WebForm<NameForm>,
) -> Result<Response, WebError> {
    let back = "/admin/tags";
    authorize(&identity, Resource::Tag, Action::Create).or_back(back)?;

    let tag = state
        .repo
        .create_tag(TagInput::from(form))
        .await
        .or_back(back)?;
    Ok(redirect_with(
        back,
        Flash::success(format!("Tag '{}' criada com sucesso!", tag.name)),
    ))
}

pub async fn tag_delete(
    WebIdentity(identity): WebIdentity,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, WebError> {
    let back = "/admin/tags";
    authorize(&identity, Resource::Tag, Action::Delete).or_back(back)?;

    if !state.repo.delete_tag(id).await.or_back(back)? {
        return Err(WebError::new(AppError::NotFound("Tag"), back));
    }
    Ok(redirect_with(back, Flash::success("Tag excluída com sucesso!")))
}

// --- Uploads ---

/// get_presigned_url
///
/// [Admin] Returns a 10-minute PUT URL for a post or event image. The
/// `resource_key` goes into the `image` field of the post/event form.
#[utoipa::path(
    post,
    path = "/admin/uploads/presigned",
    request_body = PresignedUrlRequest,
    responses(
        (status = 200, description = "Upload URL", body = PresignedUrlResponse),
        (status = 400, description = "Unknown target or not an image"),
        (status = 403, description = "Not an admin"),
        (status = 500, description = "Storage failure")
    )
)]
pub async fn get_presigned_url(
    identity: Identity,
    State(state): State<AppState>,
    Json(payload): Json<PresignedUrlRequest>,
) -> AppResult<Json<PresignedUrlResponse>> {
    authorize(&identity, Resource::Upload, Action::Create)?;

    let key = storage::image_key(&payload.target, &payload.filename, &payload.file_type)?;
    let upload_url = state
        .storage
        .get_presigned_upload_url(&key, &payload.file_type)
        .await?;

    Ok(Json(PresignedUrlResponse {
        upload_url,
        resource_key: key,
    }))
}
