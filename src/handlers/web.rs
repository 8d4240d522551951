use axum::{
    extract::{Path, Query, State},
    response::Response,
};
use chrono::Utc;

use crate::{
    AppState,
    access::{Action, Resource, authorize, can_view_event, can_view_post, event_in_api_scope},
    error::AppError,
    filters::{
        BLOG_PAGE_SIZE, EVENTS_PAGE_SIZE, EventParams, EventQuery, FEATURED_EVENTS_LIMIT,
        FEATURED_POSTS_LIMIT, Pagination, PostParams, PostQuery, RECENT_POSTS_LIMIT, facet,
    },
    flash::{Flash, IncomingFlash, OrBack, WebError, WebForm, WebIdentity, WebPage, redirect_with},
    forms::ContactForm,
    lifecycle,
    models::{
        BlogPage, Choice, ContactMessageInput, EventPage, EventSummary, EventType, EventsPage,
        FormPage, HomePage, PostPage, PostSummary, StaticPage,
    },
};

type PageResult<T> = Result<WebPage<T>, WebError>;

/// home
///
/// Two featured events and the three most recent posts.
pub async fn home(
    WebIdentity(identity): WebIdentity,
    flash: IncomingFlash,
    State(state): State<AppState>,
) -> PageResult<HomePage> {
    let now = Utc::now();
    let events = state
        .repo
        .list_events(
            &EventQuery::scoped(&identity, now).featured(),
            Pagination::new(1, FEATURED_EVENTS_LIMIT),
        )
        .await
        .or_back("/")?;
    let posts = state
        .repo
        .list_posts(
            &PostQuery::scoped(&identity, now),
            Pagination::new(1, RECENT_POSTS_LIMIT),
        )
        .await
        .or_back("/")?;

    Ok(WebPage::new(
        flash,
        HomePage {
            featured_events: events.items.into_iter().map(EventSummary::from).collect(),
            recent_posts: posts.items.into_iter().map(PostSummary::from).collect(),
        },
    ))
}

pub async fn about(flash: IncomingFlash) -> WebPage<StaticPage> {
    WebPage::new(
        flash,
        StaticPage {
            slug: "sobre".to_string(),
            title: "Sobre o NEABI".to_string(),
        },
    )
}

pub async fn projects(flash: IncomingFlash) -> WebPage<StaticPage> {
    WebPage::new(
        flash,
        StaticPage {
            slug: "projetos".to_string(),
            title: "Projetos".to_string(),
        },
    )
}

/// blog
///
/// `?search=&category=&page=`, nine posts per page.
pub async fn blog(
    WebIdentity(identity): WebIdentity,
    flash: IncomingFlash,
    State(state): State<AppState>,
    Query(params): Query<PostParams>,
) -> PageResult<BlogPage> {
    let now = Utc::now();
    let query = PostQuery::from_params(&params, &identity, now).or_back("/")?;
    let page = Pagination::from_param(params.page.as_deref(), BLOG_PAGE_SIZE);

    let posts = state.repo.list_posts(&query, page).await.or_back("/")?;
    let featured = state
        .repo
        .list_posts(
            &PostQuery::scoped(&identity, now).featured(),
            Pagination::new(1, FEATURED_POSTS_LIMIT),
        )
        .await
        .or_back("/")?;
    let categories = state.repo.list_categories().await.or_back("/")?;

    Ok(WebPage::new(
        flash,
        BlogPage {
            posts: posts.map(PostSummary::from),
            categories,
            featured_posts: featured.items.into_iter().map(PostSummary::from).collect(),
            search: facet(params.search.as_deref()),
            category: facet(params.category.as_deref()),
        },
    ))
}

/// blog_post
///
/// Every successful read counts one view.
pub async fn blog_post(
    WebIdentity(identity): WebIdentity,
    flash: IncomingFlash,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> PageResult<PostPage> {
    let mut post = state
        .repo
        .get_post_by_slug(&slug)
        .await
        .or_back("/blog")?
        .filter(|post| can_view_post(&identity, post, Utc::now()))
        .ok_or(AppError::NotFound("Post"))
        .or_back("/blog")?;

    if let Some(views) = state.repo.increment_post_views(post.id).await.or_back("/blog")? {
        post.views = views;
    }

    Ok(WebPage::new(flash, PostPage { post }))
}

/// events
///
/// `?category=&type=&page=`, six events per page, soonest first.
pub async fn events(
    WebIdentity(identity): WebIdentity,
    flash: IncomingFlash,
    State(state): State<AppState>,
    Query(params): Query<EventParams>,
) -> PageResult<EventsPage> {
    let now = Utc::now();
    let query = EventQuery::from_params(&params, &identity, now).or_back("/")?;
    let page = Pagination::from_param(params.page.as_deref(), EVENTS_PAGE_SIZE);

    let events = state.repo.list_events(&query, page).await.or_back("/")?;
    let featured = state
        .repo
        .list_events(
            &EventQuery::scoped(&identity, now).featured(),
            Pagination::new(1, FEATURED_EVENTS_LIMIT),
        )
        .await
        .or_back("/")?;

    Ok(WebPage::new(
        flash,
        EventsPage {
            events: events.map(EventSummary::from),
            featured_events: featured.items.into_iter().map(EventSummary::from).collect(),
            event_types: EventType::ALL
                .iter()
                .map(|t| Choice {
                    value: t.as_str().to_string(),
                    label: t.label().to_string(),
                })
                .collect(),
            category: facet(params.category.as_deref()),
            event_type: facet(params.event_type.as_deref()),
        },
    ))
}

pub async fn event_detail(
    WebIdentity(identity): WebIdentity,
    flash: IncomingFlash,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> PageResult<EventPage> {
    let event = state
        .repo
        .get_event_by_slug(&slug)
        .await
        .or_back("/projetos/eventos")?
        .filter(|event| can_view_event(&identity, event))
        .ok_or(AppError::NotFound("Evento"))
        .or_back("/projetos/eventos")?;

    let can_register = lifecycle::check_registration(&event).is_ok();
    Ok(WebPage::new(flash, EventPage { event, can_register }))
}

/// event_register
///
/// [Login required] Takes one seat and returns to the event page with the outcome.
/// Only public events that have not started yet accept registrations.
pub async fn event_register(
    WebIdentity(identity): WebIdentity,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, WebError> {
    let back = format!("/evento/{slug}");
    authorize(&identity, Resource::Registration, Action::Create).or_back(&back)?;
    let user = identity.require_user().or_back(&back)?;

    let event = state
        .repo
        .get_event_by_slug(&slug)
        .await
        .or_back(&back)?
        .filter(|event| event_in_api_scope(&identity, event, Utc::now()))
        .ok_or(AppError::NotFound("Evento"))
        .or_back(&back)?;

    let event = state
        .repo
        .register_for_event(event.id, user.id)
        .await
        .or_back(&back)?;

    Ok(redirect_with(
        &back,
        Flash::success(format!(
            "Inscrição realizada com sucesso para o evento \"{}\"!",
            event.title
        )),
    ))
}

pub async fn contact_page(flash: IncomingFlash) -> WebPage<FormPage> {
    WebPage::new(
        flash,
        FormPage::new("contato", &["name", "email", "subject", "message"]),
    )
}

pub async fn contact_submit(
    WebIdentity(identity): WebIdentity,
    State(state): State<AppState>,
    WebForm(form): WebForm<ContactForm>,
) -> Result<Response, WebError> {
    authorize(&identity, Resource::ContactMessage, Action::Create).or_back("/contato")?;

    state
        .repo
        .create_message(ContactMessageInput::from(form))
        .await
        .or_back("/contato")?;

    Ok(redirect_with(
        "/contato",
        Flash::success("Mensagem enviada com sucesso! Entraremos em contato em breve."),
    ))
}
