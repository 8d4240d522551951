#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Request, StatusCode, header},
};
use chrono::{DateTime, Duration, Utc};
use neabi_portal::{
    AppConfig, AppState, MockStorageService, create_router,
    auth,
    error::{AppError, AppResult},
    filters::{EventOrder, EventQuery, Page, Pagination, PostOrder, PostQuery},
    lifecycle,
    models::{
        Author, Category, CategoryInput, CategorySummary, ContactMessage, ContactMessageInput,
        DashboardCounts, DashboardStats, Event, EventFields, EventInput, EventPatch, EventSummary,
        NewUser, Post, PostFields, PostInput, PostPatch, PostStatus, PostSummary, Role, Tag,
        TagInput, User, UserCredentials, Visibility,
    },
    repository::{Repository, RepositoryState},
    storage::StorageState,
};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

// --- In-Memory Repository ---

#[derive(Default)]
struct Store {
    users: Vec<UserCredentials>,
    categories: Vec<Category>,
    tags: Vec<Tag>,
    posts: Vec<(Post, Uuid)>,
    events: Vec<Event>,
    registrations: Vec<(i64, Uuid)>,
    messages: Vec<ContactMessage>,
    next_id: i64,
}

impl Store {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn tags_for(&self, ids: &[i64]) -> Vec<Tag> {
        self.tags
            .iter()
            .filter(|t| ids.contains(&t.id))
            .cloned()
            .collect()
    }
}

/// MemoryRepo
///
/// A `Repository` backed by vectors. Writes go through the same `lifecycle`
/// normalization as `PostgresRepository`, and listings honour `PostQuery` /
/// `EventQuery`, so handler tests see realistic behaviour without Postgres.
#[derive(Default)]
pub struct MemoryRepo {
    store: Mutex<Store>,
}

fn post_fields(post: &Post) -> PostFields {
    PostFields {
        title: post.title.clone(),
        slug: post.slug.clone(),
        content: post.content.clone(),
        excerpt: post.excerpt.clone(),
        image: post.image.clone(),
        status: post.status,
        publication_date: post.publication_date,
        category_id: post.category.id,
        featured: post.featured,
    }
}

fn event_fields(event: &Event) -> EventFields {
    EventFields {
        title: event.title.clone(),
        slug: event.slug.clone(),
        description: event.description.clone(),
        start_date: event.start_date,
        end_date: event.end_date,
        location: event.location.clone(),
        visibility: event.visibility,
        event_type: event.event_type,
        capacity: event.capacity,
        organizer: event.organizer.clone(),
        speakers: event.speakers.clone(),
        image: event.image.clone(),
        status: event.status,
        featured: event.featured,
        registration_required: event.registration_required,
        price: event.price.clone(),
    }
}

fn apply_event_fields(event: &mut Event, fields: EventFields) {
    event.title = fields.title;
    event.slug = fields.slug;
    event.description = fields.description;
    event.start_date = fields.start_date;
    event.end_date = fields.end_date;
    event.location = fields.location;
    event.visibility = fields.visibility;
    event.event_type = fields.event_type;
    event.capacity = fields.capacity;
    event.organizer = fields.organizer;
    event.speakers = fields.speakers;
    event.image = fields.image;
    event.status = fields.status;
    event.featured = fields.featured;
    event.registration_required = fields.registration_required;
    event.price = fields.price;
    event.updated_at = Utc::now();
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn paginate<T: Clone>(items: Vec<T>, page: Pagination) -> Page<T> {
    let total = items.len() as i64;
    let slice = items
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect();
    Page::new(slice, page, total)
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, username: &str, role: Role, password: &str) -> User {
        let mut store = self.store.lock().unwrap();
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: format!("{username}@neabi.test"),
            first_name: username.to_string(),
            last_name: "Teste".to_string(),
            role,
            created_at: Utc::now(),
        };
        store.users.push(UserCredentials {
            user: user.clone(),
            password_hash: auth::hash_password(password).unwrap(),
        });
        user
    }

    pub fn add_category(&self, name: &str) -> Category {
        let mut store = self.store.lock().unwrap();
        let id = store.next_id();
        let (name, slug) = lifecycle::taxonomy_entry(name).unwrap();
        let category = Category {
            id,
            name,
            slug,
            description: String::new(),
            created_at: Utc::now(),
        };
        store.categories.push(category.clone());
        category
    }

    pub fn add_tag(&self, name: &str) -> Tag {
        let mut store = self.store.lock().unwrap();
        let id = store.next_id();
        let (name, slug) = lifecycle::taxonomy_entry(name).unwrap();
        let tag = Tag { id, name, slug };
        store.tags.push(tag.clone());
        tag
    }

    pub fn registrations(&self, event_id: i64) -> usize {
        let store = self.store.lock().unwrap();
        store
            .registrations
            .iter()
            .filter(|(id, _)| *id == event_id)
            .count()
    }

    pub fn message(&self, id: i64) -> Option<ContactMessage> {
        let store = self.store.lock().unwrap();
        store.messages.iter().find(|m| m.id == id).cloned()
    }

    fn post_matches(post: &Post, query: &PostQuery) -> bool {
        if let Some(now) = query.visible_at {
            if !post.is_published_at(now) {
                return false;
            }
        }
        if let Some(search) = &query.search {
            let hit = contains(&post.title, search)
                || contains(&post.excerpt, search)
                || contains(&post.author.username, search)
                || contains(&post.author.first_name, search)
                || contains(&post.author.last_name, search);
            if !hit {
                return false;
            }
        }
        if let Some(category) = &query.category {
            if &post.category.name != category {
                return false;
            }
        }
        if query.status.is_some_and(|status| status != post.status) {
            return false;
        }
        if query.featured.is_some_and(|featured| featured != post.featured) {
            return false;
        }
        true
    }

    fn event_matches(event: &Event, query: &EventQuery) -> bool {
        if let Some(now) = query.upcoming_after {
            if !event.is_public_and_upcoming_at(now) {
                return false;
            }
        }
        let text_hit = |text: &String| {
            contains(&event.title, text)
                || contains(&event.description, text)
                || contains(&event.organizer, text)
        };
        if query.search.as_ref().is_some_and(|s| !text_hit(s)) {
            return false;
        }
        if query.category.as_ref().is_some_and(|c| !text_hit(c)) {
            return false;
        }
        if query.event_type.is_some_and(|t| t != event.event_type) {
            return false;
        }
        if query.visibility.is_some_and(|v| v != event.visibility) {
            return false;
        }
        if query.status.is_some_and(|s| s != event.status) {
            return false;
        }
        if query.featured.is_some_and(|f| f != event.featured) {
            return false;
        }
        true
    }
}

#[async_trait]
impl Repository for MemoryRepo {
    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let store = self.store.lock().unwrap();
        Ok(store.users.iter().find(|c| c.user.id == id).map(|c| c.user.clone()))
    }

    async fn find_credentials(&self, username: &str) -> AppResult<Option<UserCredentials>> {
        let store = self.store.lock().unwrap();
        Ok(store.users.iter().find(|c| c.user.username == username).cloned())
    }

    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let mut store = self.store.lock().unwrap();
        if store.users.iter().any(|c| c.user.username == user.username) {
            return Err(AppError::Conflict("Nome de usuário já existe.".to_string()));
        }
        let created = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            created_at: Utc::now(),
        };
        store.users.push(UserCredentials {
            user: created.clone(),
            password_hash: user.password_hash,
        });
        Ok(created)
    }

    async fn list_categories(&self) -> AppResult<Vec<Category>> {
        let store = self.store.lock().unwrap();
        let mut categories = store.categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn get_category(&self, id: i64) -> AppResult<Option<Category>> {
        let store = self.store.lock().unwrap();
        Ok(store.categories.iter().find(|c| c.id == id).cloned())
    }

    async fn create_category(&self, input: CategoryInput) -> AppResult<Category> {
        let (name, slug) = lifecycle::taxonomy_entry(&input.name)?;
        let mut store = self.store.lock().unwrap();
        if let Some(existing) = store.categories.iter().find(|c| c.slug == slug) {
            return Err(AppError::Conflict(format!(
                "A categoria '{}' já existe.",
                existing.name
            )));
        }
        let id = store.next_id();
        let category = Category {
            id,
            name,
            slug,
            description: input.description,
            created_at: Utc::now(),
        };
        store.categories.push(category.clone());
        Ok(category)
    }

    async fn delete_category(&self, id: i64) -> AppResult<bool> {
        let mut store = self.store.lock().unwrap();
        if store.posts.iter().any(|(p, _)| p.category.id == id) {
            return Err(AppError::Conflict(
                "Categoria está em uso e não pode ser excluído(a).".to_string(),
            ));
        }
        let before = store.categories.len();
        store.categories.retain(|c| c.id != id);
        Ok(store.categories.len() < before)
    }

    async fn list_tags(&self) -> AppResult<Vec<Tag>> {
        let store = self.store.lock().unwrap();
        Ok(store.tags.clone())
    }

    async fn get_tag(&self, id: i64) -> AppResult<Option<Tag>> {
        let store = self.store.lock().unwrap();
        Ok(store.tags.iter().find(|t| t.id == id).cloned())
    }

    async fn create_tag(&self, input: TagInput) -> AppResult<Tag> {
        let (name, slug) = lifecycle::taxonomy_entry(&input.name)?;
        let mut store = self.store.lock().unwrap();
        if let Some(existing) = store.tags.iter().find(|t| t.slug == slug) {
            return Err(AppError::Conflict(format!("A tag '{}' já existe.", existing.name)));
        }
        let id = store.next_id();
        let tag = Tag { id, name, slug };
        store.tags.push(tag.clone());
        Ok(tag)
    }

    async fn delete_tag(&self, id: i64) -> AppResult<bool> {
        let mut store = self.store.lock().unwrap();
        let before = store.tags.len();
        store.tags.retain(|t| t.id != id);
        for (post, _) in store.posts.iter_mut() {
            post.tags.retain(|t| t.id != id);
        }
        Ok(store.tags.len() < before)
    }

    async fn list_posts(&self, query: &PostQuery, page: Pagination) -> AppResult<Page<Post>> {
        let store = self.store.lock().unwrap();
        let now = Utc::now();
        let mut posts: Vec<Post> = store
            .posts
            .iter()
            .map(|(p, _)| p)
            .filter(|p| Self::post_matches(p, query))
            .cloned()
            .collect();
        match query.order {
            PostOrder::PublicationDesc => posts.sort_by(|a, b| {
                b.publication_date.cmp(&a.publication_date).then(b.id.cmp(&a.id))
            }),
            PostOrder::CreatedDesc => {
                posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)))
            }
        }
        Ok(paginate(posts, page).map(|p| p.with_derived(now)))
    }

    async fn get_post(&self, id: i64) -> AppResult<Option<Post>> {
        let store = self.store.lock().unwrap();
        Ok(store
            .posts
            .iter()
            .find(|(p, _)| p.id == id)
            .map(|(p, _)| p.clone().with_derived(Utc::now())))
    }

    async fn get_post_by_slug(&self, slug: &str) -> AppResult<Option<Post>> {
        let store = self.store.lock().unwrap();
        Ok(store
            .posts
            .iter()
            .find(|(p, _)| p.slug == slug)
            .map(|(p, _)| p.clone().with_derived(Utc::now())))
    }

    async fn create_post(&self, author_id: Uuid, input: PostInput) -> AppResult<Post> {
        let now = Utc::now();
        let (fields, tag_ids) = lifecycle::normalize_post(input, now)?;
        let mut store = self.store.lock().unwrap();

        if store.posts.iter().any(|(p, _)| p.slug == fields.slug) {
            return Err(AppError::Conflict("Post com este slug ou nome já existe.".to_string()));
        }
        let category = store
            .categories
            .iter()
            .find(|c| c.id == fields.category_id)
            .cloned()
            .ok_or_else(|| AppError::Validation("Post referencia um registro inexistente.".to_string()))?;
        let author = store
            .users
            .iter()
            .find(|c| c.user.id == author_id)
            .map(|c| Author {
                id: c.user.id,
                username: c.user.username.clone(),
                first_name: c.user.first_name.clone(),
                last_name: c.user.last_name.clone(),
            })
            .unwrap_or_default();

        let id = store.next_id();
        let post = Post {
            id,
            title: fields.title,
            slug: fields.slug,
            content: fields.content,
            excerpt: fields.excerpt,
            author,
            image: fields.image,
            status: fields.status,
            publication_date: fields.publication_date,
            created_at: now + Duration::microseconds(id),
            updated_at: now,
            category: CategorySummary {
                id: category.id,
                name: category.name,
                slug: category.slug,
            },
            tags: store.tags_for(&tag_ids),
            views: 0,
            featured: fields.featured,
            is_published: false,
        };
        store.posts.push((post.clone(), author_id));
        Ok(post.with_derived(now))
    }

    async fn update_post(&self, id: i64, patch: PostPatch) -> AppResult<Option<Post>> {
        let mut store = self.store.lock().unwrap();
        let Some(index) = store.posts.iter().position(|(p, _)| p.id == id) else {
            return Ok(None);
        };
        let (fields, tag_ids) = lifecycle::apply_post_patch(post_fields(&store.posts[index].0), patch)?;
        let category = store
            .categories
            .iter()
            .find(|c| c.id == fields.category_id)
            .cloned()
            .ok_or_else(|| AppError::Validation("Post referencia um registro inexistente.".to_string()))?;
        let tags = tag_ids.map(|ids| store.tags_for(&ids));

        let post = &mut store.posts[index].0;
        post.title = fields.title;
        post.slug = fields.slug;
        post.content = fields.content;
        post.excerpt = fields.excerpt;
        post.image = fields.image;
        post.status = fields.status;
        post.publication_date = fields.publication_date;
        post.featured = fields.featured;
        post.category = CategorySummary {
            id: category.id,
            name: category.name,
            slug: category.slug,
        };
        if let Some(tags) = tags {
            post.tags = tags;
        }
        post.updated_at = Utc::now();
        Ok(Some(post.clone().with_derived(Utc::now())))
    }

    async fn delete_post(&self, id: i64) -> AppResult<bool> {
        let mut store = self.store.lock().unwrap();
        let before = store.posts.len();
        store.posts.retain(|(p, _)| p.id != id);
        Ok(store.posts.len() < before)
    }

    async fn increment_post_views(&self, id: i64) -> AppResult<Option<i64>> {
        let mut store = self.store.lock().unwrap();
        Ok(store.posts.iter_mut().find(|(p, _)| p.id == id).map(|(p, _)| {
            p.views += 1;
            p.views
        }))
    }

    async fn list_events(&self, query: &EventQuery, page: Pagination) -> AppResult<Page<Event>> {
        let store = self.store.lock().unwrap();
        let now = Utc::now();
        let mut events: Vec<Event> = store
            .events
            .iter()
            .filter(|e| Self::event_matches(e, query))
            .cloned()
            .collect();
        match query.order {
            EventOrder::StartAsc => {
                events.sort_by(|a, b| a.start_date.cmp(&b.start_date).then(a.id.cmp(&b.id)))
            }
            EventOrder::CreatedDesc => {
                events.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)))
            }
        }
        Ok(paginate(events, page).map(|e| e.with_derived(now)))
    }

    async fn get_event(&self, id: i64) -> AppResult<Option<Event>> {
        let store = self.store.lock().unwrap();
        Ok(store
            .events
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.clone().with_derived(Utc::now())))
    }

    async fn get_event_by_slug(&self, slug: &str) -> AppResult<Option<Event>> {
        let store = self.store.lock().unwrap();
        Ok(store
            .events
            .iter()
            .find(|e| e.slug == slug)
            .map(|e| e.clone().with_derived(Utc::now())))
    }

    async fn create_event(&self, input: EventInput) -> AppResult<Event> {
        let (fields, tag_ids) = lifecycle::normalize_event(input)?;
        let mut store = self.store.lock().unwrap();
        if store.events.iter().any(|e| e.slug == fields.slug) {
            return Err(AppError::Conflict("Evento com este slug ou nome já existe.".to_string()));
        }

        let id = store.next_id();
        let now = Utc::now();
        let mut event = Event {
            id,
            created_at: now + Duration::microseconds(id),
            tags: store.tags_for(&tag_ids),
            ..Event::default()
        };
        apply_event_fields(&mut event, fields);
        store.events.push(event.clone());
        Ok(event.with_derived(now))
    }

    async fn update_event(&self, id: i64, patch: EventPatch) -> AppResult<Option<Event>> {
        let mut store = self.store.lock().unwrap();
        let Some(index) = store.events.iter().position(|e| e.id == id) else {
            return Ok(None);
        };
        let (fields, tag_ids) = lifecycle::apply_event_patch(event_fields(&store.events[index]), patch)?;
        let tags = tag_ids.map(|ids| store.tags_for(&ids));

        let event = &mut store.events[index];
        apply_event_fields(event, fields);
        if let Some(tags) = tags {
            event.tags = tags;
        }
        Ok(Some(event.clone().with_derived(Utc::now())))
    }

    async fn delete_event(&self, id: i64) -> AppResult<bool> {
        let mut store = self.store.lock().unwrap();
        let before = store.events.len();
        store.events.retain(|e| e.id != id);
        store.registrations.retain(|(event_id, _)| *event_id != id);
        Ok(store.events.len() < before)
    }

    async fn register_for_event(&self, event_id: i64, user_id: Uuid) -> AppResult<Event> {
        let mut store = self.store.lock().unwrap();
        let event = store
            .events
            .iter_mut()
            .find(|e| e.id == event_id)
            .ok_or(AppError::NotFound("Evento"))?;

        lifecycle::check_registration(event)?;
        event.registered += 1;
        let updated = event.clone().with_derived(Utc::now());
        store.registrations.push((event_id, user_id));
        Ok(updated)
    }

    async fn create_message(&self, input: ContactMessageInput) -> AppResult<ContactMessage> {
        let input = lifecycle::normalize_contact(input)?;
        let mut store = self.store.lock().unwrap();
        let id = store.next_id();
        let message = ContactMessage {
            id,
            name: input.name,
            email: input.email,
            subject: input.subject,
            message: input.message,
            created_at: Utc::now() + Duration::microseconds(id),
            read: false,
        };
        store.messages.push(message.clone());
        Ok(message)
    }

    async fn list_messages(&self, page: Pagination) -> AppResult<Page<ContactMessage>> {
        let store = self.store.lock().unwrap();
        let mut messages = store.messages.clone();
        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(messages, page))
    }

    async fn get_message(&self, id: i64) -> AppResult<Option<ContactMessage>> {
        Ok(self.message(id))
    }

    async fn mark_message_read(&self, id: i64) -> AppResult<Option<ContactMessage>> {
        let mut store = self.store.lock().unwrap();
        Ok(store.messages.iter_mut().find(|m| m.id == id).map(|m| {
            m.read = true;
            m.clone()
        }))
    }

    async fn delete_message(&self, id: i64) -> AppResult<bool> {
        let mut store = self.store.lock().unwrap();
        let before = store.messages.len();
        store.messages.retain(|m| m.id != id);
        Ok(store.messages.len() < before)
    }

    async fn count_unread_messages(&self) -> AppResult<i64> {
        let store = self.store.lock().unwrap();
        Ok(store.messages.iter().filter(|m| !m.read).count() as i64)
    }

    async fn get_stats(&self) -> AppResult<DashboardStats> {
        let now = Utc::now();
        let (counts, mut posts, mut events) = {
            let store = self.store.lock().unwrap();
            let posts: Vec<Post> = store.posts.iter().map(|(p, _)| p.clone()).collect();
            let counts = DashboardCounts {
                total_posts: posts.len() as i64,
                published_posts: posts.iter().filter(|p| p.status == PostStatus::Published).count() as i64,
                draft_posts: posts.iter().filter(|p| p.status == PostStatus::Draft).count() as i64,
                total_events: store.events.len() as i64,
                upcoming_events: store.events.iter().filter(|e| e.is_upcoming_at(now)).count() as i64,
                total_users: store.users.len() as i64,
                unread_messages: store.messages.iter().filter(|m| !m.read).count() as i64,
            };
            (counts, posts, store.events.clone())
        };
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(DashboardStats {
            counts,
            recent_posts: posts.into_iter().take(5).map(PostSummary::from).collect(),
            recent_events: events.into_iter().take(5).map(EventSummary::from).collect(),
        })
    }
}

// --- Fixtures ---

pub fn post_input(title: &str, category_id: i64) -> PostInput {
    PostInput {
        title: title.to_string(),
        content: format!("Conteúdo de {title}."),
        status: PostStatus::Published,
        publication_date: Some(Utc::now() - Duration::days(1)),
        category_id,
        ..PostInput::default()
    }
}

pub fn event_input(title: &str, starts_in: Duration) -> EventInput {
    let start: DateTime<Utc> = Utc::now() + starts_in;
    EventInput {
        title: title.to_string(),
        slug: None,
        description: format!("Descrição de {title}."),
        start_date: start,
        end_date: start + Duration::hours(2),
        location: "Auditório Central".to_string(),
        visibility: Visibility::Public,
        event_type: Default::default(),
        capacity: None,
        organizer: "NEABI".to_string(),
        speakers: "Ana, Bruno".to_string(),
        image: None,
        status: Default::default(),
        featured: false,
        registration_required: true,
        price: None,
        tag_ids: vec![],
    }
}

// --- App Harness ---

pub struct TestApp {
    pub repo: Arc<MemoryRepo>,
    pub config: AppConfig,
    pub router: Router,
    pub admin: User,
    pub reader: User,
}

pub const PASSWORD: &str = "senha-segura-123";

impl TestApp {
    pub fn new() -> Self {
        Self::with_storage(MockStorageService::new())
    }

    pub fn with_storage(storage: MockStorageService) -> Self {
        let repo = Arc::new(MemoryRepo::new());
        let admin = repo.add_user("admin", Role::Admin, PASSWORD);
        let reader = repo.add_user("leitora", Role::Reader, PASSWORD);
        let config = AppConfig::default();

        let state = AppState {
            repo: repo.clone() as RepositoryState,
            storage: Arc::new(storage) as StorageState,
            config: config.clone(),
        };

        Self {
            repo,
            config,
            router: create_router(state),
            admin,
            reader,
        }
    }

    pub fn state(&self) -> AppState {
        AppState {
            repo: self.repo.clone() as RepositoryState,
            storage: Arc::new(MockStorageService::new()) as StorageState,
            config: self.config.clone(),
        }
    }

    pub fn token_for(&self, user: &User) -> String {
        auth::issue_token(user.id, &self.config).unwrap().0
    }

    pub fn bearer(&self, user: &User) -> String {
        format!("Bearer {}", self.token_for(user))
    }

    pub fn session(&self, user: &User) -> String {
        format!("{}={}", auth::SESSION_COOKIE, self.token_for(user))
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        TestResponse {
            status,
            headers,
            body,
        }
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    /// Decoded flash left by a redirect, if any.
    pub fn flash(&self) -> Option<neabi_portal::flash::Flash> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| v.strip_prefix("flash="))
            .filter_map(|v| v.split(';').next())
            .find_map(neabi_portal::flash::Flash::decode)
    }

    pub fn sets_cookie(&self, name: &str) -> bool {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .any(|v| v.starts_with(&format!("{name}=")))
    }
}

// --- Request Builders ---

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn get_as(uri: &str, authorization: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, authorization)
        .body(Body::empty()).unwrap()
}

pub fn get_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty()).unwrap()
}

pub fn json(method: &str, uri: &str, authorization: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(auth) = authorization {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn form(uri: &str, cookie: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn empty(method: &str, uri: &str, authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = authorization {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::empty()).unwrap()
}
