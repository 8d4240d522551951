use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{error::AppError, filters::Page, lifecycle};

// --- Choice Enumerations (Mapped to Postgres enum types) ---

/// Implements the text mapping shared by every choice enum: the stored value,
/// the display label and strict parsing of query/form values.
macro_rules! choices {
    ($name:ident { $($variant:ident => $value:literal, $label:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value),+
                }
            }

            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = AppError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($value => Ok($name::$variant),)+
                    other => Err(AppError::Validation(format!(
                        "Valor inválido para {}: '{}'.",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

/// Role
///
/// The RBAC field stored on the profile. Only `Admin` may mutate content.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Admin,
    #[default]
    Reader,
}

choices!(Role {
    Admin => "admin", "Administrador",
    Reader => "reader", "Leitor",
});

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "post_status", rename_all = "lowercase")]
#[ts(export)]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
}

choices!(PostStatus {
    Draft => "draft", "Rascunho",
    Published => "published", "Publicado",
});

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "event_visibility", rename_all = "lowercase")]
#[ts(export)]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

choices!(Visibility {
    Public => "public", "Público",
    Private => "private", "Privado",
});

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "event_type", rename_all = "lowercase")]
#[ts(export)]
pub enum EventType {
    #[default]
    Presencial,
    Online,
    Hibrido,
}

choices!(EventType {
    Presencial => "presencial", "Presencial",
    Online => "online", "Online",
    Hibrido => "hibrido", "Híbrido",
});

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "event_status", rename_all = "lowercase")]
#[ts(export)]
pub enum EventStatus {
    #[default]
    Upcoming,
    Ongoing,
    Completed,
}

choices!(EventStatus {
    Upcoming => "upcoming", "Próximo",
    Ongoing => "ongoing", "Em andamento",
    Completed => "completed", "Finalizado",
});

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// The identity record (`users`) joined with its 1:1 profile (`profiles.role`).
/// The password hash is never part of this struct; see `UserCredentials`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn full_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

/// UserCredentials
///
/// Internal row used only by the login flow.
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    #[sqlx(flatten)]
    pub user: User,
    pub password_hash: String,
}

/// NewUser
///
/// Insert payload for `users` + `profiles`. The hash is computed by `auth::hash_password`.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// Author
///
/// The post author as exposed publicly. Loaded through a JOIN on `users`,
/// hence the prefixed column names.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct Author {
    #[sqlx(rename = "author_id")]
    pub id: Uuid,
    #[sqlx(rename = "author_username")]
    pub username: String,
    #[sqlx(rename = "author_first_name")]
    pub first_name: String,
    #[sqlx(rename = "author_last_name")]
    pub last_name: String,
}

/// CategorySummary
///
/// The category embedded in a post row (JOIN on `categories`).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct CategorySummary {
    #[sqlx(rename = "category_id")]
    pub id: i64,
    #[sqlx(rename = "category_name")]
    pub name: String,
    #[sqlx(rename = "category_slug")]
    pub slug: String,
}

/// Post
///
/// A blog post with its author, category and tags resolved.
/// `is_published` is a read-time snapshot filled by `with_derived`; the
/// authoritative rule is `is_published_at`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    #[sqlx(flatten)]
    pub author: Author,
    pub image: Option<String>,
    pub status: PostStatus,
    #[ts(type = "string")]
    pub publication_date: DateTime<Utc>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
    #[sqlx(flatten)]
    pub category: CategorySummary,
    #[sqlx(skip)]
    pub tags: Vec<Tag>,
    pub views: i64,
    pub featured: bool,
    #[sqlx(skip)]
    pub is_published: bool,
}

impl Post {
    pub fn is_published_at(&self, now: DateTime<Utc>) -> bool {
        lifecycle::is_post_visible(self.status, self.publication_date, now)
    }

    pub fn with_derived(mut self, now: DateTime<Utc>) -> Self {
        self.is_published = self.is_published_at(now);
        self
    }
}

/// PostSummary
///
/// The trimmed-down shape used by listings.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PostSummary {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub author: Author,
    pub image: Option<String>,
    #[ts(type = "string")]
    pub publication_date: DateTime<Utc>,
    pub category: CategorySummary,
    pub tags: Vec<Tag>,
    pub views: i64,
    pub featured: bool,
}

impl From<Post> for PostSummary {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            title: post.title,
            slug: post.slug,
            excerpt: post.excerpt,
            author: post.author,
            image: post.image,
            publication_date: post.publication_date,
            category: post.category,
            tags: post.tags,
            views: post.views,
            featured: post.featured,
        }
    }
}

/// Event
///
/// An outreach event. `registered` is only changed by the atomic registration
/// update in the repository. The `#[sqlx(skip)]` fields are read-time
/// snapshots of the derived properties, filled by `with_derived`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
    #[ts(type = "string")]
    pub start_date: DateTime<Utc>,
    #[ts(type = "string")]
    pub end_date: DateTime<Utc>,
    pub location: String,
    pub visibility: Visibility,
    pub event_type: EventType,
    pub capacity: Option<i32>,
    pub registered: i32,
    pub organizer: String,
    pub speakers: String,
    pub image: Option<String>,
    pub status: EventStatus,
    pub featured: bool,
    pub registration_required: bool,
    pub price: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub tags: Vec<Tag>,
    #[sqlx(skip)]
    pub speakers_list: Vec<String>,
    #[sqlx(skip)]
    pub is_upcoming: bool,
    #[sqlx(skip)]
    pub is_public_and_upcoming: bool,
    #[sqlx(skip)]
    pub is_full: bool,
}

impl Event {
    pub fn is_upcoming_at(&self, now: DateTime<Utc>) -> bool {
        self.start_date > now
    }

    pub fn is_public_and_upcoming_at(&self, now: DateTime<Utc>) -> bool {
        self.visibility == Visibility::Public && self.is_upcoming_at(now)
    }

    pub fn is_full(&self) -> bool {
        lifecycle::is_full(self.capacity, self.registered)
    }

    pub fn speakers_list(&self) -> Vec<String> {
        lifecycle::speakers_list(&self.speakers)
    }

    pub fn with_derived(mut self, now: DateTime<Utc>) -> Self {
        self.speakers_list = self.speakers_list();
        self.is_upcoming = self.is_upcoming_at(now);
        self.is_public_and_upcoming = self.is_public_and_upcoming_at(now);
        self.is_full = self.is_full();
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct EventSummary {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
    #[ts(type = "string")]
    pub start_date: DateTime<Utc>,
    #[ts(type = "string")]
    pub end_date: DateTime<Utc>,
    pub location: String,
    pub event_type: EventType,
    pub organizer: String,
    pub tags: Vec<Tag>,
    pub image: Option<String>,
    pub featured: bool,
    pub price: String,
    pub is_full: bool,
}

impl From<Event> for EventSummary {
    fn from(event: Event) -> Self {
        let is_full = event.is_full();
        Self {
            id: event.id,
            title: event.title,
            slug: event.slug,
            description: event.description,
            start_date: event.start_date,
            end_date: event.end_date,
            location: event.location,
            event_type: event.event_type,
            organizer: event.organizer,
            tags: event.tags,
            image: event.image,
            featured: event.featured,
            price: event.price,
            is_full,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct ContactMessage {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    pub read: bool,
}

/// Tag row tagged with the id of the post/event it belongs to.
#[derive(Debug, Clone, FromRow)]
pub struct OwnedTag {
    pub owner_id: i64,
    #[sqlx(flatten)]
    pub tag: Tag,
}

// --- Writable Column Sets ---

/// PostFields
///
/// The columns a save writes, after lifecycle normalization
/// (slug defaulted, excerpt derived, constraints checked).
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct PostFields {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    pub image: Option<String>,
    pub status: PostStatus,
    pub publication_date: DateTime<Utc>,
    pub category_id: i64,
    pub featured: bool,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct EventFields {
    pub title: String,
    pub slug: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub location: String,
    pub visibility: Visibility,
    pub event_type: EventType,
    pub capacity: Option<i32>,
    pub organizer: String,
    pub speakers: String,
    pub image: Option<String>,
    pub status: EventStatus,
    pub featured: bool,
    pub registration_required: bool,
    pub price: String,
}

// --- Request Payloads (Input Schemas) ---

/// PostInput
///
/// Full payload for creating a post (POST) or replacing it (PUT).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct PostInput {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    pub content: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub status: PostStatus,
    #[serde(default)]
    pub publication_date: Option<DateTime<Utc>>,
    pub category_id: i64,
    #[serde(default)]
    pub tag_ids: Vec<i64>,
    #[serde(default)]
    pub featured: bool,
}

/// PostPatch
///
/// Partial update (PATCH). Only `Some` fields are written; `tag_ids: Some`
/// replaces the whole tag set.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct PostPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PostStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publication_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_ids: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
}

impl From<PostInput> for PostPatch {
    /// A PUT writes every field. An absent excerpt is sent as empty so it is
    /// derived again from the new content, and an absent image clears the
    /// stored one. An absent `publication_date` keeps the stored date.
    fn from(input: PostInput) -> Self {
        Self {
            title: Some(input.title),
            slug: input.slug,
            content: Some(input.content),
            excerpt: Some(input.excerpt.unwrap_or_default()),
            image: Some(input.image.unwrap_or_default()),
            status: Some(input.status),
            publication_date: input.publication_date,
            category_id: Some(input.category_id),
            tag_ids: Some(input.tag_ids),
            featured: Some(input.featured),
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventInput {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub location: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub event_type: EventType,
    #[serde(default)]
    pub capacity: Option<i32>,
    pub organizer: String,
    #[serde(default)]
    pub speakers: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default)]
    pub featured: bool,
    #[serde(default = "default_true")]
    pub registration_required: bool,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub tag_ids: Vec<i64>,
}

/// EventPatch
///
/// Partial event update. `capacity: Some(None)` is not expressible in JSON
/// here; clearing a capacity goes through a full PUT.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct EventPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<EventType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<i32>,
    #[serde(skip, default)]
    pub clear_capacity: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organizer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speakers: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EventStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_ids: Option<Vec<i64>>,
}

impl From<EventInput> for EventPatch {
    fn from(input: EventInput) -> Self {
        Self {
            title: Some(input.title),
            slug: input.slug,
            description: Some(input.description),
            start_date: Some(input.start_date),
            end_date: Some(input.end_date),
            location: Some(input.location),
            visibility: Some(input.visibility),
            event_type: Some(input.event_type),
            clear_capacity: input.capacity.is_none(),
            capacity: input.capacity,
            organizer: Some(input.organizer),
            speakers: Some(input.speakers),
            image: Some(input.image.unwrap_or_default()),
            status: Some(input.status),
            featured: Some(input.featured),
            registration_required: Some(input.registration_required),
            price: input.price,
            tag_ids: Some(input.tag_ids),
        }
    }
}

/// ContactMessageInput
///
/// Submitted by anyone through `/contato` or `POST /api/contact-messages`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ContactMessageInput {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct CategoryInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct TagInput {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// TokenResponse
///
/// Returned by `POST /api/auth/token`. The token is the same credential the
/// web login stores in the `session` cookie.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: User,
}

/// PresignedUrlRequest
///
/// Requests a short-lived upload URL for a post or event image.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUrlRequest {
    #[schema(example = "cartaz.png")]
    pub filename: String,
    #[schema(example = "image/png")]
    pub file_type: String,
    /// Either `posts` or `events`; used as the key prefix.
    #[schema(example = "events")]
    pub target: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUrlResponse {
    pub upload_url: String,
    /// Store this key in the `image` field of the post or event.
    pub resource_key: String,
}

// --- Dashboard & Small Responses ---

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow, Default)]
pub struct DashboardCounts {
    pub total_posts: i64,
    pub published_posts: i64,
    pub draft_posts: i64,
    pub total_events: i64,
    pub upcoming_events: i64,
    pub total_users: i64,
    pub unread_messages: i64,
}

/// DashboardStats
///
/// Back-office landing page: counters plus the five most recent posts/events.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct DashboardStats {
    #[serde(flatten)]
    pub counts: DashboardCounts,
    pub recent_posts: Vec<PostSummary>,
    pub recent_events: Vec<EventSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ViewsResponse {
    pub views: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// A `(value, label)` pair for select widgets.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

// --- Page Contexts (what a template would receive) ---

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HomePage {
    pub featured_events: Vec<EventSummary>,
    pub recent_posts: Vec<PostSummary>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StaticPage {
    pub slug: String,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BlogPage {
    pub posts: Page<PostSummary>,
    pub categories: Vec<Category>,
    pub featured_posts: Vec<PostSummary>,
    pub search: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PostPage {
    pub post: Post,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EventsPage {
    pub events: Page<EventSummary>,
    pub featured_events: Vec<EventSummary>,
    pub event_types: Vec<Choice>,
    pub category: Option<String>,
    pub event_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EventPage {
    pub event: Event,
    pub can_register: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FormPage {
    pub form: String,
    pub fields: Vec<String>,
}

impl FormPage {
    pub fn new(form: &str, fields: &[&str]) -> Self {
        Self {
            form: form.to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProfilePage {
    pub user: User,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AdminPostList {
    pub posts: Page<Post>,
    pub search: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AdminPostForm {
    pub post: Option<Post>,
    pub categories: Vec<Category>,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AdminEventList {
    pub events: Page<Event>,
    pub search: Option<String>,
    pub visibility: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AdminEventForm {
    pub event: Option<Event>,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MessagesPage {
    pub messages: Page<ContactMessage>,
    pub unread_count: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CategoriesPage {
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TagsPage {
    pub tags: Vec<Tag>,
}
