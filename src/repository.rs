use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgConnection, PgPool, Postgres, query_builder::QueryBuilder};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    filters::{EventOrder, EventQuery, Page, Pagination, PostOrder, PostQuery},
    lifecycle,
    models::{
        Category, CategoryInput, ContactMessage, ContactMessageInput, DashboardCounts,
        DashboardStats, Event, EventFields, EventInput, EventPatch, EventSummary, NewUser,
        OwnedTag, Post, PostFields, PostInput, PostPatch, PostSummary, Tag, TagInput, User,
        UserCredentials,
    },
};

/// Number of recent posts/events shown on the dashboard.
pub const DASHBOARD_RECENT: i64 = 5;

/// Repository
///
/// Every persistence operation of the portal. Handlers only see this trait
/// (`Arc<dyn Repository>`), so tests can swap in an in-memory store.
///
/// Writes normalize and validate their input through `lifecycle` before
/// touching the database. Updates merge into the stored row under a row
/// lock, so invariants are checked against the merged state.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>>;
    async fn find_credentials(&self, username: &str) -> AppResult<Option<UserCredentials>>;
    async fn create_user(&self, user: NewUser) -> AppResult<User>;

    // --- Taxonomy ---
    async fn list_categories(&self) -> AppResult<Vec<Category>>;
    async fn get_category(&self, id: i64) -> AppResult<Option<Category>>;
    /// Fails with `Conflict` naming the existing category when the slug is taken.
    async fn create_category(&self, input: CategoryInput) -> AppResult<Category>;
    async fn delete_category(&self, id: i64) -> AppResult<bool>;
    async fn list_tags(&self) -> AppResult<Vec<Tag>>;
    async fn get_tag(&self, id: i64) -> AppResult<Option<Tag>>;
    async fn create_tag(&self, input: TagInput) -> AppResult<Tag>;
    async fn delete_tag(&self, id: i64) -> AppResult<bool>;

    // --- Posts ---
    async fn list_posts(&self, query: &PostQuery, page: Pagination) -> AppResult<Page<Post>>;
    async fn get_post(&self, id: i64) -> AppResult<Option<Post>>;
    async fn get_post_by_slug(&self, slug: &str) -> AppResult<Option<Post>>;
    async fn create_post(&self, author_id: Uuid, input: PostInput) -> AppResult<Post>;
    async fn update_post(&self, id: i64, patch: PostPatch) -> AppResult<Option<Post>>;
    async fn delete_post(&self, id: i64) -> AppResult<bool>;
    /// Atomic `views + 1`. Returns the new count, `None` if the post is gone.
    async fn increment_post_views(&self, id: i64) -> AppResult<Option<i64>>;

    // --- Events ---
    async fn list_events(&self, query: &EventQuery, page: Pagination) -> AppResult<Page<Event>>;
    async fn get_event(&self, id: i64) -> AppResult<Option<Event>>;
    async fn get_event_by_slug(&self, slug: &str) -> AppResult<Option<Event>>;
    async fn create_event(&self, input: EventInput) -> AppResult<Event>;
    async fn update_event(&self, id: i64, patch: EventPatch) -> AppResult<Option<Event>>;
    async fn delete_event(&self, id: i64) -> AppResult<bool>;
    /// register_for_event
    ///
    /// Takes one seat for `user_id`. Fails with `RegistrationNotRequired`,
    /// `CapacityExceeded` or `NotFound`; on success `registered` grew by exactly 1.
    async fn register_for_event(&self, event_id: i64, user_id: Uuid) -> AppResult<Event>;

    // --- Contact Messages ---
    async fn create_message(&self, input: ContactMessageInput) -> AppResult<ContactMessage>;
    async fn list_messages(&self, page: Pagination) -> AppResult<Page<ContactMessage>>;
    async fn get_message(&self, id: i64) -> AppResult<Option<ContactMessage>>;
    /// Idempotent: marking a read message again succeeds and changes nothing.
    async fn mark_message_read(&self, id: i64) -> AppResult<Option<ContactMessage>>;
    async fn delete_message(&self, id: i64) -> AppResult<bool>;
    async fn count_unread_messages(&self) -> AppResult<i64>;

    // --- Dashboard ---
    async fn get_stats(&self) -> AppResult<DashboardStats>;
}

pub type RepositoryState = Arc<dyn Repository>;

// --- SQL fragments ---

const USER_COLUMNS: &str = r#"
    SELECT u.id, u.username, u.email, u.first_name, u.last_name, p.role, u.created_at
    FROM users u
    JOIN profiles p ON p.user_id = u.id
"#;

const POST_SELECT: &str = r#"
    SELECT
        p.id, p.title, p.slug, p.content, p.excerpt, p.image, p.status,
        p.publication_date, p.created_at, p.updated_at, p.views, p.featured,
        u.id AS author_id, u.username AS author_username,
        u.first_name AS author_first_name, u.last_name AS author_last_name,
        c.id AS category_id, c.name AS category_name, c.slug AS category_slug
    FROM posts p
    JOIN users u ON u.id = p.author_id
    JOIN categories c ON c.id = p.category_id
"#;

const POST_COUNT: &str = r#"
    SELECT COUNT(*)
    FROM posts p
    JOIN users u ON u.id = p.author_id
    JOIN categories c ON c.id = p.category_id
"#;

const EVENT_SELECT: &str = r#"
    SELECT
        e.id, e.title, e.slug, e.description, e.start_date, e.end_date, e.location,
        e.visibility, e.event_type, e.capacity, e.registered, e.organizer, e.speakers,
        e.image, e.status, e.featured, e.registration_required, e.price,
        e.created_at, e.updated_at
    FROM events e
"#;

const EVENT_COUNT: &str = "SELECT COUNT(*) FROM events e";

/// Which join table links an owner row to its tags.
#[derive(Clone, Copy)]
enum TagLink {
    Post,
    Event,
}

impl TagLink {
    fn table(self) -> &'static str {
        match self {
            TagLink::Post => "post_tags",
            TagLink::Event => "event_tags",
        }
    }

    fn owner_column(self) -> &'static str {
        match self {
            TagLink::Post => "post_id",
            TagLink::Event => "event_id",
        }
    }
}

/// PostgresRepository
///
/// `Repository` backed by Postgres. Queries are built at runtime
/// (`query_as` / `QueryBuilder`); the schema lives in `migrations/`.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Loads the tags of `owners` in one round trip, keyed by owner id.
    async fn load_tags(&self, link: TagLink, owners: &[i64]) -> AppResult<HashMap<i64, Vec<Tag>>> {
        if owners.is_empty() {
            return Ok(HashMap::new());
        }

        let sql = format!(
            "SELECT l.{owner} AS owner_id, t.id, t.name, t.slug \
             FROM {table} l JOIN tags t ON t.id = l.tag_id \
             WHERE l.{owner} = ANY($1) ORDER BY t.name",
            owner = link.owner_column(),
            table = link.table(),
        );

        let rows = sqlx::query_as::<_, OwnedTag>(&sql)
            .bind(owners)
            .fetch_all(&self.pool)
            .await?;

        let mut by_owner: HashMap<i64, Vec<Tag>> = HashMap::new();
        for row in rows {
            by_owner.entry(row.owner_id).or_default().push(row.tag);
        }
        Ok(by_owner)
    }

    async fn finish_posts(&self, posts: Vec<Post>) -> AppResult<Vec<Post>> {
        let ids: Vec<i64> = posts.iter().map(|p| p.id).collect();
        let mut tags = self.load_tags(TagLink::Post, &ids).await?;
        let now = Utc::now();

        Ok(posts
            .into_iter()
            .map(|mut post| {
                post.tags = tags.remove(&post.id).unwrap_or_default();
                post.with_derived(now)
            })
            .collect())
    }

    async fn finish_events(&self, events: Vec<Event>) -> AppResult<Vec<Event>> {
        let ids: Vec<i64> = events.iter().map(|e| e.id).collect();
        let mut tags = self.load_tags(TagLink::Event, &ids).await?;
        let now = Utc::now();

        Ok(events
            .into_iter()
            .map(|mut event| {
                event.tags = tags.remove(&event.id).unwrap_or_default();
                event.with_derived(now)
            })
            .collect())
    }

    async fn fetch_post(&self, column: &str, value: LookupKey<'_>) -> AppResult<Option<Post>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(POST_SELECT);
        builder.push(format!(" WHERE p.{column} = "));
        match value {
            LookupKey::Id(id) => builder.push_bind(id),
            LookupKey::Slug(slug) => builder.push_bind(slug.to_string()),
        };

        let post = builder.build_query_as::<Post>().fetch_optional(&self.pool).await?;
        Ok(self.finish_posts(post.into_iter().collect()).await?.pop())
    }

    async fn fetch_event(&self, column: &str, value: LookupKey<'_>) -> AppResult<Option<Event>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(EVENT_SELECT);
        builder.push(format!(" WHERE e.{column} = "));
        match value {
            LookupKey::Id(id) => builder.push_bind(id),
            LookupKey::Slug(slug) => builder.push_bind(slug.to_string()),
        };

        let event = builder.build_query_as::<Event>().fetch_optional(&self.pool).await?;
        Ok(self.finish_events(event.into_iter().collect()).await?.pop())
    }
}

/// Lookup key for a single post or event.
enum LookupKey<'a> {
    Id(i64),
    Slug(&'a str),
}

/// Replaces the tag set of one owner inside the caller's transaction.
async fn replace_tags(
    conn: &mut PgConnection,
    link: TagLink,
    owner_id: i64,
    tag_ids: &[i64],
) -> AppResult<()> {
    let table = link.table();
    let owner = link.owner_column();

    sqlx::query(&format!("DELETE FROM {table} WHERE {owner} = $1"))
        .bind(owner_id)
        .execute(&mut *conn)
        .await?;

    if !tag_ids.is_empty() {
        sqlx::query(&format!(
            "INSERT INTO {table} ({owner}, tag_id) \
             SELECT $1, tag_id FROM UNNEST($2::BIGINT[]) AS t(tag_id) \
             ON CONFLICT DO NOTHING"
        ))
        .bind(owner_id)
        .bind(tag_ids)
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::from_write(e, "Tag"))?;
    }
    Ok(())
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("{USER_COLUMNS} WHERE u.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_credentials(&self, username: &str) -> AppResult<Option<UserCredentials>> {
        let credentials = sqlx::query_as::<_, UserCredentials>(
            r#"
            SELECT u.id, u.username, u.email, u.first_name, u.last_name, p.role,
                   u.created_at, u.password_hash
            FROM users u
            JOIN profiles p ON p.user_id = u.id
            WHERE u.username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(credentials)
    }

    /// create_user
    ///
    /// Inserts the identity and its profile in one transaction.
    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let id = Uuid::new_v4();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO users (id, username, email, first_name, last_name, password_hash) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.password_hash)
        .execute(&mut *tx)
        .await
        .map_err(|e| match AppError::from_write(e, "Usuário") {
            AppError::Conflict(_) => {
                AppError::Conflict("Este nome de usuário já está em uso.".to_string())
            }
            other => other,
        })?;

        sqlx::query("INSERT INTO profiles (user_id, role) VALUES ($1, $2)")
            .bind(id)
            .bind(user.role)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!("user '{}' created with role {}", user.username, user.role);

        self.get_user(id).await?.ok_or(AppError::NotFound("Usuário"))
    }

    // --- TAXONOMY ---

    async fn list_categories(&self) -> AppResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, slug, description, created_at FROM categories ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    async fn get_category(&self, id: i64) -> AppResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, slug, description, created_at FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(category)
    }

    async fn create_category(&self, input: CategoryInput) -> AppResult<Category> {
        let (name, slug) = lifecycle::taxonomy_entry(&input.name)?;

        let existing: Option<String> =
            sqlx::query_scalar("SELECT name FROM categories WHERE slug = $1")
                .bind(&slug)
                .fetch_optional(&self.pool)
                .await?;
        if let Some(existing) = existing {
            return Err(AppError::Conflict(format!(
                "A categoria '{existing}' já existe."
            )));
        }

        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name, slug, description) VALUES ($1, $2, $3) \
             RETURNING id, name, slug, description, created_at",
        )
        .bind(name)
        .bind(slug)
        .bind(input.description.trim())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_write(e, "Categoria"))?;

        tracing::info!("category '{}' created", category.slug);
        Ok(category)
    }

    async fn delete_category(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::from_delete(e, "Categoria"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_tags(&self) -> AppResult<Vec<Tag>> {
        let tags = sqlx::query_as::<_, Tag>("SELECT id, name, slug FROM tags ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(tags)
    }

    async fn get_tag(&self, id: i64) -> AppResult<Option<Tag>> {
        let tag = sqlx::query_as::<_, Tag>("SELECT id, name, slug FROM tags WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(tag)
    }

    async fn create_tag(&self, input: TagInput) -> AppResult<Tag> {
        let (name, slug) = lifecycle::taxonomy_entry(&input.name)?;

        let existing: Option<String> = sqlx::query_scalar("SELECT name FROM tags WHERE slug = $1")
            .bind(&slug)
            .fetch_optional(&self.pool)
            .await?;
        if let Some(existing) = existing {
            return Err(AppError::Conflict(format!("A tag '{existing}' já existe.")));
        }

        let tag = sqlx::query_as::<_, Tag>(
            "INSERT INTO tags (name, slug) VALUES ($1, $2) RETURNING id, name, slug",
        )
        .bind(name)
        .bind(slug)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_write(e, "Tag"))?;

        tracing::info!("tag '{}' created", tag.slug);
        Ok(tag)
    }

    async fn delete_tag(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::from_delete(e, "Tag"))?;
        Ok(result.rows_affected() > 0)
    }

    // --- POSTS ---

    /// list_posts
    ///
    /// Runs the filtered COUNT and the page query with the same WHERE clause.
    async fn list_posts(&self, query: &PostQuery, page: Pagination) -> AppResult<Page<Post>> {
        let mut count: QueryBuilder<Postgres> = QueryBuilder::new(POST_COUNT);
        query.push_conditions(&mut count);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(POST_SELECT);
        query.push_conditions(&mut builder);
        query.push_order(&mut builder);
        builder.push(" LIMIT ");
        builder.push_bind(page.limit());
        builder.push(" OFFSET ");
        builder.push_bind(page.offset());

        let posts = builder.build_query_as::<Post>().fetch_all(&self.pool).await?;
        let posts = self.finish_posts(posts).await?;
        Ok(Page::new(posts, page, total))
    }

    async fn get_post(&self, id: i64) -> AppResult<Option<Post>> {
        self.fetch_post("id", LookupKey::Id(id)).await
    }

    async fn get_post_by_slug(&self, slug: &str) -> AppResult<Option<Post>> {
        self.fetch_post("slug", LookupKey::Slug(slug)).await
    }

    async fn create_post(&self, author_id: Uuid, input: PostInput) -> AppResult<Post> {
        let (fields, tag_ids) = lifecycle::normalize_post(input, Utc::now())?;
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO posts (title, slug, content, excerpt, author_id, image, status,
                               publication_date, category_id, featured)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            "#,
        )
        .bind(&fields.title)
        .bind(&fields.slug)
        .bind(&fields.content)
        .bind(&fields.excerpt)
        .bind(author_id)
        .bind(&fields.image)
        .bind(fields.status)
        .bind(fields.publication_date)
        .bind(fields.category_id)
        .bind(fields.featured)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::from_write(e, "Post"))?;

        replace_tags(&mut *tx, TagLink::Post, id, &tag_ids).await?;
        tx.commit().await?;

        tracing::info!("post {} '{}' created ({})", id, fields.slug, fields.status);
        self.get_post(id).await?.ok_or(AppError::NotFound("Post"))
    }

    async fn update_post(&self, id: i64, patch: PostPatch) -> AppResult<Option<Post>> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, PostFields>(
            r#"
            SELECT title, slug, content, excerpt, image, status, publication_date,
                   category_id, featured
            FROM posts WHERE id = $1 FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(current) = current else {
            return Ok(None);
        };
        let (fields, tag_ids) = lifecycle::apply_post_patch(current, patch)?;

        sqlx::query(
            r#"
            UPDATE posts
            SET title = $2, slug = $3, content = $4, excerpt = $5, image = $6, status = $7,
                publication_date = $8, category_id = $9, featured = $10, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&fields.title)
        .bind(&fields.slug)
        .bind(&fields.content)
        .bind(&fields.excerpt)
        .bind(&fields.image)
        .bind(fields.status)
        .bind(fields.publication_date)
        .bind(fields.category_id)
        .bind(fields.featured)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::from_write(e, "Post"))?;

        if let Some(tag_ids) = tag_ids {
            replace_tags(&mut *tx, TagLink::Post, id, &tag_ids).await?;
        }
        tx.commit().await?;

        tracing::info!("post {} updated", id);
        self.get_post(id).await
    }

    async fn delete_post(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn increment_post_views(&self, id: i64) -> AppResult<Option<i64>> {
        let views = sqlx::query_scalar("UPDATE posts SET views = views + 1 WHERE id = $1 RETURNING views")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(views)
    }

    // --- EVENTS ---

    async fn list_events(&self, query: &EventQuery, page: Pagination) -> AppResult<Page<Event>> {
        let mut count: QueryBuilder<Postgres> = QueryBuilder::new(EVENT_COUNT);
        query.push_conditions(&mut count);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(EVENT_SELECT);
        query.push_conditions(&mut builder);
        query.push_order(&mut builder);
        builder.push(" LIMIT ");
        builder.push_bind(page.limit());
        builder.push(" OFFSET ");
        builder.push_bind(page.offset());

        let events = builder.build_query_as::<Event>().fetch_all(&self.pool).await?;
        let events = self.finish_events(events).await?;
        Ok(Page::new(events, page, total))
    }

    async fn get_event(&self, id: i64) -> AppResult<Option<Event>> {
        self.fetch_event("id", LookupKey::Id(id)).await
    }

    async fn get_event_by_slug(&self, slug: &str) -> AppResult<Option<Event>> {
        self.fetch_event("slug", LookupKey::Slug(slug)).await
    }

    async fn create_event(&self, input: EventInput) -> AppResult<Event> {
        let (fields, tag_ids) = lifecycle::normalize_event(input)?;
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO events (title, slug, description, start_date, end_date, location,
                                visibility, event_type, capacity, organizer, speakers, image,
                                status, featured, registration_required, price)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING id
            "#,
        )
        .bind(&fields.title)
        .bind(&fields.slug)
        .bind(&fields.description)
        .bind(fields.start_date)
        .bind(fields.end_date)
        .bind(&fields.location)
        .bind(fields.visibility)
        .bind(fields.event_type)
        .bind(fields.capacity)
        .bind(&fields.organizer)
        .bind(&fields.speakers)
        .bind(&fields.image)
        .bind(fields.status)
        .bind(fields.featured)
        .bind(fields.registration_required)
        .bind(&fields.price)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::from_write(e, "Evento"))?;

        replace_tags(&mut *tx, TagLink::Event, id, &tag_ids).await?;
        tx.commit().await?;

        tracing::info!("event {} '{}' created", id, fields.slug);
        self.get_event(id).await?.ok_or(AppError::NotFound("Evento"))
    }

    async fn update_event(&self, id: i64, patch: EventPatch) -> AppResult<Option<Event>> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, EventFields>(
            r#"
            SELECT title, slug, description, start_date, end_date, location, visibility,
                   event_type, capacity, organizer, speakers, image, status, featured,
                   registration_required, price
            FROM events WHERE id = $1 FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(current) = current else {
            return Ok(None);
        };
        let (fields, tag_ids) = lifecycle::apply_event_patch(current, patch)?;

        sqlx::query(
            r#"
            UPDATE events
            SET title = $2, slug = $3, description = $4, start_date = $5, end_date = $6,
                location = $7, visibility = $8, event_type = $9, capacity = $10,
                organizer = $11, speakers = $12, image = $13, status = $14, featured = $15,
                registration_required = $16, price = $17, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&fields.title)
        .bind(&fields.slug)
        .bind(&fields.description)
        .bind(fields.start_date)
        .bind(fields.end_date)
        .bind(&fields.location)
        .bind(fields.visibility)
        .bind(fields.event_type)
        .bind(fields.capacity)
        .bind(&fields.organizer)
        .bind(&fields.speakers)
        .bind(&fields.image)
        .bind(fields.status)
        .bind(fields.featured)
        .bind(fields.registration_required)
        .bind(&fields.price)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::from_write(e, "Evento"))?;

        if let Some(tag_ids) = tag_ids {
            replace_tags(&mut *tx, TagLink::Event, id, &tag_ids).await?;
        }
        tx.commit().await?;

        tracing::info!("event {} updated", id);
        self.get_event(id).await
    }

    async fn delete_event(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// register_for_event
    ///
    /// The seat is taken by a single conditional UPDATE, so concurrent
    /// registrations can never push `registered` past `capacity`. The audit
    /// row is written in the same transaction. When the UPDATE matches
    /// nothing the event is re-read only to name the reason.
    async fn register_for_event(&self, event_id: i64, user_id: Uuid) -> AppResult<Event> {
        let mut tx = self.pool.begin().await?;

        let accepted: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE events
            SET registered = registered + 1, updated_at = NOW()
            WHERE id = $1
              AND registration_required
              AND (capacity IS NULL OR registered < capacity)
            RETURNING id
            "#,
        )
        .bind(event_id)
        .fetch_optional(&mut *tx)
        .await?;

        if accepted.is_none() {
            tx.rollback().await?;
            let event = self
                .get_event(event_id)
                .await?
                .ok_or(AppError::NotFound("Evento"))?;
            lifecycle::check_registration(&event)?;
            // Seat taken between the UPDATE and the re-read.
            return Err(AppError::CapacityExceeded);
        }

        sqlx::query("INSERT INTO event_registrations (event_id, user_id) VALUES ($1, $2)")
            .bind(event_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::from_write(e, "Inscrição"))?;

        tx.commit().await?;
        tracing::info!("registration accepted: event {} user {}", event_id, user_id);

        self.get_event(event_id)
            .await?
            .ok_or(AppError::NotFound("Evento"))
    }

    // --- CONTACT MESSAGES ---

    async fn create_message(&self, input: ContactMessageInput) -> AppResult<ContactMessage> {
        let input = lifecycle::normalize_contact(input)?;

        let message = sqlx::query_as::<_, ContactMessage>(
            r#"
            INSERT INTO contact_messages (name, email, subject, message)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, subject, message, created_at, read
            "#,
        )
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.subject)
        .bind(&input.message)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("contact message {} received", message.id);
        Ok(message)
    }

    async fn list_messages(&self, page: Pagination) -> AppResult<Page<ContactMessage>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM contact_messages")
            .fetch_one(&self.pool)
            .await?;

        let messages = sqlx::query_as::<_, ContactMessage>(
            r#"
            SELECT id, name, email, subject, message, created_at, read
            FROM contact_messages
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(messages, page, total))
    }

    async fn get_message(&self, id: i64) -> AppResult<Option<ContactMessage>> {
        let message = sqlx::query_as::<_, ContactMessage>(
            "SELECT id, name, email, subject, message, created_at, read \
             FROM contact_messages WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(message)
    }

    async fn mark_message_read(&self, id: i64) -> AppResult<Option<ContactMessage>> {
        let message = sqlx::query_as::<_, ContactMessage>(
            "UPDATE contact_messages SET read = TRUE WHERE id = $1 \
             RETURNING id, name, email, subject, message, created_at, read",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(message)
    }

    async fn delete_message(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM contact_messages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_unread_messages(&self) -> AppResult<i64> {
        let unread = sqlx::query_scalar("SELECT COUNT(*) FROM contact_messages WHERE NOT read")
            .fetch_one(&self.pool)
            .await?;
        Ok(unread)
    }

    // --- DASHBOARD ---

    /// get_stats
    ///
    /// All counters in one statement, plus the most recently created posts and events.
    async fn get_stats(&self) -> AppResult<DashboardStats> {
        let counts = sqlx::query_as::<_, DashboardCounts>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM posts) AS total_posts,
                (SELECT COUNT(*) FROM posts WHERE status = 'published') AS published_posts,
                (SELECT COUNT(*) FROM posts WHERE status = 'draft') AS draft_posts,
                (SELECT COUNT(*) FROM events) AS total_events,
                (SELECT COUNT(*) FROM events WHERE start_date > NOW()) AS upcoming_events,
                (SELECT COUNT(*) FROM users) AS total_users,
                (SELECT COUNT(*) FROM contact_messages WHERE NOT read) AS unread_messages
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let recent = Pagination::new(1, DASHBOARD_RECENT);
        let recent_posts = self
            .list_posts(&PostQuery::default().ordered_by(PostOrder::CreatedDesc), recent)
            .await?
            .items
            .into_iter()
            .map(PostSummary::from)
            .collect();
        let recent_events = self
            .list_events(&EventQuery::default().ordered_by(EventOrder::CreatedDesc), recent)
            .await?
            .items
            .into_iter()
            .map(EventSummary::from)
            .collect();

        Ok(DashboardStats {
            counts,
            recent_posts,
            recent_events,
        })
    }
}
