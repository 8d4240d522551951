use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, QueryBuilder};
use utoipa::{IntoParams, ToSchema};

use crate::{
    auth::Identity,
    error::{AppError, AppResult},
    models::{EventStatus, EventType, PostStatus, Visibility},
};

/// Filter value meaning "no constraint".
pub const ALL_SENTINEL: &str = "Todos";

pub const BLOG_PAGE_SIZE: i64 = 9;
pub const EVENTS_PAGE_SIZE: i64 = 6;
pub const ADMIN_PAGE_SIZE: i64 = 10;
pub const API_PAGE_SIZE: i64 = 10;

pub const FEATURED_POSTS_LIMIT: i64 = 3;
pub const FEATURED_EVENTS_LIMIT: i64 = 2;
pub const UPCOMING_EVENTS_LIMIT: i64 = 5;
pub const RECENT_POSTS_LIMIT: i64 = 3;

/// facet
///
/// Normalizes a raw facet value. Missing, blank and `"Todos"` all mean
/// "no constraint".
pub fn facet(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != ALL_SENTINEL)
        .map(str::to_string)
}

fn parse_facet<T>(value: Option<&str>) -> AppResult<Option<T>>
where
    T: std::str::FromStr<Err = AppError>,
{
    facet(value).map(|v| v.parse()).transpose()
}

fn parse_flag(value: Option<&str>) -> AppResult<Option<bool>> {
    match facet(value).as_deref() {
        None => Ok(None),
        Some("true" | "1" | "on" | "True") => Ok(Some(true)),
        Some("false" | "0" | "off" | "False") => Ok(Some(false)),
        Some(other) => Err(AppError::Validation(format!(
            "Valor inválido para featured: '{other}'."
        ))),
    }
}

/// Escapes LIKE wildcards so user input only ever matches literally.
pub fn like_pattern(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 2);
    escaped.push('%');
    for ch in text.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

/// Pagination
///
/// A 1-based page request. Out-of-range pages are not an error: anything
/// below 1 becomes 1, anything past the end yields an empty page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub page_size: i64,
}

impl Pagination {
    pub fn new(page: i64, page_size: i64) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }

    /// Lenient parse of the `page` query parameter; garbage means page 1.
    pub fn from_param(page: Option<&str>, page_size: i64) -> Self {
        let page = page.and_then(|p| p.trim().parse::<i64>().ok()).unwrap_or(1);
        Self::new(page, page_size)
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }
}

/// Page
///
/// The ordered page envelope returned by every listing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub num_pages: i64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, pagination: Pagination, total: i64) -> Self {
        let num_pages = ((total + pagination.page_size - 1) / pagination.page_size).max(1);
        Self {
            items,
            page: pagination.page,
            page_size: pagination.page_size,
            total,
            num_pages,
            has_next: pagination.page < num_pages,
            has_previous: pagination.page > 1,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total: self.total,
            num_pages: self.num_pages,
            has_next: self.has_next,
            has_previous: self.has_previous,
        }
    }
}

/// `?page=` only, for listings without facets.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    pub page: Option<String>,
}

/// Raw post listing parameters, as they come from the query string.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PostParams {
    /// Matches title, excerpt or author name.
    pub search: Option<String>,
    /// Exact category name; "Todos" means any.
    pub category: Option<String>,
    pub status: Option<String>,
    pub featured: Option<String>,
    pub page: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EventParams {
    /// Matches title, description or organizer.
    pub search: Option<String>,
    /// Free-text facet over the same columns as `search`.
    pub category: Option<String>,
    #[serde(alias = "type")]
    pub event_type: Option<String>,
    pub visibility: Option<String>,
    pub status: Option<String>,
    pub featured: Option<String>,
    pub page: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostOrder {
    #[default]
    PublicationDesc,
    CreatedDesc,
}

/// PostQuery
///
/// Validated post filters plus the visibility scope of the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub status: Option<PostStatus>,
    pub featured: Option<bool>,
    /// Set for non-admins: only published posts dated at or before this instant.
    pub visible_at: Option<DateTime<Utc>>,
    pub order: PostOrder,
}

impl PostQuery {
    /// Unfiltered query with the caller's scope applied.
    pub fn scoped(identity: &Identity, now: DateTime<Utc>) -> Self {
        Self {
            visible_at: (!identity.is_admin()).then_some(now),
            ..Self::default()
        }
    }

    pub fn from_params(
        params: &PostParams,
        identity: &Identity,
        now: DateTime<Utc>,
    ) -> AppResult<Self> {
        Ok(Self {
            search: facet(params.search.as_deref()),
            category: facet(params.category.as_deref()),
            status: parse_facet(params.status.as_deref())?,
            featured: parse_flag(params.featured.as_deref())?,
            ..Self::scoped(identity, now)
        })
    }

    pub fn featured(mut self) -> Self {
        self.featured = Some(true);
        self
    }

    pub fn ordered_by(mut self, order: PostOrder) -> Self {
        self.order = order;
        self
    }

    /// push_conditions
    ///
    /// Appends the WHERE clause. Expects `posts p`, `users u` (author) and
    /// `categories c` in the FROM list.
    pub fn push_conditions(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        builder.push(" WHERE TRUE");

        if let Some(now) = self.visible_at {
            builder.push(" AND p.status = ");
            builder.push_bind(PostStatus::Published);
            builder.push(" AND p.publication_date <= ");
            builder.push_bind(now);
        }
        if let Some(search) = &self.search {
            let pattern = like_pattern(search);
            builder.push(" AND (p.title ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR p.excerpt ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR u.username ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR u.first_name ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR u.last_name ILIKE ");
            builder.push_bind(pattern);
            builder.push(")");
        }
        if let Some(category) = &self.category {
            builder.push(" AND c.name = ");
            builder.push_bind(category.clone());
        }
        if let Some(status) = self.status {
            builder.push(" AND p.status = ");
            builder.push_bind(status);
        }
        if let Some(featured) = self.featured {
            builder.push(" AND p.featured = ");
            builder.push_bind(featured);
        }
    }

    pub fn push_order(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        match self.order {
            PostOrder::PublicationDesc => builder.push(" ORDER BY p.publication_date DESC, p.id DESC"),
            PostOrder::CreatedDesc => builder.push(" ORDER BY p.created_at DESC, p.id DESC"),
        };
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventOrder {
    #[default]
    StartAsc,
    CreatedDesc,
}

/// EventQuery
///
/// Validated event filters. Non-admin callers only ever see public events
/// that have not started yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub event_type: Option<EventType>,
    pub visibility: Option<Visibility>,
    pub status: Option<EventStatus>,
    pub featured: Option<bool>,
    /// Set for non-admins: public events starting strictly after this instant.
    pub upcoming_after: Option<DateTime<Utc>>,
    pub order: EventOrder,
}

impl EventQuery {
    pub fn scoped(identity: &Identity, now: DateTime<Utc>) -> Self {
        Self {
            upcoming_after: (!identity.is_admin()).then_some(now),
            ..Self::default()
        }
    }

    pub fn from_params(
        params: &EventParams,
        identity: &Identity,
        now: DateTime<Utc>,
    ) -> AppResult<Self> {
        Ok(Self {
            search: facet(params.search.as_deref()),
            category: facet(params.category.as_deref()),
            event_type: parse_facet(params.event_type.as_deref())?,
            visibility: parse_facet(params.visibility.as_deref())?,
            status: parse_facet(params.status.as_deref())?,
            featured: parse_flag(params.featured.as_deref())?,
            ..Self::scoped(identity, now)
        })
    }

    /// Public + upcoming, whoever is asking. Used by the upcoming sub-list.
    pub fn upcoming(mut self, now: DateTime<Utc>) -> Self {
        self.upcoming_after = Some(now);
        self
    }

    pub fn featured(mut self) -> Self {
        self.featured = Some(true);
        self
    }

    pub fn ordered_by(mut self, order: EventOrder) -> Self {
        self.order = order;
        self
    }

    fn push_text_match(builder: &mut QueryBuilder<'_, Postgres>, text: &str) {
        let pattern = like_pattern(text);
        builder.push(" AND (e.title ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR e.description ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR e.organizer ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }

    /// Appends the WHERE clause. Expects `events e` in the FROM list.
    pub fn push_conditions(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        builder.push(" WHERE TRUE");

        if let Some(now) = self.upcoming_after {
            builder.push(" AND e.visibility = ");
            builder.push_bind(Visibility::Public);
            builder.push(" AND e.start_date > ");
            builder.push_bind(now);
        }
        if let Some(search) = &self.search {
            Self::push_text_match(builder, search);
        }
        if let Some(category) = &self.category {
            Self::push_text_match(builder, category);
        }
        if let Some(event_type) = self.event_type {
            builder.push(" AND e.event_type = ");
            builder.push_bind(event_type);
        }
        if let Some(visibility) = self.visibility {
            builder.push(" AND e.visibility = ");
            builder.push_bind(visibility);
        }
        if let Some(status) = self.status {
            builder.push(" AND e.status = ");
            builder.push_bind(status);
        }
        if let Some(featured) = self.featured {
            builder.push(" AND e.featured = ");
            builder.push_bind(featured);
        }
    }

    pub fn push_order(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        match self.order {
            EventOrder::StartAsc => builder.push(" ORDER BY e.start_date ASC, e.id ASC"),
            EventOrder::CreatedDesc => builder.push(" ORDER BY e.created_at DESC, e.id DESC"),
        };
    }
}
