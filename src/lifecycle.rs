use chrono::{DateTime, Utc};

use crate::{
    error::{AppError, AppResult},
    models::{
        ContactMessageInput, Event, EventFields, EventInput, EventPatch, PostFields, PostInput,
        PostPatch, PostStatus,
    },
    slug::slugify,
};

/// Number of content characters kept by an auto-derived excerpt.
pub const EXCERPT_CHARS: usize = 297;
pub const TITLE_MAX_CHARS: usize = 200;
pub const EXCERPT_MAX_CHARS: usize = 300;
pub const DEFAULT_PRICE: &str = "Gratuito";

/// derive_excerpt
///
/// Keeps a supplied excerpt when it has any non-blank text. Otherwise the
/// excerpt is the first 297 characters of `content` followed by `"..."`.
/// Empty content yields an empty excerpt.
pub fn derive_excerpt(content: &str, excerpt: Option<&str>) -> String {
    match excerpt {
        Some(text) if !text.trim().is_empty() => text.to_string(),
        _ if content.is_empty() => String::new(),
        _ => {
            let head: String = content.chars().take(EXCERPT_CHARS).collect();
            format!("{head}...")
        }
    }
}

pub fn is_post_visible(status: PostStatus, publication_date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    status == PostStatus::Published && publication_date <= now
}

pub fn validate_event_window(start: DateTime<Utc>, end: DateTime<Utc>) -> AppResult<()> {
    if end <= start {
        return Err(AppError::Validation(
            "A data de fim deve ser posterior à data de início.".to_string(),
        ));
    }
    Ok(())
}

pub fn is_full(capacity: Option<i32>, registered: i32) -> bool {
    capacity.is_some_and(|cap| registered >= cap)
}

/// Splits the free-text speakers field on commas, trimmed, blanks dropped.
pub fn speakers_list(speakers: &str) -> Vec<String> {
    speakers
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Why a registration attempt was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationRejection {
    NotRequired,
    Full,
}

impl From<RegistrationRejection> for AppError {
    fn from(rejection: RegistrationRejection) -> Self {
        match rejection {
            RegistrationRejection::NotRequired => AppError::RegistrationNotRequired,
            RegistrationRejection::Full => AppError::CapacityExceeded,
        }
    }
}

/// check_registration
///
/// Decides whether one more registration fits. `NotRequired` wins over
/// capacity. The repository applies the same predicate inside its
/// conditional UPDATE and calls this only to name the reason of a miss.
pub fn check_registration(event: &Event) -> Result<(), RegistrationRejection> {
    if !event.registration_required {
        return Err(RegistrationRejection::NotRequired);
    }
    if is_full(event.capacity, event.registered) {
        return Err(RegistrationRejection::Full);
    }
    Ok(())
}

/// A supplied slug is normalized; otherwise it comes from the title.
pub fn resolve_slug(explicit: Option<&str>, title: &str) -> AppResult<String> {
    let slug = match explicit.map(str::trim).filter(|s| !s.is_empty()) {
        Some(given) => slugify(given),
        None => slugify(title),
    };
    if slug.is_empty() {
        return Err(AppError::Validation(
            "Não foi possível gerar um slug a partir do título.".to_string(),
        ));
    }
    Ok(slug)
}

fn require_text(value: &str, field: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("O campo '{field}' é obrigatório.")));
    }
    Ok(trimmed.to_string())
}

fn check_max_chars(value: &str, field: &str, max: usize) -> AppResult<()> {
    if value.chars().count() > max {
        return Err(AppError::Validation(format!(
            "O campo '{field}' aceita no máximo {max} caracteres."
        )));
    }
    Ok(())
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn check_post(fields: &PostFields) -> AppResult<()> {
    check_max_chars(&fields.title, "title", TITLE_MAX_CHARS)?;
    check_max_chars(&fields.excerpt, "excerpt", EXCERPT_MAX_CHARS)?;
    if fields.content.trim().is_empty() {
        return Err(AppError::Validation("O campo 'content' é obrigatório.".to_string()));
    }
    Ok(())
}

/// normalize_post
///
/// Turns a create payload into the columns to insert plus the tag set.
pub fn normalize_post(input: PostInput, now: DateTime<Utc>) -> AppResult<(PostFields, Vec<i64>)> {
    let title = require_text(&input.title, "title")?;
    let slug = resolve_slug(input.slug.as_deref(), &title)?;
    let excerpt = derive_excerpt(&input.content, input.excerpt.as_deref());

    let fields = PostFields {
        title,
        slug,
        content: input.content,
        excerpt,
        image: blank_to_none(input.image),
        status: input.status,
        publication_date: input.publication_date.unwrap_or(now),
        category_id: input.category_id,
        featured: input.featured,
    };
    check_post(&fields)?;
    Ok((fields, input.tag_ids))
}

/// apply_post_patch
///
/// Merges a partial update into the stored columns and re-validates the
/// merged row. The stored slug is kept unless a new one is supplied; a blank
/// excerpt is derived again from the (possibly new) content.
pub fn apply_post_patch(
    mut current: PostFields,
    patch: PostPatch,
) -> AppResult<(PostFields, Option<Vec<i64>>)> {
    if let Some(title) = patch.title {
        current.title = require_text(&title, "title")?;
    }
    if let Some(slug) = patch.slug.filter(|s| !s.trim().is_empty()) {
        current.slug = resolve_slug(Some(&slug), &current.title)?;
    }
    if let Some(content) = patch.content {
        current.content = content;
    }
    if let Some(excerpt) = patch.excerpt {
        current.excerpt = derive_excerpt(&current.content, Some(&excerpt));
    }
    if let Some(image) = patch.image {
        current.image = blank_to_none(Some(image));
    }
    if let Some(status) = patch.status {
        current.status = status;
    }
    if let Some(date) = patch.publication_date {
        current.publication_date = date;
    }
    if let Some(category_id) = patch.category_id {
        current.category_id = category_id;
    }
    if let Some(featured) = patch.featured {
        current.featured = featured;
    }

    check_post(&current)?;
    Ok((current, patch.tag_ids))
}

fn check_event(fields: &EventFields) -> AppResult<()> {
    check_max_chars(&fields.title, "title", TITLE_MAX_CHARS)?;
    validate_event_window(fields.start_date, fields.end_date)?;
    if fields.capacity.is_some_and(|cap| cap < 0) {
        return Err(AppError::Validation(
            "A capacidade não pode ser negativa.".to_string(),
        ));
    }
    Ok(())
}

fn price_or_default(price: Option<String>) -> String {
    blank_to_none(price)
        .map(|p| p.trim().to_string())
        .unwrap_or_else(|| DEFAULT_PRICE.to_string())
}

pub fn normalize_event(input: EventInput) -> AppResult<(EventFields, Vec<i64>)> {
    let title = require_text(&input.title, "title")?;
    let slug = resolve_slug(input.slug.as_deref(), &title)?;

    let fields = EventFields {
        title,
        slug,
        description: require_text(&input.description, "description")?,
        start_date: input.start_date,
        end_date: input.end_date,
        location: require_text(&input.location, "location")?,
        visibility: input.visibility,
        event_type: input.event_type,
        capacity: input.capacity,
        organizer: require_text(&input.organizer, "organizer")?,
        speakers: input.speakers.trim().to_string(),
        image: blank_to_none(input.image),
        status: input.status,
        featured: input.featured,
        registration_required: input.registration_required,
        price: price_or_default(input.price),
    };
    check_event(&fields)?;
    Ok((fields, input.tag_ids))
}

/// apply_event_patch
///
/// Same merge as posts. Date ordering is always checked against the merged
/// row, so moving only `end_date` before the stored `start_date` fails.
pub fn apply_event_patch(
    mut current: EventFields,
    patch: EventPatch,
) -> AppResult<(EventFields, Option<Vec<i64>>)> {
    if let Some(title) = patch.title {
        current.title = require_text(&title, "title")?;
    }
    if let Some(slug) = patch.slug.filter(|s| !s.trim().is_empty()) {
        current.slug = resolve_slug(Some(&slug), &current.title)?;
    }
    if let Some(description) = patch.description {
        current.description = require_text(&description, "description")?;
    }
    if let Some(start) = patch.start_date {
        current.start_date = start;
    }
    if let Some(end) = patch.end_date {
        current.end_date = end;
    }
    if let Some(location) = patch.location {
        current.location = require_text(&location, "location")?;
    }
    if let Some(visibility) = patch.visibility {
        current.visibility = visibility;
    }
    if let Some(event_type) = patch.event_type {
        current.event_type = event_type;
    }
    if patch.capacity.is_some() || patch.clear_capacity {
        current.capacity = patch.capacity;
    }
    if let Some(organizer) = patch.organizer {
        current.organizer = require_text(&organizer, "organizer")?;
    }
    if let Some(speakers) = patch.speakers {
        current.speakers = speakers.trim().to_string();
    }
    if let Some(image) = patch.image {
        current.image = blank_to_none(Some(image));
    }
    if let Some(status) = patch.status {
        current.status = status;
    }
    if let Some(featured) = patch.featured {
        current.featured = featured;
    }
    if let Some(required) = patch.registration_required {
        current.registration_required = required;
    }
    if let Some(price) = patch.price {
        current.price = price_or_default(Some(price));
    }

    check_event(&current)?;
    Ok((current, patch.tag_ids))
}

/// Trims every field of a contact submission and rejects blanks.
pub fn normalize_contact(input: ContactMessageInput) -> AppResult<ContactMessageInput> {
    let email = require_text(&input.email, "email")?;
    if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
        return Err(AppError::Validation("Informe um e-mail válido.".to_string()));
    }
    Ok(ContactMessageInput {
        name: require_text(&input.name, "name")?,
        email,
        subject: require_text(&input.subject, "subject")?,
        message: require_text(&input.message, "message")?,
    })
}

/// Name and slug for a new category or tag.
pub fn taxonomy_entry(name: &str) -> AppResult<(String, String)> {
    let name = require_text(name, "name")?;
    let slug = slugify(&name);
    if slug.is_empty() {
        return Err(AppError::Validation(
            "O nome precisa conter letras ou números.".to_string(),
        ));
    }
    Ok((name, slug))
}
