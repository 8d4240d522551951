use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::{
        CategoryInput, ContactMessageInput, EventInput, LoginRequest, PostInput, Role, TagInput,
    },
};

pub const MIN_PASSWORD_CHARS: usize = 8;

/// HTML checkboxes send `on` when ticked and nothing otherwise.
pub fn checkbox(value: Option<&str>) -> bool {
    matches!(value.map(str::trim), Some("on" | "true" | "1"))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// parse_datetime
///
/// Accepts RFC 3339 or the `datetime-local` widget format
/// (`YYYY-MM-DDTHH:MM`, optional seconds), the latter read as UTC.
pub fn parse_datetime(value: &str, field: &str) -> AppResult<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| AppError::Validation(format!("Data inválida no campo '{field}'.")))
}

fn parse_id(value: &str, field: &str) -> AppResult<i64> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::Validation(format!("Valor inválido no campo '{field}'.")))
}

/// Comma-separated tag ids, as sent by a multi-select serialized by the page.
pub fn parse_tag_ids(value: Option<&str>) -> AppResult<Vec<i64>> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| parse_id(id, "tags"))
        .collect()
}

fn parse_choice<T>(value: Option<&str>) -> AppResult<Option<T>>
where
    T: std::str::FromStr<Err = AppError>,
{
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::parse)
        .transpose()
}

/// Back-office post form (create and edit).
///
/// Form structs default every field, so a missing input is reported by the
/// field checks below instead of failing to decode.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostForm {
    pub title: String,
    pub slug: Option<String>,
    pub content: String,
    pub excerpt: Option<String>,
    pub image: Option<String>,
    pub status: Option<String>,
    pub publication_date: Option<String>,
    pub category: String,
    pub tags: Option<String>,
    pub featured: Option<String>,
}

impl PostForm {
    pub fn into_input(self) -> AppResult<PostInput> {
        Ok(PostInput {
            category_id: parse_id(&self.category, "category")?,
            tag_ids: parse_tag_ids(self.tags.as_deref())?,
            status: parse_choice(self.status.as_deref())?.unwrap_or_default(),
            publication_date: non_blank(self.publication_date)
                .map(|d| parse_datetime(&d, "publication_date"))
                .transpose()?,
            featured: checkbox(self.featured.as_deref()),
            title: self.title,
            slug: non_blank(self.slug),
            content: self.content,
            excerpt: non_blank(self.excerpt),
            image: non_blank(self.image),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EventForm {
    pub title: String,
    pub slug: Option<String>,
    pub description: String,
    pub start_date: String,
    pub end_date: String,
    pub location: String,
    pub visibility: Option<String>,
    pub event_type: Option<String>,
    pub capacity: Option<String>,
    pub organizer: String,
    pub speakers: Option<String>,
    pub image: Option<String>,
    pub status: Option<String>,
    pub featured: Option<String>,
    pub registration_required: Option<String>,
    pub price: Option<String>,
    pub tags: Option<String>,
}

impl EventForm {
    /// An unticked `registration_required` box means `false`; an empty
    /// capacity means unlimited.
    pub fn into_input(self) -> AppResult<EventInput> {
        let capacity = non_blank(self.capacity)
            .map(|c| {
                c.parse::<i32>().map_err(|_| {
                    AppError::Validation("Valor inválido no campo 'capacity'.".to_string())
                })
            })
            .transpose()?;

        Ok(EventInput {
            start_date: parse_datetime(&self.start_date, "start_date")?,
            end_date: parse_datetime(&self.end_date, "end_date")?,
            visibility: parse_choice(self.visibility.as_deref())?.unwrap_or_default(),
            event_type: parse_choice(self.event_type.as_deref())?.unwrap_or_default(),
            status: parse_choice(self.status.as_deref())?.unwrap_or_default(),
            tag_ids: parse_tag_ids(self.tags.as_deref())?,
            featured: checkbox(self.featured.as_deref()),
            registration_required: checkbox(self.registration_required.as_deref()),
            capacity,
            title: self.title,
            slug: non_blank(self.slug),
            description: self.description,
            location: self.location,
            organizer: self.organizer,
            speakers: self.speakers.unwrap_or_default(),
            image: non_blank(self.image),
            price: non_blank(self.price),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl From<ContactForm> for ContactMessageInput {
    fn from(form: ContactForm) -> Self {
        Self {
            name: form.name,
            email: form.email,
            subject: form.subject,
            message: form.message,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl From<LoginForm> for LoginRequest {
    fn from(form: LoginForm) -> Self {
        Self {
            username: form.username,
            password: form.password,
        }
    }
}

/// Public sign-up form. Always creates a `reader`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password1: String,
    pub password2: String,
}

/// A validated sign-up, before the password is hashed.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub role: Role,
}

impl RegisterForm {
    pub fn validate(self) -> AppResult<Registration> {
        let username = self.username.trim().to_string();
        if username.is_empty()
            || !username
                .chars()
                .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '-' | '@' | '+'))
        {
            return Err(AppError::Validation(
                "Nome de usuário inválido.".to_string(),
            ));
        }

        let email = self.email.trim().to_string();
        if !email.contains('@') {
            return Err(AppError::Validation("Informe um e-mail válido.".to_string()));
        }
        if self.password1 != self.password2 {
            return Err(AppError::Validation("As senhas não coincidem.".to_string()));
        }
        if self.password1.chars().count() < MIN_PASSWORD_CHARS {
            return Err(AppError::Validation(format!(
                "A senha deve ter pelo menos {MIN_PASSWORD_CHARS} caracteres."
            )));
        }

        Ok(Registration {
            username,
            email,
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            password: self.password1,
            role: Role::Reader,
        })
    }
}

/// Category/tag creation form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NameForm {
    pub name: String,
    pub description: Option<String>,
}

impl From<NameForm> for CategoryInput {
    fn from(form: NameForm) -> Self {
        Self {
            name: form.name,
            description: form.description.unwrap_or_default().trim().to_string(),
        }
    }
}

impl From<NameForm> for TagInput {
    fn from(form: NameForm) -> Self {
        Self { name: form.name }
    }
}
