use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, HeaderValue, header, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    error::{AppError, AppResult},
    models::{NewUser, Role, User},
    repository::RepositoryState,
};

/// Name of the cookie carrying the session JWT for the web boundary.
pub const SESSION_COOKIE: &str = "session";

/// Claims
///
/// Payload of the session token. Signed with `JWT_SECRET` (HS256) and
/// validated on every request that carries one.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The user id (`users.id`). The role is never read from the token;
    /// it is loaded from `profiles` on each request.
    pub sub: Uuid,
    pub exp: usize,
    pub iat: usize,
}

/// AuthUser
///
/// The resolved identity of a signed-in caller. Using it as a handler
/// argument makes the route authenticated-only.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
    pub username: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            role: user.role,
            username: user.username,
        }
    }
}

/// Identity
///
/// The explicit caller identity passed into every core operation.
/// Anonymous callers are a value, not a missing session.
#[derive(Debug, Clone, PartialEq)]
pub enum Identity {
    Anonymous,
    User(AuthUser),
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        matches!(self, Identity::User(user) if user.is_admin())
    }

    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            Identity::User(user) => Some(user),
            Identity::Anonymous => None,
        }
    }

    pub fn require_user(&self) -> AppResult<&AuthUser> {
        self.user().ok_or(AppError::Unauthenticated)
    }
}

impl From<Option<AuthUser>> for Identity {
    fn from(user: Option<AuthUser>) -> Self {
        user.map(Identity::User).unwrap_or(Identity::Anonymous)
    }
}

/// read_cookie
///
/// Returns the value of the named cookie from the `Cookie` request headers.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// decode_token
///
/// Validates signature and expiry. Returns `None` for any invalid token;
/// the caller decides whether that means anonymous or 401.
pub fn decode_token(token: &str, config: &AppConfig) -> Option<Uuid> {
    let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
    let mut validation = Validation::default();
    validation.validate_exp = true;

    match decode::<Claims>(token, &decoding_key, &validation) {
        Ok(data) => Some(data.claims.sub),
        Err(e) => {
            tracing::debug!("rejected session token: {:?}", e.kind());
            None
        }
    }
}

/// resolve_user
///
/// Resolution order:
/// 1. `x-user-id` header, only when `Env::Local`.
/// 2. `Authorization: Bearer <jwt>`.
/// 3. The `session` cookie set by the web login.
///
/// A token whose subject no longer exists resolves to `None`.
pub async fn resolve_user(
    headers: &HeaderMap,
    repo: &RepositoryState,
    config: &AppConfig,
) -> AppResult<Option<AuthUser>> {
    if config.env == Env::Local {
        if let Some(user_id) = headers
            .get("x-user-id")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value).ok())
        {
            if let Some(user) = repo.get_user(user_id).await? {
                return Ok(Some(user.into()));
            }
        }
    }

    let Some(token) = bearer_token(headers).or_else(|| read_cookie(headers, SESSION_COOKIE)) else {
        return Ok(None);
    };
    let Some(user_id) = decode_token(&token, config) else {
        return Ok(None);
    };

    Ok(repo.get_user(user_id).await?.map(AuthUser::from))
}

/// AuthUser extractor
///
/// Rejects with `AppError::Unauthenticated` (401 JSON) when no valid
/// identity is present. Web routes that need a redirect instead take
/// `Identity` and call `require_user`.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        resolve_user(&parts.headers, &repo, &config)
            .await?
            .ok_or(AppError::Unauthenticated)
    }
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        Ok(resolve_user(&parts.headers, &repo, &config).await?.into())
    }
}

/// issue_token
///
/// Mints the session JWT for `user_id`. Returns the token and its lifetime
/// in seconds.
pub fn issue_token(user_id: Uuid, config: &AppConfig) -> AppResult<(String, i64)> {
    let now = Utc::now();
    let (ttl, expires_at) = Duration::try_hours(config.session_ttl_hours)
        .filter(|ttl| *ttl > Duration::zero())
        .and_then(|ttl| now.checked_add_signed(ttl).map(|at| (ttl, at)))
        .ok_or_else(|| {
            AppError::Internal(format!(
                "invalid session lifetime: {} hours",
                config.session_ttl_hours
            ))
        })?;
    let claims = Claims {
        sub: user_id,
        iat: now.timestamp() as usize,
        exp: expires_at.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("token encoding failed: {e}")))?;

    Ok((token, ttl.num_seconds()))
}

pub fn session_cookie(token: &str, max_age_secs: i64) -> AppResult<HeaderValue> {
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}"
    ))
    .map_err(|e| AppError::Internal(format!("invalid session cookie: {e}")))
}

pub fn expired_cookie(name: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("{name}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"))
        .unwrap_or_else(|_| HeaderValue::from_static("session=; Path=/; Max-Age=0"))
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!("stored password hash is malformed: {}", e);
            false
        }
    }
}

/// authenticate
///
/// Checks a username/password pair. Unknown users and wrong passwords give
/// the same `Validation` error.
pub async fn authenticate(repo: &RepositoryState, username: &str, password: &str) -> AppResult<User> {
    let invalid = || AppError::Validation("Usuário ou senha inválidos.".to_string());

    let credentials = repo
        .find_credentials(username.trim())
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(password, &credentials.password_hash) {
        return Err(invalid());
    }
    Ok(credentials.user)
}

/// bootstrap_admin
///
/// Creates the configured admin account at startup when the username is
/// not taken yet. An existing account is left untouched, role included.
pub async fn bootstrap_admin(repo: &RepositoryState, config: &AppConfig) -> AppResult<()> {
    let Some(admin) = &config.bootstrap_admin else {
        return Ok(());
    };

    if repo.find_credentials(&admin.username).await?.is_some() {
        tracing::debug!("bootstrap admin '{}' already exists", admin.username);
        return Ok(());
    }

    let user = repo
        .create_user(NewUser {
            username: admin.username.clone(),
            email: admin.email.clone(),
            first_name: String::new(),
            last_name: String::new(),
            password_hash: hash_password(&admin.password)?,
            role: Role::Admin,
        })
        .await?;

    tracing::info!("bootstrap admin '{}' created ({})", user.username, user.id);
    Ok(())
}
