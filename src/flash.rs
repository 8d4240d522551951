use axum::{
    Form, Json,
    extract::{FromRef, FromRequest, FromRequestParts, Request},
    http::{HeaderMap, HeaderValue, StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::convert::Infallible;
use utoipa::ToSchema;

use crate::{
    auth::{Identity, expired_cookie, read_cookie},
    config::AppConfig,
    error::AppError,
    repository::RepositoryState,
};

pub const FLASH_COOKIE: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Error,
    Info,
}

/// Flash
///
/// A one-shot message carried across a redirect in the `flash` cookie and
/// shown by the next page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Info,
            message: message.into(),
        }
    }

    pub fn encode(&self) -> String {
        let json = serde_json::to_vec(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    pub fn decode(raw: &str) -> Option<Self> {
        let bytes = URL_SAFE_NO_PAD.decode(raw).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    fn cookie(&self) -> Option<HeaderValue> {
        HeaderValue::from_str(&format!(
            "{FLASH_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax",
            self.encode()
        ))
        .ok()
    }
}

/// IncomingFlash
///
/// The flash left by the previous response, if any. Never rejects.
#[derive(Debug, Clone, Default)]
pub struct IncomingFlash(pub Option<Flash>);

impl<S> FromRequestParts<S> for IncomingFlash
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(IncomingFlash(
            read_cookie(&parts.headers, FLASH_COOKIE).and_then(|raw| Flash::decode(&raw)),
        ))
    }
}

/// WebPage
///
/// A page context rendered as JSON, with the pending flash attached and
/// consumed (the cookie is expired on the way out).
#[derive(Debug, Clone, Serialize)]
pub struct WebPage<T> {
    pub flash: Option<Flash>,
    #[serde(flatten)]
    pub context: T,
}

impl<T> WebPage<T> {
    pub fn new(flash: IncomingFlash, context: T) -> Self {
        Self {
            flash: flash.0,
            context,
        }
    }
}

impl<T: Serialize> IntoResponse for WebPage<T> {
    fn into_response(self) -> Response {
        let had_flash = self.flash.is_some();
        let mut response = Json(self).into_response();
        if had_flash {
            response
                .headers_mut()
                .append(header::SET_COOKIE, expired_cookie(FLASH_COOKIE));
        }
        response
    }
}

/// redirect_with
///
/// `303 See Other` to `to`, leaving `flash` for the next page.
pub fn redirect_with(to: &str, flash: Flash) -> Response {
    let mut response = (StatusCode::SEE_OTHER, [(header::LOCATION, to.to_string())]).into_response();
    if let Some(cookie) = flash.cookie() {
        response.headers_mut().append(header::SET_COOKIE, cookie);
    }
    response
}

/// WebError
///
/// An `AppError` raised behind a web (form) route. It answers with a redirect
/// and a flash instead of a JSON body:
/// - `Unauthenticated` goes to `/auth/login`,
/// - `PermissionDenied`, `NotFound` and internal failures go to `/`,
/// - anything else goes back to `back`.
#[derive(Debug)]
pub struct WebError {
    pub error: AppError,
    pub back: String,
}

impl WebError {
    pub fn new(error: AppError, back: impl Into<String>) -> Self {
        Self {
            error,
            back: back.into(),
        }
    }

    pub fn target(&self) -> &str {
        match &self.error {
            AppError::Unauthenticated => "/auth/login",
            AppError::PermissionDenied | AppError::NotFound(_) => "/",
            e if e.is_internal() => "/",
            _ => &self.back,
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        redirect_with(self.target(), Flash::error(self.error.public_message()))
    }
}

/// Attaches the "go back" location to a failing web operation.
pub trait OrBack<T> {
    fn or_back(self, back: &str) -> Result<T, WebError>;
}

impl<T> OrBack<T> for Result<T, AppError> {
    fn or_back(self, back: &str) -> Result<T, WebError> {
        self.map_err(|error| WebError::new(error, back))
    }
}

/// Path of the page that submitted the request, taken from `Referer`.
/// Only same-site paths are returned.
pub fn referer_path(headers: &HeaderMap) -> Option<String> {
    let referer = headers.get(header::REFERER)?.to_str().ok()?;
    let path = match referer.split_once("://") {
        Some((_, rest)) => &rest[rest.find('/')?..],
        None => referer,
    };
    (path.starts_with('/') && !path.starts_with("//")).then(|| path.to_string())
}

/// WebForm
///
/// `axum::Form` for web routes. A body that cannot be decoded becomes a
/// `Validation` flash and a redirect to the submitting page instead of a
/// plain-text 422. Missing fields are left to the form's own validation.
#[derive(Debug, Clone)]
pub struct WebForm<T>(pub T);

impl<T, S> FromRequest<S> for WebForm<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let back = referer_path(request.headers()).unwrap_or_else(|| "/".to_string());

        match Form::<T>::from_request(request, state).await {
            Ok(Form(value)) => Ok(WebForm(value)),
            Err(rejection) => {
                tracing::debug!("form rejected: {}", rejection.body_text());
                Err(WebError::new(
                    AppError::Validation("Formulário inválido ou incompleto.".to_string()),
                    back,
                ))
            }
        }
    }
}

/// WebIdentity
///
/// `Identity` for web routes: a failure while resolving the session answers
/// with a redirect and a flash like every other web error.
#[derive(Debug, Clone)]
pub struct WebIdentity(pub Identity);

impl<S> FromRequestParts<S> for WebIdentity
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Identity::from_request_parts(parts, state)
            .await
            .map(WebIdentity)
            .map_err(|error| WebError::new(error, "/"))
    }
}
