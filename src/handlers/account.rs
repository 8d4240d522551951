use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};

use crate::{
    AppState,
    access::{Action, Resource, authorize},
    auth::{self, Identity, SESSION_COOKIE},
    error::AppError,
    flash::{Flash, IncomingFlash, OrBack, WebError, WebForm, WebIdentity, WebPage, redirect_with},
    forms::{LoginForm, RegisterForm},
    models::{FormPage, LoginRequest, NewUser, ProfilePage, User},
};

/// Where a signed-in user lands: admins on the dashboard, everyone else home.
pub fn landing_for(identity: &Identity) -> &'static str {
    if identity.is_admin() {
        "/admin/dashboard"
    } else {
        "/"
    }
}

/// Redirect that also stores the session token as a cookie.
fn signed_in_redirect(state: &AppState, user: &User, flash: Flash) -> Result<Response, WebError> {
    let (token, max_age) = auth::issue_token(user.id, &state.config).or_back("/auth/login")?;
    let cookie = auth::session_cookie(&token, max_age).or_back("/auth/login")?;

    let to = if user.is_admin() { "/admin/dashboard" } else { "/" };
    let mut response = redirect_with(to, flash);
    response.headers_mut().append(header::SET_COOKIE, cookie);
    Ok(response)
}

pub async fn login_page(WebIdentity(identity): WebIdentity, flash: IncomingFlash) -> Response {
    if identity.user().is_some() {
        return redirect_with(landing_for(&identity), Flash::info("Você já está conectado."));
    }
    WebPage::new(flash, FormPage::new("login", &["username", "password"])).into_response()
}

/// login_submit
///
/// Checks the credentials, sets the `session` cookie and sends the user to
/// their landing page with a greeting.
pub async fn login_submit(
    State(state): State<AppState>,
    WebForm(form): WebForm<LoginForm>,
) -> Result<Response, WebError> {
    let request = LoginRequest::from(form);
    let user = auth::authenticate(&state.repo, &request.username, &request.password)
        .await
        .or_back("/auth/login")?;

    tracing::info!("user '{}' signed in", user.username);
    let greeting = Flash::success(format!("Bem-vindo(a), {}!", user.full_name()));
    signed_in_redirect(&state, &user, greeting)
}

pub async fn logout() -> Response {
    let mut response = redirect_with("/", Flash::success("Logout realizado com sucesso."));
    response
        .headers_mut()
        .append(header::SET_COOKIE, auth::expired_cookie(SESSION_COOKIE));
    response
}

pub async fn register_page(WebIdentity(identity): WebIdentity, flash: IncomingFlash) -> Response {
    if identity.user().is_some() {
        return redirect_with(landing_for(&identity), Flash::info("Você já está conectado."));
    }
    WebPage::new(
        flash,
        FormPage::new(
            "register",
            &["username", "email", "first_name", "last_name", "password1", "password2"],
        ),
    )
    .into_response()
}

/// register_submit
///
/// Public sign-up. The new account is always a reader and is signed in
/// straight away.
pub async fn register_submit(
    State(state): State<AppState>,
    WebForm(form): WebForm<RegisterForm>,
) -> Result<Response, WebError> {
    let registration = form.validate().or_back("/auth/register")?;
    let password_hash = auth::hash_password(&registration.password).or_back("/auth/register")?;

    let user = state
        .repo
        .create_user(NewUser {
            username: registration.username,
            email: registration.email,
            first_name: registration.first_name,
            last_name: registration.last_name,
            password_hash,
            role: registration.role,
        })
        .await
        .or_back("/auth/register")?;

    signed_in_redirect(&state, &user, Flash::success("Conta criada com sucesso!"))
}

pub async fn profile(
    WebIdentity(identity): WebIdentity,
    flash: IncomingFlash,
    State(state): State<AppState>,
) -> Result<WebPage<ProfilePage>, WebError> {
    authorize(&identity, Resource::Profile, Action::Read).or_back("/")?;
    let me = identity.require_user().or_back("/")?;

    let user = state
        .repo
        .get_user(me.id)
        .await
        .or_back("/")?
        .ok_or(AppError::Unauthenticated)
        .or_back("/")?;

    Ok(WebPage::new(flash, ProfilePage { user }))
}
