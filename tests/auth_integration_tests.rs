mod common;

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, HeaderValue, Request, StatusCode, header, request::Parts},
};
use common::{MemoryRepo, PASSWORD, TestApp, get_as, json};
use jsonwebtoken::{EncodingKey, Header, encode};
use neabi_portal::{
    AppState,
    auth::{self, AuthUser, Claims, Identity},
    config::{AppConfig, BootstrapAdmin, Env},
    error::AppError,
    models::Role,
    repository::{Repository, RepositoryState},
};
use serde_json::json;
use std::{sync::Arc, time::SystemTime};
use uuid::Uuid;

// --- Helpers ---

fn parts_with(name: header::HeaderName, value: &str) -> Parts {
    let request = Request::builder()
        .uri("/")
        .header(name, HeaderValue::from_str(value).unwrap())
        .body(())
        .unwrap();
    request.into_parts().0
}

fn now_secs() -> usize {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize
}

fn mint(sub: Uuid, exp: usize, secret: &str) -> String {
    let claims = Claims {
        sub,
        exp,
        iat: now_secs(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

// --- Extractor Tests ---

#[tokio::test]
async fn test_bearer_token_resolves_user() {
    let app = TestApp::new();
    let state = app.state();
    let mut parts = parts_with(header::AUTHORIZATION, &app.bearer(&app.reader));

    let user = AuthUser::from_request_parts(&mut parts, &state).await.unwrap();
    assert_eq!(user.id, app.reader.id);
    assert_eq!(user.role, Role::Reader);
    assert_eq!(user.username, "leitora");
}

#[tokio::test]
async fn test_session_cookie_resolves_user() {
    let app = TestApp::new();
    let state = app.state();
    let cookie = format!("theme=dark; {}", app.session(&app.admin));
    let mut parts = parts_with(header::COOKIE, &cookie);

    let identity = Identity::from_request_parts(&mut parts, &state).await.unwrap();
    assert!(identity.is_admin());
}

#[tokio::test]
async fn test_missing_credentials_is_anonymous() {
    let app = TestApp::new();
    let state = app.state();
    let mut parts = parts_with(header::ACCEPT, "application/json");

    let identity = Identity::from_request_parts(&mut parts, &state).await.unwrap();
    assert_eq!(identity, Identity::Anonymous);

    let rejected = AuthUser::from_request_parts(&mut parts, &state).await;
    assert!(matches!(rejected, Err(AppError::Unauthenticated)));
}

#[tokio::test]
async fn test_expired_token_is_anonymous() {
    let app = TestApp::new();
    let state = app.state();
    let token = mint(app.admin.id, now_secs() - 3600, &app.config.jwt_secret);
    let mut parts = parts_with(header::AUTHORIZATION, &format!("Bearer {token}"));

    let identity = Identity::from_request_parts(&mut parts, &state).await.unwrap();
    assert_eq!(identity, Identity::Anonymous);
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_rejected() {
    let app = TestApp::new();
    let state = app.state();
    let token = mint(app.admin.id, now_secs() + 3600, "outro-segredo");
    let mut parts = parts_with(header::AUTHORIZATION, &format!("Bearer {token}"));

    let rejected = AuthUser::from_request_parts(&mut parts, &state).await;
    assert!(matches!(rejected, Err(AppError::Unauthenticated)));
}

#[tokio::test]
async fn test_token_for_unknown_user_is_anonymous() {
    let app = TestApp::new();
    let state = app.state();
    let token = mint(Uuid::new_v4(), now_secs() + 3600, &app.config.jwt_secret);
    let mut parts = parts_with(header::AUTHORIZATION, &format!("Bearer {token}"));

    let identity = Identity::from_request_parts(&mut parts, &state).await.unwrap();
    assert_eq!(identity, Identity::Anonymous);
}

#[tokio::test]
async fn test_x_user_id_only_in_local() {
    let app = TestApp::new();
    let header_name = header::HeaderName::from_static("x-user-id");

    let mut parts = parts_with(header_name.clone(), &app.admin.id.to_string());
    let identity = Identity::from_request_parts(&mut parts, &app.state()).await.unwrap();
    assert!(identity.is_admin());

    let production = AppState {
        config: AppConfig {
            env: Env::Production,
            ..app.config.clone()
        },
        ..app.state()
    };
    let mut parts = parts_with(header_name, &app.admin.id.to_string());
    let identity = Identity::from_request_parts(&mut parts, &production).await.unwrap();
    assert_eq!(identity, Identity::Anonymous);
}

// --- Token Endpoint ---

#[tokio::test]
async fn test_token_endpoint_issues_usable_token() {
    let app = TestApp::new();
    let res = app
        .send(json(
            "POST",
            "/api/auth/token",
            None,
            json!({ "username": "admin", "password": PASSWORD }),
        ))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["token_type"], "Bearer");
    assert_eq!(res.body["expires_in"], 24 * 3600);
    assert_eq!(res.body["user"]["role"], "admin");

    let token = res.body["access_token"].as_str().unwrap();
    let res = app
        .send(get_as("/api/contact-messages", &format!("Bearer {token}")))
        .await;
    assert_eq!(res.status, StatusCode::OK);
}

#[tokio::test]
async fn test_token_endpoint_rejects_bad_credentials() {
    let app = TestApp::new();
    let res = app
        .send(json(
            "POST",
            "/api/auth/token",
            None,
            json!({ "username": "ninguem", "password": PASSWORD }),
        ))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["error"], "Usuário ou senha inválidos.");
}

// --- Primitives ---

#[test]
fn test_password_hash_roundtrip() {
    let hash = auth::hash_password("correta-123").unwrap();
    assert_ne!(hash, "correta-123");
    assert!(auth::verify_password("correta-123", &hash));
    assert!(!auth::verify_password("errada-123", &hash));
    assert!(!auth::verify_password("qualquer", "not-a-phc-string"));
}

#[test]
fn test_read_cookie() {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::COOKIE,
        HeaderValue::from_static("a=1; session=abc.def; flash=xyz"),
    );
    assert_eq!(auth::read_cookie(&headers, "session").as_deref(), Some("abc.def"));
    assert_eq!(auth::read_cookie(&headers, "flash").as_deref(), Some("xyz"));
    assert_eq!(auth::read_cookie(&headers, "missing"), None);
}

#[test]
fn test_issued_token_decodes_to_subject() {
    let config = AppConfig::default();
    let id = Uuid::new_v4();
    let (token, ttl) = auth::issue_token(id, &config).unwrap();
    assert_eq!(ttl, config.session_ttl_hours * 3600);
    assert_eq!(auth::decode_token(&token, &config), Some(id));
}

#[test]
fn test_unusable_session_lifetime_is_an_error() {
    for hours in [i64::MAX, 0, -5] {
        let config = AppConfig {
            session_ttl_hours: hours,
            ..AppConfig::default()
        };
        assert!(matches!(
            auth::issue_token(Uuid::new_v4(), &config),
            Err(AppError::Internal(_))
        ));
    }
}

// --- Bootstrap ---

#[tokio::test]
async fn test_bootstrap_admin_is_created_once() {
    let repo = Arc::new(MemoryRepo::new());
    let state_repo = repo.clone() as RepositoryState;
    let config = AppConfig {
        bootstrap_admin: Some(BootstrapAdmin {
            username: "coordenacao".to_string(),
            password: "senha-inicial".to_string(),
            email: "coord@neabi.test".to_string(),
        }),
        ..AppConfig::default()
    };

    auth::bootstrap_admin(&state_repo, &config).await.unwrap();
    auth::bootstrap_admin(&state_repo, &config).await.unwrap();

    let credentials = repo.find_credentials("coordenacao").await.unwrap().unwrap();
    assert!(credentials.user.is_admin());
    assert!(auth::verify_password("senha-inicial", &credentials.password_hash));

    let user = auth::authenticate(&state_repo, "coordenacao", "senha-inicial")
        .await
        .unwrap();
    assert_eq!(user.id, credentials.user.id);
}
