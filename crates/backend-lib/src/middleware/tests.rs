use super::*;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::Extension,
    http::{Method, Request, StatusCode},
    routing::get,
    Router,
};
use chrono::{Duration, Utc};
use forum_common::ProfileUpdate;
use tower::ServiceExt;

use crate::account::Account;
use crate::auth::{encode, hash_password};
use crate::config::Settings;
use crate::error::AppError;
use crate::router::create_router_with;
use crate::storage::{AccountStore, MemoryAccountStore};
use crate::AppState;

struct TestApp<S = MemoryAccountStore> {
    state: Arc<AppState<S>>,
    router: Router,
    forum_hits: Arc<AtomicUsize>,
}

/// Store whose reads fail as if the backing disk went away
struct UnreadableStore;

#[async_trait]
impl AccountStore for UnreadableStore {
    async fn exists(&self, _login: &str) -> Result<bool, AppError> {
        Err(io::Error::other("disk unavailable").into())
    }

    async fn get(&self, _login: &str) -> Result<Option<Account>, AppError> {
        Err(io::Error::other("disk unavailable").into())
    }

    async fn put(&self, _account: &Account) -> Result<(), AppError> {
        Ok(())
    }

    async fn delete(&self, _account: &Account) -> Result<(), AppError> {
        Ok(())
    }
}

fn test_app_with(settings: Settings) -> TestApp {
    test_app_over(MemoryAccountStore::new(), settings)
}

fn test_app_over<S: AccountStore + 'static>(storage: S, settings: Settings) -> TestApp<S> {
    let state = Arc::new(AppState::new(storage, &settings).unwrap());
    let forum_hits = Arc::new(AtomicUsize::new(0));

    let posts_hits = forum_hits.clone();
    let comments_hits = forum_hits.clone();
    let forum: Router<Arc<AppState<S>>> = Router::new()
        .route(
            "/forum/posts",
            get(move || {
                let hits = posts_hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    "posts"
                }
            }),
        )
        .route(
            "/forum/comments",
            get(move |Extension(caller): Extension<AuthenticatedLogin>| {
                let hits = comments_hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    caller.0
                }
            }),
        );

    let router = create_router_with(state.clone(), forum);
    TestApp {
        state,
        router,
        forum_hits,
    }
}

fn test_app() -> TestApp {
    test_app_with(Settings::default())
}

async fn register(app: &TestApp, login: &str, password: &str) {
    app.state
        .accounts
        .register(ProfileUpdate::default(), &encode(login, password))
        .await
        .unwrap();
}

async fn send<S>(
    app: &TestApp<S>,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, String) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", token);
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[test]
fn test_route_classification() {
    assert!(requires_authentication(&Method::GET, "/account/login"));
    assert!(requires_authentication(&Method::PUT, "/account"));
    assert!(requires_authentication(&Method::DELETE, "/account/user/bob"));
    assert!(!requires_authentication(&Method::POST, "/account"));
    assert!(!requires_authentication(&Method::POST, "/account/anything"));

    assert!(requires_authentication(&Method::GET, "/forum/comments"));
    assert!(requires_authentication(&Method::POST, "/forum"));
    assert!(!requires_authentication(&Method::GET, "/forum/posts"));
    assert!(!requires_authentication(&Method::DELETE, "/forum/posts/42"));

    assert!(!requires_authentication(&Method::GET, "/health"));
    assert!(!requires_authentication(&Method::GET, "/"));
}

#[tokio::test]
async fn test_public_routes_pass_without_token() {
    let app = test_app();

    let (status, body) = send(&app, Method::GET, "/forum/posts", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "posts");

    let (status, _) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_missing_token_is_rejected_and_not_forwarded() {
    let app = test_app();

    let (status, _) = send(&app, Method::GET, "/forum/comments", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.forum_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_malformed_token_is_unauthorized() {
    let app = test_app();

    for token in ["Basic !!!", "Bearer abc", "Basic YWxpY2U="] {
        let (status, _) = send(&app, Method::GET, "/forum/comments", Some(token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "token {token}");
    }
    assert_eq!(app.forum_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unknown_account_is_unauthorized() {
    let app = test_app();

    let token = encode("ghost", "p1");
    let (status, body) = send(&app, Method::GET, "/forum/comments", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("User not found"));
    assert_eq!(app.forum_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_wrong_password_is_forbidden_and_not_forwarded() {
    let app = test_app();
    register(&app, "alice", "p1").await;

    let token = encode("alice", "wrong");
    let (status, body) = send(&app, Method::GET, "/forum/comments", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("AUTH_003"));
    assert_eq!(app.forum_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_store_failure_is_internal_error_and_not_forwarded() {
    let app = test_app_over(UnreadableStore, Settings::default());

    let token = encode("alice", "p1");
    let (status, body) = send(&app, Method::GET, "/forum/comments", Some(&token), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("IO_001"));
    assert_eq!(app.forum_hits.load(Ordering::SeqCst), 0);

    let (status, _) = send(&app, Method::GET, "/account/login", Some(&token), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    // public routes never touch the store
    let (status, _) = send(&app, Method::GET, "/forum/posts", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.forum_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_valid_credentials_forward_with_login_attached() {
    let app = test_app();
    register(&app, "alice", "p1").await;

    let token = encode("alice", "p1");
    let (status, body) = send(&app, Method::GET, "/forum/comments", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "alice");
    assert_eq!(app.forum_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_registration_is_not_gated() {
    let app = test_app();

    let token = encode("bob", "p1");
    let (status, body) = send(
        &app,
        Method::POST,
        "/account",
        Some(&token),
        Some(serde_json::json!({"firstName": "Bob"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let profile: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(profile["login"], "bob");
    assert_eq!(profile["roles"], serde_json::json!(["User"]));
    assert!(profile.get("passwordHash").is_none());

    let (status, _) = send(
        &app,
        Method::POST,
        "/account",
        Some(&token),
        Some(serde_json::json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_password_change_invalidates_old_password() {
    let app = test_app();
    register(&app, "alice", "p1").await;

    let old = encode("alice", "p1");
    let (status, _) = send(
        &app,
        Method::PUT,
        "/account/password",
        Some(&old),
        Some(serde_json::json!({"newPassword": "p2"})),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::GET, "/account/login", Some(&old), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let new = encode("alice", "p2");
    let (status, _) = send(&app, Method::GET, "/account/login", Some(&new), None).await;
    assert_eq!(status, StatusCode::OK);
}

async fn put_expired_account(app: &TestApp, login: &str, password: &str) {
    let account = Account::new(
        login,
        hash_password(password).unwrap(),
        "User",
        Utc::now() - Duration::days(1),
    );
    app.state.accounts.store().put(&account).await.unwrap();
}

#[tokio::test]
async fn test_expiration_is_advisory_by_default() {
    let app = test_app();
    put_expired_account(&app, "old", "p1").await;

    let token = encode("old", "p1");
    let (status, _) = send(&app, Method::GET, "/forum/comments", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_expired_account_rejected_when_enforced() {
    let mut settings = Settings::default();
    settings.account.enforce_expiration = true;
    let app = test_app_with(settings);
    put_expired_account(&app, "old", "p1").await;

    let token = encode("old", "p1");
    let (status, body) = send(&app, Method::GET, "/forum/comments", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("AUTH_004"));
    assert_eq!(app.forum_hits.load(Ordering::SeqCst), 0);

    // rotating the password is still allowed and lifts the expiration
    let (status, _) = send(
        &app,
        Method::PUT,
        "/account/password",
        Some(&token),
        Some(serde_json::json!({"newPassword": "p2"})),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let token = encode("old", "p2");
    let (status, _) = send(&app, Method::GET, "/forum/comments", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}
