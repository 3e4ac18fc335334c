use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use recipebox::api::AppState;
use recipebox::config::Config;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

fn test_config() -> Config {
    let mut config = Config::default();
    // Every pooled connection to sqlite::memory: opens its own database
    config.general.database_url = "sqlite::memory:".to_string();
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;
    config.security.argon2_memory_cost_kib = 64;
    config.security.argon2_time_cost = 1;
    config.security.argon2_parallelism = 1;
    config
}

async fn spawn_app_with_state() -> (Router, Arc<AppState>) {
    let state = recipebox::api::create_app_state_from_config(test_config(), None)
        .await
        .expect("Failed to create app state");
    (recipebox::api::router(state.clone()), state)
}

async fn spawn_app() -> Router {
    spawn_app_with_state().await.0
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, json)
}

async fn register(app: &Router, email: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        "/api/user/create/",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await
}

async fn obtain_token(app: &Router, email: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        "/api/user/token/",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await
}

#[tokio::test]
async fn test_account_lifecycle() {
    let app = spawn_app().await;

    let (status, body) = register(&app, "a@example.com", "Str0ngPw!").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["email"], "a@example.com");
    assert!(body["data"].get("password").is_none());
    assert!(body["data"].get("password_hash").is_none());

    let (status, body) = register(&app, "a@example.com", "Str0ngPw!").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["email"].is_array());

    let (status, body) = obtain_token(&app, "a@example.com", "Str0ngPw!").await;
    assert_eq!(status, StatusCode::OK);
    let token = body["data"]["token"].as_str().unwrap().to_string();
    assert_eq!(token.len(), 40);

    let (status, body) = send(&app, "GET", "/api/user/self", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "a@example.com");

    let (status, _) = send(
        &app,
        "PATCH",
        "/api/user/self",
        Some(&token),
        Some(json!({ "password": "NewPw123!" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = obtain_token(&app, "a@example.com", "Str0ngPw!").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["non_field_errors"].is_array());

    let (status, _) = obtain_token(&app, "a@example.com", "NewPw123!").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_create_user_with_profile_fields() {
    let app = spawn_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/user/create/",
        None,
        Some(json!({
            "email": "cook@example.com",
            "password": "Sourdough!2024",
            "username": "breadmaker",
            "first_name": "Ada",
            "last_name": "Baker",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["username"], "breadmaker");
    assert_eq!(body["data"]["first_name"], "Ada");
    assert_eq!(body["data"]["is_staff"], false);
    assert_eq!(body["data"]["is_active"], true);
}

#[tokio::test]
async fn test_create_user_rejects_bad_input() {
    let app = spawn_app().await;

    let (status, body) = register(&app, "test.example.com", "Str0ngPw!").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["email"].is_array());

    for password in ["4", "123456789", "password", ""] {
        let (status, body) = register(&app, "weak@example.com", password).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "password {password:?}");
        assert!(body["errors"]["password"].is_array());
    }

    let (status, body) = send(
        &app,
        "POST",
        "/api/user/create/",
        None,
        Some(json!({ "password": "Str0ngPw!" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["email"].is_array());

    let (status, body) = send(
        &app,
        "POST",
        "/api/user/create/",
        None,
        Some(json!({
            "email": "long@example.com",
            "password": "Str0ngPw!",
            "username": "x".repeat(51),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["username"].is_array());

    // Nothing was persisted by the rejected attempts
    let (status, _) = register(&app, "weak@example.com", "Str0ngPw!").await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_email_domain_is_case_insensitive() {
    let app = spawn_app().await;

    let (status, body) = register(&app, "Mixed@EXAMPLE.com", "Str0ngPw!").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["email"], "Mixed@example.com");

    let (status, _) = register(&app, "Mixed@example.COM", "Str0ngPw!").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = obtain_token(&app, "Mixed@Example.Com", "Str0ngPw!").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_token_failures_do_not_reveal_which_field() {
    let app = spawn_app().await;
    register(&app, "b@example.com", "Str0ngPw!").await;

    let (status_wrong_pw, body_wrong_pw) = obtain_token(&app, "b@example.com", "WrongPw!1").await;
    let (status_no_user, body_no_user) = obtain_token(&app, "nobody@example.com", "Str0ngPw!").await;

    assert_eq!(status_wrong_pw, StatusCode::BAD_REQUEST);
    assert_eq!(status_no_user, StatusCode::BAD_REQUEST);
    assert_eq!(body_wrong_pw, body_no_user);

    let (status, _) = obtain_token(&app, "b@example.com", "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_token_is_stable_across_logins() {
    let app = spawn_app().await;
    register(&app, "c@example.com", "Str0ngPw!").await;

    let (_, first) = obtain_token(&app, "c@example.com", "Str0ngPw!").await;
    let (_, second) = obtain_token(&app, "c@example.com", "Str0ngPw!").await;

    assert_eq!(first["data"]["token"], second["data"]["token"]);
}

#[tokio::test]
async fn test_self_requires_authentication() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/user/self")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));

    let fabricated = "0123456789abcdef0123456789abcdef01234567";
    let (status, _) = send(&app, "GET", "/api/user/self", Some(fabricated), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/api/user/self", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_inactive_account_is_locked_out() {
    let (app, state) = spawn_app_with_state().await;
    register(&app, "i@example.com", "Str0ngPw!").await;
    let (_, body) = obtain_token(&app, "i@example.com", "Str0ngPw!").await;
    let token = body["data"]["token"].as_str().unwrap().to_string();

    assert!(
        state
            .store()
            .set_user_active("i@example.com", false)
            .await
            .unwrap()
    );

    let (status, _) = send(&app, "GET", "/api/user/self", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = obtain_token(&app, "i@example.com", "Str0ngPw!").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["non_field_errors"].is_array());
}

#[tokio::test]
async fn test_lowercase_scheme_is_accepted() {
    let app = spawn_app().await;
    register(&app, "lower@example.com", "Str0ngPw!").await;
    let (_, body) = obtain_token(&app, "lower@example.com", "Str0ngPw!").await;
    let token = body["data"]["token"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/user/self")
                .header(header::AUTHORIZATION, format!("bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_token_prefix_is_accepted() {
    let app = spawn_app().await;
    register(&app, "d@example.com", "Str0ngPw!").await;
    let (_, body) = obtain_token(&app, "d@example.com", "Str0ngPw!").await;
    let token = body["data"]["token"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/user/self")
                .header(header::AUTHORIZATION, format!("Token {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_post_to_self_not_allowed() {
    let app = spawn_app().await;
    register(&app, "e@example.com", "Str0ngPw!").await;
    let (_, body) = obtain_token(&app, "e@example.com", "Str0ngPw!").await;
    let token = body["data"]["token"].as_str().unwrap();

    let (status, _) = send(&app, "POST", "/api/user/self", Some(token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_update_self_only_touches_caller() {
    let app = spawn_app().await;
    register(&app, "f@example.com", "Str0ngPw!").await;
    register(&app, "g@example.com", "Str0ngPw!").await;

    let (_, body) = obtain_token(&app, "f@example.com", "Str0ngPw!").await;
    let token_f = body["data"]["token"].as_str().unwrap().to_string();
    let (_, body) = obtain_token(&app, "g@example.com", "Str0ngPw!").await;
    let token_g = body["data"]["token"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        "PATCH",
        "/api/user/self",
        Some(&token_f),
        Some(json!({ "first_name": "Fiona", "email": "hijack@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["first_name"], "Fiona");
    assert_eq!(body["data"]["email"], "f@example.com");

    let (_, body) = send(&app, "GET", "/api/user/self", Some(&token_g), None).await;
    assert_eq!(body["data"]["email"], "g@example.com");
    assert!(body["data"]["first_name"].is_null());
}

#[tokio::test]
async fn test_password_change_stores_hash_not_plaintext() {
    let (app, state) = spawn_app_with_state().await;
    let (_, body) = register(&app, "hash@example.com", "Str0ngPw!").await;
    let id = i32::try_from(body["data"]["id"].as_i64().unwrap()).unwrap();
    let (_, body) = obtain_token(&app, "hash@example.com", "Str0ngPw!").await;
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let before = state.store().get_user_row(id).await.unwrap().unwrap();

    let (status, body) = send(
        &app,
        "PATCH",
        "/api/user/self",
        Some(&token),
        Some(json!({ "password": "Rotated#Pw77" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].get("password").is_none());

    let after = state.store().get_user_row(id).await.unwrap().unwrap();
    assert!(after.password_hash.starts_with("$argon2id$"));
    assert_ne!(after.password_hash, "Rotated#Pw77");
    assert_ne!(after.password_hash, before.password_hash);
}

#[tokio::test]
async fn test_update_self_rejects_weak_password() {
    let app = spawn_app().await;
    register(&app, "h@example.com", "Str0ngPw!").await;
    let (_, body) = obtain_token(&app, "h@example.com", "Str0ngPw!").await;
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        "PATCH",
        "/api/user/self",
        Some(&token),
        Some(json!({ "password": "12345" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["password"].is_array());

    // Old password still works
    let (status, _) = obtain_token(&app, "h@example.com", "Str0ngPw!").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = spawn_app().await;

    let (status, body) = send(&app, "GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["database"], "up");
}

#[tokio::test]
async fn test_security_headers_present() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
    assert_eq!(response.headers().get("cache-control").unwrap(), "no-store");
    assert!(response.headers().contains_key("content-security-policy"));
}
