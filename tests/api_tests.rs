use accountd::api::{AppState, router};
use accountd::config::Config;
use accountd::db::Store;
use accountd::services::{ActivationNotifier, NotificationError};
use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use axum_extra::headers::{Authorization, HeaderMapExt};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

const PASSWORD: &str = "P@ssw0rd";

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    fn token_for(&self, email: &str) -> String {
        self.sent()
            .into_iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, token)| token)
            .expect("no activation email recorded")
    }
}

#[async_trait]
impl ActivationNotifier for RecordingNotifier {
    async fn send_activation(&self, email: &str, token: &str) -> Result<(), NotificationError> {
        self.sent
            .lock()
            .unwrap()
            .push((email.to_string(), token.to_string()));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

struct FailingNotifier;

#[async_trait]
impl ActivationNotifier for FailingNotifier {
    async fn send_activation(&self, _email: &str, _token: &str) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("connection refused".to_string()))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config.security.argon2_parallelism = 1;
    config.observability.metrics_enabled = false;
    config
}

async fn spawn_app_with(notifier: Arc<dyn ActivationNotifier>) -> Router {
    let config = test_config();
    let store = Store::new(&config.general.database_path)
        .await
        .expect("Failed to open store");
    let state = AppState::new(config, &store, notifier, None).expect("Failed to create app state");
    router(state)
}

async fn spawn_app() -> (Router, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let app = spawn_app_with(notifier.clone()).await;
    (app, notifier)
}

fn json_request(method: Method, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn with_basic(mut request: Request<Body>, email: &str, password: &str) -> Request<Body> {
    request
        .headers_mut()
        .typed_insert(Authorization::basic(email, password));
    request
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, headers, body)
}

async fn register(app: &Router, username: &str, email: &str) -> (StatusCode, Value) {
    let (status, _, body) = send(
        app,
        json_request(
            Method::POST,
            "/api/v1/users",
            &json!({ "username": username, "email": email, "password": PASSWORD }),
        ),
    )
    .await;
    (status, body)
}

async fn register_active(app: &Router, notifier: &RecordingNotifier, username: &str, email: &str) {
    let (status, _) = register(app, username, email).await;
    assert_eq!(status, StatusCode::OK);
    let token = notifier.token_for(email);
    let (status, _, _) = send(
        app,
        empty_request(Method::PATCH, &format!("/api/v1/users/{token}/active")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_register_and_activate_flow() {
    let (app, notifier) = spawn_app().await;

    let (status, body) = register(&app, "alice", "alice@x.com").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User is created");

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "alice@x.com");
    let token = sent[0].1.clone();
    assert_eq!(token.len(), 36);

    let (status, _, body) = send(&app, empty_request(Method::GET, "/api/v1/users/1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["email"], "alice@x.com");
    assert_eq!(body["active"], false);
    assert!(body.get("passwordHash").is_none());
    assert!(body.get("activationToken").is_none());

    let uri = format!("/api/v1/users/{token}/active");
    let (status, _, body) = send(&app, empty_request(Method::PATCH, &uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Account is activated");

    let (_, _, body) = send(&app, empty_request(Method::GET, "/api/v1/users/1")).await;
    assert_eq!(body["active"], true);

    let (status, _, body) = send(&app, empty_request(Method::PATCH, &uri)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
    assert_eq!(body["message"], "Activation token is invalid");
    assert_eq!(body["path"], uri);
}

#[tokio::test]
async fn test_duplicate_email_is_rejected() {
    let (app, notifier) = spawn_app().await;

    let (status, _) = register(&app, "alice", "alice@x.com").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = register(&app, "alice2", "alice@x.com").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "E-mail in use");
    assert_eq!(body["path"], "/api/v1/users");
    assert!(body.get("validationErrors").is_none());
    assert_eq!(notifier.sent().len(), 1);
}

#[tokio::test]
async fn test_validation_errors_per_field() {
    let (app, notifier) = spawn_app().await;

    let (status, _, body) = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/users",
            &json!({ "username": "abc", "email": "nope" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Validation error");
    let errors = &body["validationErrors"];
    assert_eq!(
        errors["username"],
        "Username must be between 4 and 255 characters"
    );
    assert_eq!(errors["email"], "E-mail is not valid");
    assert_eq!(errors["password"], "Password cannot be blank");
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn test_malformed_body_is_a_validation_error() {
    let (app, _) = spawn_app().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/users")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["validationErrors"]["body"], "Request could not be read");
}

#[tokio::test]
async fn test_notification_failure_keeps_pending_account() {
    let app = spawn_app_with(Arc::new(FailingNotifier)).await;

    let (status, body) = register(&app, "alice", "alice@x.com").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["status"], 502);
    assert_eq!(body["message"], "Failed to send activation email");

    let (status, _, body) = send(&app, empty_request(Method::GET, "/api/v1/users/1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active"], false);

    let (status, _) = register(&app, "alice", "alice@x.com").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_token_is_invalid() {
    let (app, _) = spawn_app().await;

    let (status, _, body) = send(
        &app,
        empty_request(
            Method::PATCH,
            "/api/v1/users/00000000-0000-4000-8000-000000000000/active",
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Activation token is invalid");
}

#[tokio::test]
async fn test_get_user_errors() {
    let (app, _) = spawn_app().await;

    let (status, _, body) = send(&app, empty_request(Method::GET, "/api/v1/users/42")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User not found");
    assert_eq!(body["path"], "/api/v1/users/42");

    let (status, _, body) = send(&app, empty_request(Method::GET, "/api/v1/users/abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["validationErrors"]["id"], "User id must be a number");
}

#[tokio::test]
async fn test_listing_excludes_authenticated_caller() {
    let (app, notifier) = spawn_app().await;
    register_active(&app, &notifier, "alice", "alice@x.com").await;
    register_active(&app, &notifier, "bobby", "bob@x.com").await;

    let (status, _, body) = send(&app, empty_request(Method::GET, "/api/v1/userList")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalElements"], 2);
    assert_eq!(body["size"], 10);
    assert_eq!(body["page"], 0);

    let request = with_basic(
        empty_request(Method::GET, "/api/v1/userList?page=0&size=5"),
        "alice@x.com",
        PASSWORD,
    );
    let (status, _, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalElements"], 1);
    assert_eq!(body["totalPages"], 1);
    let content = body["content"].as_array().unwrap();
    assert_eq!(content.len(), 1);
    assert_eq!(content[0]["email"], "bob@x.com");

    let request = with_basic(
        empty_request(Method::GET, "/api/v1/userList"),
        "alice@x.com",
        "Wr0ngPass",
    );
    let (status, _, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_listing_rejects_bad_page_size() {
    let (app, _) = spawn_app().await;

    let (status, _, body) = send(
        &app,
        empty_request(Method::GET, "/api/v1/userList?size=0"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["validationErrors"]["size"],
        "Page size must be between 1 and 100"
    );

    let (status, _, body) = send(
        &app,
        empty_request(Method::GET, "/api/v1/userList?size=many"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["validationErrors"]["query"].is_string());
}

#[tokio::test]
async fn test_listing_rejects_page_offset_overflow() {
    let (app, _) = spawn_app().await;

    let (status, _, body) = send(
        &app,
        empty_request(
            Method::GET,
            "/api/v1/userList?page=18446744073709551615&size=10",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["validationErrors"]["page"], "Page number is too large");

    let (status, _, body) = send(
        &app,
        empty_request(Method::GET, "/api/v1/userList?page=9223372036854775807&size=1"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_update_requires_owner_credentials() {
    let (app, notifier) = spawn_app().await;
    register_active(&app, &notifier, "alice", "alice@x.com").await;
    register_active(&app, &notifier, "bobby", "bob@x.com").await;
    let body = json!({ "username": "alice-renamed" });

    let (status, headers, response) =
        send(&app, json_request(Method::PUT, "/api/v1/users/1", &body)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        headers.get(header::WWW_AUTHENTICATE).unwrap(),
        "Basic realm=\"accountd\""
    );
    assert_eq!(response["message"], "Authentication required");

    let request = with_basic(
        json_request(Method::PUT, "/api/v1/users/1", &body),
        "alice@x.com",
        "Wr0ngPass",
    );
    let (status, _, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = with_basic(
        json_request(Method::PUT, "/api/v1/users/2", &body),
        "alice@x.com",
        PASSWORD,
    );
    let (status, _, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let request = with_basic(
        json_request(Method::PUT, "/api/v1/users/1", &body),
        "alice@x.com",
        PASSWORD,
    );
    let (status, _, response) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["id"], 1);
    assert_eq!(response["username"], "alice-renamed");

    let (_, _, bob) = send(&app, empty_request(Method::GET, "/api/v1/users/2")).await;
    assert_eq!(bob["username"], "bobby");
}

#[tokio::test]
async fn test_pending_account_cannot_authenticate() {
    let (app, _) = spawn_app().await;
    let (status, _) = register(&app, "alice", "alice@x.com").await;
    assert_eq!(status, StatusCode::OK);

    let request = with_basic(
        json_request(
            Method::PUT,
            "/api/v1/users/1",
            &json!({ "username": "alice-renamed" }),
        ),
        "alice@x.com",
        PASSWORD,
    );
    let (status, _, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_resend_activation() {
    let (app, notifier) = spawn_app().await;
    register(&app, "alice", "alice@x.com").await;
    let token = notifier.token_for("alice@x.com");

    let (status, _, pending) = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/activation-emails",
            &json!({ "email": "alice@x.com" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let sent = notifier.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1], ("alice@x.com".to_string(), token));

    let (status, _, unknown) = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/activation-emails",
            &json!({ "email": "nobody@x.com" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending["message"], unknown["message"]);
    assert_eq!(notifier.sent().len(), 2);

    let (status, _, body) = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/activation-emails",
            &json!({ "email": "not-an-email" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["validationErrors"]["email"], "E-mail is not valid");
}

#[tokio::test]
async fn test_resend_reports_mail_failure() {
    let app = spawn_app_with(Arc::new(FailingNotifier)).await;
    let (status, _) = register(&app, "alice", "alice@x.com").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let (status, _, body) = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/activation-emails",
            &json!({ "email": "alice@x.com" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["status"], 502);
    assert_eq!(body["message"], "Failed to send activation email");
    assert_eq!(body["path"], "/api/v1/activation-emails");
}

#[tokio::test]
async fn test_turkish_locale() {
    let (app, _) = spawn_app().await;
    register(&app, "alice", "alice@x.com").await;

    let mut request = json_request(
        Method::POST,
        "/api/v1/users",
        &json!({ "username": "alice", "email": "alice@x.com", "password": PASSWORD }),
    );
    request
        .headers_mut()
        .insert(header::ACCEPT_LANGUAGE, "tr-TR,tr;q=0.9".parse().unwrap());

    let (status, _, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "E-posta kullanımda");
}

#[tokio::test]
async fn test_concurrent_registrations_with_one_email() {
    let (app, notifier) = spawn_app().await;

    let attempts = (0..8).map(|i| {
        let app = app.clone();
        async move { register(&app, &format!("user{i}"), "same@x.com").await.0 }
    });
    let statuses = futures::future::join_all(attempts).await;

    let created = statuses.iter().filter(|s| **s == StatusCode::OK).count();
    let rejected = statuses
        .iter()
        .filter(|s| **s == StatusCode::BAD_REQUEST)
        .count();
    assert_eq!(created, 1);
    assert_eq!(rejected, 7);
    assert_eq!(notifier.sent().len(), 1);
}

#[tokio::test]
async fn test_health() {
    let (app, _) = spawn_app().await;

    let (status, _, body) = send(&app, empty_request(Method::GET, "/api/v1/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["uptimeSeconds"].is_u64());
}
