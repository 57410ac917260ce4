use axum::{
    body::Body,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method, Request, StatusCode,
    },
    Router,
};
use http_body_util::BodyExt;
use huddle_config::AppConfig;
use huddle_database::{seed::seed_default_users, UserRepository};
use huddle_gateway::{build_router, GatewayState};
use huddle_runtime::BackendServices;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

const FALLBACK: &str = "The tutor is offline right now.";

struct TestApp {
    router: Router,
    services: BackendServices,
    _db_dir: TempDir,
}

struct TestResponse {
    status: StatusCode,
    json: Value,
}

impl TestApp {
    async fn new() -> Self {
        let db_dir = TempDir::new().expect("create temp dir");
        let db_path = db_dir.path().join("huddle-e2e.db");

        let mut config = AppConfig::default();
        config.database.url = format!("sqlite://{}", db_path.to_string_lossy());
        config.database.max_connections = 5;
        // Nothing listens on the discard port, so every completion fails fast.
        config.orchestrator.base_url = "http://127.0.0.1:9/v1".to_string();
        config.orchestrator.api_key = Some("test-api-key".to_string());
        config.orchestrator.request_timeout_seconds = 2;
        config.orchestrator.fallback_reply = FALLBACK.to_string();

        let services = BackendServices::initialise(&config)
            .await
            .expect("initialise backend services");

        seed_default_users(&UserRepository::new(services.db_pool.clone()))
            .await
            .expect("seed users");

        let state = GatewayState::new(
            services.db_pool.clone(),
            services.authenticator.clone(),
            services.responder(),
            &config,
        );

        Self {
            router: build_router(state),
            services,
            _db_dir: db_dir,
        }
    }

    async fn token_for(&self, user_id: &str) -> String {
        self.services
            .authenticator
            .issue_session(&user_id.into())
            .await
            .expect("issue session")
            .token
    }

    async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        let body = if let Some(json_body) = body {
            let bytes = serde_json::to_vec(&json_body).expect("serialize request body");
            builder = builder.header(CONTENT_TYPE, "application/json");
            Body::from(bytes)
        } else {
            Body::empty()
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).expect("build request"))
            .await
            .expect("dispatch request");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("collect response body")
            .to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse { status, json }
    }
}

#[tokio::test]
async fn health_check_returns_ok() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json["status"], "ok");
}

#[tokio::test]
async fn seeded_users_are_listed() {
    let app = TestApp::new().await;
    let token = app.token_for("user_1").await;

    let response = app.request(Method::GET, "/api/users", None, Some(&token)).await;

    assert_eq!(response.status, StatusCode::OK);
    let names: Vec<_> = response
        .json
        .as_array()
        .expect("user list")
        .iter()
        .map(|user| user["display_name"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(names.len(), 5);
    assert!(names.contains(&"Diana Prince".to_string()));
}

#[tokio::test]
async fn group_conversation_round_trip() {
    let app = TestApp::new().await;
    let simon = app.token_for("user_1").await;
    let jane = app.token_for("user_3").await;

    let created = app
        .request(
            Method::POST,
            "/api/conversations",
            Some(json!({
                "kind": "group",
                "name": "Algorithms study",
                "member_ids": ["user_2", "user_3"]
            })),
            Some(&simon),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    let id = created.json["id"].as_str().expect("conversation id").to_string();

    let sent = app
        .request(
            Method::POST,
            &format!("/api/conversations/{id}/messages"),
            Some(json!({ "body": "hello" })),
            Some(&simon),
        )
        .await;
    assert_eq!(sent.status, StatusCode::CREATED);

    let history = app
        .request(
            Method::GET,
            &format!("/api/conversations/{id}/messages"),
            None,
            Some(&jane),
        )
        .await;
    assert_eq!(history.status, StatusCode::OK);
    assert_eq!(history.json["messages"][0]["body"], "hello");
    assert_eq!(history.json["messages"][0]["sender_id"], "user_1");

    let outsider = app.token_for("user_5").await;
    let denied = app
        .request(
            Method::GET,
            &format!("/api/conversations/{id}/messages"),
            None,
            Some(&outsider),
        )
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unreachable_assistant_falls_back() {
    let app = TestApp::new().await;
    let token = app.token_for("user_1").await;

    let created = app
        .request(
            Method::POST,
            "/api/conversations",
            Some(json!({ "kind": "assistant" })),
            Some(&token),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    let id = created.json["id"].as_str().expect("conversation id").to_string();

    let sent = app
        .request(
            Method::POST,
            &format!("/api/conversations/{id}/messages"),
            Some(json!({ "body": "explain recursion" })),
            Some(&token),
        )
        .await;

    assert_eq!(sent.status, StatusCode::CREATED);
    assert_eq!(sent.json["message"]["body"], "explain recursion");
    assert_eq!(sent.json["reply"]["body"], FALLBACK);
    assert_eq!(sent.json["reply"]["is_assistant"], true);
}
