//! HTTP-level integration tests for component L (Ingress), covering the
//! concrete scenarios 1-3 from spec.md §8. Runs the real axum `Router`
//! (`notify_pipeline::build_router`) against an in-memory SQLite store and a
//! RabbitMQ broker from `testcontainers-modules`, exercised with
//! `tower::ServiceExt::oneshot` the way `fourthplaces-mntogether`'s own
//! integration tests drive its router.

use std::sync::Arc;

use http_body_util::BodyExt;
use notify_pipeline::config::Config;
use notify_pipeline::db::{CreateTemplate, TemplateRepository};
use notify_pipeline::{build_router, AppState, BrokerClient};
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::rabbitmq::RabbitMq;
use tower::ServiceExt;
use uuid::Uuid;

async fn test_app() -> (Arc<AppState>, sqlx::SqlitePool, testcontainers::ContainerAsync<RabbitMq>) {
    let rabbitmq = RabbitMq::default().start().await.unwrap();
    let host = rabbitmq.get_host().await.unwrap();
    let port = rabbitmq.get_host_port_ipv4(5672).await.unwrap();
    let amqp_url = format!("amqp://guest:guest@{host}:{port}/%2f");

    let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();

    let broker = BrokerClient::connect(&amqp_url).await.unwrap();

    let mut config = Config::default();
    config.rabbitmq.url = amqp_url;

    let state = Arc::new(AppState {
        db: pool.clone(),
        config,
        broker,
        jwt_public_key: Vec::new(),
    });

    (state, pool, rabbitmq)
}

async fn seed_template(pool: &sqlx::SqlitePool) -> Uuid {
    let template = TemplateRepository::create(
        pool,
        CreateTemplate {
            name: "welcome".into(),
            subject: "Hi {{ first_name }}".into(),
            body: "Welcome, {{ first_name }}!".into(),
            staff_id: Uuid::new_v4(),
        },
    )
    .await
    .unwrap();
    template.id
}

/// Scenario 1: immediate happy path -> HTTP 201, queue="notifications.high",
/// priority=5.
#[tokio::test]
async fn immediate_happy_path_routes_to_high_priority_queue() {
    let (state, pool, _rabbitmq) = test_app().await;
    let template_id = seed_template(&pool).await;
    let app = build_router(state).unwrap();

    let body = serde_json::json!({
        "template_id": template_id,
        "event_type": "user_registration",
        "channel_type": "email",
        "subscribers": [Uuid::new_v4()],
    });

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api-notify/v1/messages/send-message/")
        .header("content-type", "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(parsed["queue"], "notifications.high");
    assert_eq!(parsed["priority"], 5);
}

/// Scenario 2: bad event_type -> HTTP 422 with `event_type` in the error location.
#[tokio::test]
async fn invalid_event_type_is_rejected() {
    let (state, pool, _rabbitmq) = test_app().await;
    let template_id = seed_template(&pool).await;
    let app = build_router(state).unwrap();

    let body = serde_json::json!({
        "template_id": template_id,
        "event_type": "invalid_event_type",
        "channel_type": "email",
        "subscribers": [Uuid::new_v4()],
    });

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api-notify/v1/messages/send-message/")
        .header("content-type", "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::UNPROCESSABLE_ENTITY);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(parsed["error"]["details"]["location"], "event_type");
}

/// Scenario 3: unknown template_id -> HTTP 404, "Template not found".
#[tokio::test]
async fn missing_template_returns_not_found() {
    let (state, _pool, _rabbitmq) = test_app().await;
    let app = build_router(state).unwrap();

    let body = serde_json::json!({
        "template_id": Uuid::new_v4(),
        "event_type": "user_registration",
        "channel_type": "email",
        "subscribers": [Uuid::new_v4()],
    });

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api-notify/v1/messages/send-message/")
        .header("content-type", "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::NOT_FOUND);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(parsed["error"]["message"], "Template not found");
}
