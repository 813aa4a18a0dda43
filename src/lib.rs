//! Library crate backing the `notify-pipeline` binary. Split out so
//! integration tests (`tests/`) can build a real `Router`/`AppState` the
//! same way `fourthplaces-mntogether`'s `server_core` lib separates itself
//! from its `server` binary for testability.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use axum::body::Body;
use http::{HeaderValue, StatusCode};
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::SmartIpKeyExtractor;
use tower_governor::{GovernorError, GovernorLayer};

pub mod auth;
pub mod broker;
pub mod config;
pub mod cron;
pub mod db;
pub mod dedup;
pub mod domain;
pub mod error;
pub mod middleware;
pub mod render;
pub mod resolver;
pub mod routes;
pub mod sender;
pub mod services;
pub mod workers;

pub use broker::BrokerClient;
pub use config::Config;
pub use dedup::DedupStore;
pub use render::{shortener::UrlShortener, Renderer};
pub use resolver::SubscriberRegistry;
pub use sender::{email::EmailSender, SenderRegistry};
pub use workers::WorkerContext;

/// Shared state for the HTTP/WS surface (Ingress, component L, plus the
/// admin CRUD routes). Workers get their own `WorkerContext` (`workers::mod`).
pub struct AppState {
    pub db: sqlx::SqlitePool,
    pub config: Config,
    pub broker: BrokerClient,
    pub jwt_public_key: Vec<u8>,
}

/// Each worker process opens its own broker/KV/DB connections (§5), whether
/// started via the `workers <type>` CLI or spawned in-process for local dev.
pub async fn build_worker_context(config: Config) -> anyhow::Result<Arc<WorkerContext>> {
    let pool = services::init::init_db(&config).await?;
    let broker = BrokerClient::connect(&config.rabbitmq.url).await?;
    let dedup = DedupStore::new(&config.redis.url)?;
    let subscribers = SubscriberRegistry::with_builtins();
    let shortener = UrlShortener::new(&config.shortener);
    let renderer = Renderer::new(shortener);

    let mut senders = SenderRegistry::new();
    senders.register(
        domain::ChannelType::Email,
        Arc::new(EmailSender::new(&config.smtp)?),
    );

    Ok(Arc::new(WorkerContext {
        pool,
        broker,
        dedup,
        subscribers,
        renderer,
        senders,
        config,
    }))
}

/// Builds the axum `Router` (ingress rate limiting, CSP/request-id
/// middleware, CORS, `/health`) without binding a listener, so tests can
/// drive it directly with `tower::ServiceExt::oneshot`.
pub fn build_router(app_state: Arc<AppState>) -> anyhow::Result<Router> {
    let mut ingress_builder = GovernorConfigBuilder::default();
    ingress_builder.per_second(app_state.config.rate_limit.ingress_per_second.into());
    ingress_builder.burst_size(app_state.config.rate_limit.ingress_burst.into());
    ingress_builder.key_extractor(SmartIpKeyExtractor);
    ingress_builder.error_handler(|error: GovernorError| -> http::Response<Body> {
        match error {
            GovernorError::TooManyRequests { wait_time, headers } => {
                let retry_after = wait_time;
                let body = serde_json::json!({
                    "error": {
                        "code": "RATE_LIMITED",
                        "message": "Rate limit exceeded",
                        "details": { "retry_after_seconds": retry_after }
                    }
                })
                .to_string();

                let mut resp = http::Response::new(Body::from(body));
                *resp.status_mut() = StatusCode::TOO_MANY_REQUESTS;
                resp.headers_mut().insert(
                    http::header::CONTENT_TYPE,
                    http::HeaderValue::from_static("application/json"),
                );
                if let Some(hmap) = headers {
                    for (name, value) in hmap.iter() {
                        resp.headers_mut().append(name.clone(), value.clone());
                    }
                }
                resp.headers_mut().insert(
                    http::header::RETRY_AFTER,
                    http::HeaderValue::from_str(&retry_after.to_string()).unwrap(),
                );
                resp
            }
            GovernorError::UnableToExtractKey => {
                let mut resp = http::Response::new(Body::from(
                    "Unable to determine client IP for rate limiting",
                ));
                *resp.status_mut() = StatusCode::BAD_REQUEST;
                resp
            }
            GovernorError::Other { code, msg, headers } => {
                let body = msg.unwrap_or_else(|| "Rate limiting error".to_string());
                let mut resp = http::Response::new(Body::from(body));
                let status =
                    StatusCode::from_u16(code.as_u16()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                *resp.status_mut() = status;
                if let Some(hmap) = headers {
                    for (name, value) in hmap.iter() {
                        resp.headers_mut().append(name.clone(), value.clone());
                    }
                }
                resp
            }
        }
    });

    let ingress_gov_conf = Arc::new(
        ingress_builder
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Failed to build ingress governor config"))?,
    );

    {
        let limiter = ingress_gov_conf.limiter().clone();
        let interval = Duration::from_secs(60);
        std::thread::spawn(move || loop {
            std::thread::sleep(interval);
            tracing::debug!("ingress rate limiter size: {}", limiter.len());
            limiter.retain_recent();
        });
    }

    let ingress_rate_layer = GovernorLayer {
        config: ingress_gov_conf.clone(),
    };

    let frontend_url = app_state.config.server.frontend_url.clone();

    Ok(Router::new()
        .route("/health", get(routes::health::health_check))
        .nest(
            "/api-notify/v1",
            routes::router().layer(ingress_rate_layer),
        )
        .with_state(app_state)
        .layer(axum::middleware::from_fn(middleware::csp::csp_middleware))
        .layer(axum::middleware::from_fn(
            middleware::request_id::request_id_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(
                    frontend_url
                        .parse::<HeaderValue>()
                        .expect("Invalid FRONTEND_URL for CORS"),
                )
                .allow_methods([
                    http::Method::GET,
                    http::Method::POST,
                    http::Method::PUT,
                    http::Method::DELETE,
                    http::Method::OPTIONS,
                    http::Method::PATCH,
                ])
                .allow_headers([
                    http::header::CONTENT_TYPE,
                    http::header::AUTHORIZATION,
                    http::header::ACCEPT,
                ])
                .allow_credentials(true),
        ))
}

pub async fn run_http_server(config: Config) -> anyhow::Result<()> {
    tracing::info!("Starting notification pipeline HTTP server");

    let pool = services::init::init_db(&config).await?;
    let broker = BrokerClient::connect(&config.rabbitmq.url).await?;
    let jwt_public_key = config.jwt_public_key()?;

    let app_state = Arc::new(AppState {
        db: pool,
        config: config.clone(),
        broker,
        jwt_public_key,
    });

    // In-process worker loops for local/dev use alongside the HTTP server —
    // each opens its own broker/KV connection (§5).
    let (shutdown_tx, _) = tokio::sync::broadcast::channel(1);
    let worker_ctx = build_worker_context(config.clone()).await?;
    let _worker_handles = services::init::spawn_background_workers(worker_ctx, shutdown_tx);

    let app = build_router(app_state)?;

    let host = config.server.host.clone();
    let port = config.server.port;
    let addr = format!("{}:{}", host, port);

    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
