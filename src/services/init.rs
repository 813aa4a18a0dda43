//! Initialization helpers for the application:
//! - database connection + migrations
//! - background worker spawn helpers (Scheduler/Former/Repeater, §4.I/J/K)
//!
//! This module centralizes bits that used to live in `main.rs`, matching the
//! teacher's own split.

use std::{path::Path, sync::Arc};

use anyhow::Result;

use crate::config::Config;
use crate::workers::WorkerContext;

/// Redact potentially sensitive information from a database URL before logging.
///
/// Attempts to parse the URL and remove userinfo (username:password) components.
/// Falls back to removing everything before '@' or returning "(redacted)".
pub fn redact_db_url(db_url: &str) -> String {
    if let Ok(url) = url::Url::parse(db_url) {
        let scheme = url.scheme();
        let host = url.host_str().unwrap_or("");
        let port_part = url.port().map(|p| format!(":{}", p)).unwrap_or_default();
        let path = url.path();
        format!("{}://{}{}{}", scheme, host, port_part, path)
    } else {
        if let Some(at_pos) = db_url.find('@') {
            let without_creds = &db_url[at_pos + 1..];
            return format!("(redacted){}", without_creds);
        }
        "(redacted)".to_string()
    }
}

/// Initialize SQLite database connection and run migrations.
///
/// Creates the parent directory for the database file (if applicable),
/// opens a connection pool using `create_if_missing(true)` and runs migrations.
pub async fn init_db(config: &Config) -> Result<sqlx::SqlitePool> {
    let db_url = &config.database.url;
    tracing::info!("Connecting to database: {}", redact_db_url(db_url));

    // Extract the file path from the database URL
    let db_path = db_url.strip_prefix("sqlite://").unwrap_or(db_url);
    let db_file_path = Path::new(db_path);

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_file_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                anyhow::anyhow!(
                    "Failed to create database directory {}: {}",
                    parent.display(),
                    e
                )
            })?;
            tracing::info!(
                "Database directory created or already exists: {}",
                parent.display()
            );
        }
    }

    let connect_options = sqlx::sqlite::SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true);

    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect_with(connect_options)
        .await?;

    // Log successful database file creation or connection
    if db_file_path.exists() {
        tracing::info!(
            "Successfully connected to database file: {}",
            db_file_path.display()
        );
    } else {
        tracing::info!(
            "Database file created successfully: {}",
            db_file_path.display()
        );
    }

    tracing::info!("Running database migrations");
    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// Spawn the Scheduler, Repeater, and one Former per queue as `tokio::spawn`
/// tasks sharing one `WorkerContext` — the in-process counterpart to the
/// `workers <type>` CLI entrypoints (§5's "[AMBIENT]" note: both paths exist,
/// this one is for local/dev use alongside the HTTP server). Each task exits
/// on the shared shutdown broadcast, mirroring the teacher's
/// `spawn_background_workers` shape.
pub fn spawn_background_workers(
    ctx: Arc<WorkerContext>,
    shutdown: tokio::sync::broadcast::Sender<()>,
) -> Vec<tokio::task::JoinHandle<()>> {
    let mut handles = Vec::new();

    {
        let mut shutdown_rx = shutdown.subscribe();
        let ctx = ctx.clone();
        handles.push(tokio::spawn(async move {
            tokio::select! {
                result = crate::workers::scheduler::run(ctx) => {
                    if let Err(e) = result {
                        tracing::error!("scheduler worker exited: {:?}", e);
                    }
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!("scheduler worker shutting down");
                }
            }
        }));
    }

    {
        let mut shutdown_rx = shutdown.subscribe();
        let ctx = ctx.clone();
        handles.push(tokio::spawn(async move {
            tokio::select! {
                result = crate::workers::repeater::run(ctx) => {
                    if let Err(e) = result {
                        tracing::error!("repeater worker exited: {:?}", e);
                    }
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!("repeater worker shutting down");
                }
            }
        }));
    }

    for queue_name in crate::broker::queues::list_names() {
        let mut shutdown_rx = shutdown.subscribe();
        let ctx = ctx.clone();
        handles.push(tokio::spawn(async move {
            tokio::select! {
                result = crate::workers::former::run(ctx, queue_name) => {
                    if let Err(e) = result {
                        tracing::error!("former worker ({}) exited: {:?}", queue_name, e);
                    }
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!("former worker ({}) shutting down", queue_name);
                }
            }
        }));
    }

    handles
}
