pub mod health;
pub mod messages;
pub mod periodic;
pub mod scheduled;
pub mod sockets;
pub mod templates;

use std::sync::Arc;

use axum::Router;

use crate::AppState;

/// Mounted under `/api-notify/v1` in `main.rs` (§6).
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/messages", messages::router())
        .nest("/scheduled", scheduled::router())
        .nest("/periodic", periodic::router())
        .nest("/templates", templates::router())
        .nest("/sockets", sockets::router())
}
