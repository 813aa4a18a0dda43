//! WebSocket ingress (§6): `GET /sockets/` liveness probe plus
//! `WS /sockets/ws/send-message` for bidirectional immediate sends. Auth is
//! via an `access_token` cookie carrying a JWT rather than a bearer header
//! (browsers can't set arbitrary headers on a WS upgrade), grounded on
//! `original_source/src/api/v1/sockets.py`.

use std::sync::Arc;

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::verify_token;
use crate::routes::messages::{build_and_publish_immediate, SendMessageRequest};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(liveness))
        .route("/ws/send-message", get(ws_send_message))
}

async fn liveness() -> impl IntoResponse {
    StatusCode::OK
}

#[derive(Debug, Serialize)]
struct StatusFrame {
    status: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    queue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<u8>,
}

impl StatusFrame {
    fn ok(queue: String, priority: u8) -> Self {
        StatusFrame {
            status: "ok".to_string(),
            message: "queued".to_string(),
            queue: Some(queue),
            priority: Some(priority),
        }
    }

    fn error(message: String) -> Self {
        StatusFrame {
            status: "error".to_string(),
            message,
            queue: None,
            priority: None,
        }
    }
}

async fn ws_send_message(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> impl IntoResponse {
    let Some(token) = jar.get("access_token").map(|c| c.value().to_string()) else {
        return (StatusCode::UNAUTHORIZED, "missing access_token cookie").into_response();
    };

    if verify_token(&state, &token).is_err() {
        return (StatusCode::UNAUTHORIZED, "invalid access_token").into_response();
    }

    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Per §7: `BrokerPublishError` is reported on the WS surface as a
/// `{status:"error"}` frame rather than closing the connection — the socket
/// itself stays open so the client can keep sending (legacy surface, kept
/// per spec.md §7).
async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    while let Some(Ok(message)) = socket.recv().await {
        let Message::Text(text) = message else {
            continue;
        };

        let request: SendMessageRequest = match serde_json::from_str(&text) {
            Ok(request) => request,
            Err(e) => {
                let frame = StatusFrame::error(format!("invalid message: {e}"));
                if send_frame(&mut socket, &frame).await.is_err() {
                    return;
                }
                continue;
            }
        };

        let request_id = Uuid::new_v4().to_string();
        let frame = match build_and_publish_immediate(&state, request, &request_id).await {
            Ok((queue_name, priority)) => StatusFrame::ok(queue_name.to_string(), priority),
            Err(e) => StatusFrame::error(e.message()),
        };

        if send_frame(&mut socket, &frame).await.is_err() {
            return;
        }
    }
}

async fn send_frame(socket: &mut WebSocket, frame: &StatusFrame) -> Result<(), axum::Error> {
    let text = serde_json::to_string(frame).unwrap_or_else(|_| "{}".to_string());
    socket.send(Message::Text(text)).await
}
