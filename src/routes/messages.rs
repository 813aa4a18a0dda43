//! Component L — Ingress (§4.L, §6). Validates an immediate-send request,
//! fetches its template, routes via §4.F, and publishes — propagating the
//! request's `X-Request-Id` as a broker header. Grounded on teacher's
//! `routes/notifications.rs` handler shape plus
//! `original_source/src/api/v1/messages.py` for the exact request/response
//! fields.

use std::sync::Arc;
use std::str::FromStr;

use axum::{extract::State, http::StatusCode, routing::post, Extension, Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::broker::route_for_event;
use crate::db::TemplateRepository;
use crate::domain::{ChannelType, EventType, MessageType, WorkUnit};
use crate::error::{AppError, AppErrorWithDetails};
use crate::middleware::request_id::RequestId;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub template_id: Uuid,
    pub event_type: String,
    pub channel_type: String,
    pub subscribers: Vec<Uuid>,
    #[serde(default)]
    pub context: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub status: String,
    pub message: String,
    pub queue: String,
    pub priority: u8,
    pub x_request_id: String,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/send-message/", post(send_message))
}

/// Builds a `WorkUnit` for an immediate send and publishes it via the
/// priority router. Shared with the WebSocket ingress handler so both
/// surfaces apply identical validation and routing.
pub async fn build_and_publish_immediate(
    state: &Arc<AppState>,
    request: SendMessageRequest,
    request_id: &str,
) -> Result<(&'static str, u8), AppErrorWithDetails> {
    let event_type = EventType::from_str(&request.event_type).map_err(|_| {
        AppError::Validation(format!("invalid event_type: {}", request.event_type))
            .with_details(serde_json::json!({"location": "event_type", "value": request.event_type}))
    })?;

    let channel_type = ChannelType::from_str(&request.channel_type).map_err(|_| {
        AppError::Validation(format!("invalid channel_type: {}", request.channel_type))
            .with_details(serde_json::json!({"location": "channel_type", "value": request.channel_type}))
    })?;

    let template = TemplateRepository::get(&state.db, request.template_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Template not found".to_string()))?;

    let (queue, priority) = route_for_event(event_type);

    let unit = WorkUnit {
        template_id: template.id,
        context: request.context,
        subscribers: request.subscribers,
        event_type,
        channel_type,
        notification_id: None,
        message_type: MessageType::Immediate,
    };

    let body = serde_json::to_vec(&unit)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to encode WorkUnit: {e}")))?;

    state
        .broker
        .send_message(queue.queue_name, &body, priority, Some(request_id))
        .await?;

    Ok((queue.queue_name, priority))
}

async fn send_message(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<SendMessageResponse>), AppErrorWithDetails> {
    let template_id = request.template_id;
    let event_type_raw = request.event_type.clone();
    let (queue_name, priority) =
        build_and_publish_immediate(&state, request, &request_id.0).await?;

    tracing::info!(
        "ingress: queued immediate send for template {} ({}) on {}",
        template_id,
        event_type_raw,
        queue_name
    );

    Ok((
        StatusCode::CREATED,
        Json(SendMessageResponse {
            status: "ok".to_string(),
            message: "queued".to_string(),
            queue: queue_name.to_string(),
            priority,
            x_request_id: request_id.0,
        }),
    ))
}
