//! ScheduledNotification CRUD (§6). Mutations require a JWT (the creating
//! `staff_id` is taken from the token, never from the request body).

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::db::{
    CreateScheduledNotification, ScheduledNotification, ScheduledNotificationRepository,
    UpdateScheduledNotification,
};
use crate::error::{AppError, AppResult};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_scheduled).post(create_scheduled))
        .route(
            "/:id",
            get(get_scheduled).put(update_scheduled).delete(delete_scheduled),
        )
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub page_number: Option<i64>,
    #[serde(default)]
    pub page_size: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateScheduledBody {
    pub template_id: Uuid,
    pub channel_type: crate::domain::ChannelType,
    pub event_type: crate::domain::EventType,
    pub scheduled_time: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    pub context: serde_json::Value,
    pub subscriber_query_type: String,
    #[serde(default)]
    pub subscriber_query_params: Option<serde_json::Value>,
}

async fn create_scheduled(
    State(state): State<Arc<AppState>>,
    AuthUser(staff_id): AuthUser,
    Json(body): Json<CreateScheduledBody>,
) -> AppResult<(StatusCode, Json<ScheduledNotification>)> {
    let record = ScheduledNotificationRepository::create(
        &state.db,
        CreateScheduledNotification {
            staff_id,
            template_id: body.template_id,
            channel_type: body.channel_type,
            event_type: body.event_type,
            scheduled_time: body.scheduled_time,
            context: body.context,
            subscriber_query_type: body.subscriber_query_type,
            subscriber_query_params: body.subscriber_query_params,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn get_scheduled(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ScheduledNotification>> {
    let record = ScheduledNotificationRepository::get(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Scheduled notification not found".to_string()))?;
    Ok(Json(record))
}

async fn update_scheduled(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    _staff: AuthUser,
    Json(input): Json<UpdateScheduledNotification>,
) -> AppResult<Json<ScheduledNotification>> {
    let record = ScheduledNotificationRepository::update(&state.db, id, input)
        .await?
        .ok_or_else(|| AppError::NotFound("Scheduled notification not found".to_string()))?;
    Ok(Json(record))
}

async fn delete_scheduled(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    _staff: AuthUser,
) -> AppResult<StatusCode> {
    let deleted = ScheduledNotificationRepository::delete(&state.db, id).await?;
    if !deleted {
        return Err(AppError::NotFound("Scheduled notification not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn list_scheduled(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<ScheduledNotification>>> {
    let page_size = query.page_size.unwrap_or(20).max(1);
    let page_number = query.page_number.unwrap_or(1).max(1);
    let skip = (page_number - 1) * page_size;
    let records = ScheduledNotificationRepository::list(&state.db, skip, page_size).await?;
    Ok(Json(records))
}
