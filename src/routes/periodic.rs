//! PeriodicNotification CRUD (§6, JWT required on mutations). `next_run_time`
//! on create defaults to `cron.next(created_at)` when the caller doesn't
//! supply one, per §9's "compute `next_run_time` from `last_run_time` if
//! set, else `now`" design note.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::cron::CronSchedule;
use crate::db::{
    CreatePeriodicNotification, PeriodicNotification, PeriodicNotificationRepository,
    UpdatePeriodicNotification,
};
use crate::error::{AppError, AppResult};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_periodic).post(create_periodic))
        .route(
            "/:id",
            get(get_periodic).put(update_periodic).delete(delete_periodic),
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
pub struct CreatePeriodicBody {
    pub template_id: Uuid,
    pub channel_type: crate::domain::ChannelType,
    pub event_type: crate::domain::EventType,
    pub subscriber_query_type: String,
    #[serde(default)]
    pub subscriber_query_params: Option<serde_json::Value>,
    pub cron_schedule: String,
    #[serde(default)]
    pub context: serde_json::Value,
    #[serde(default)]
    pub stop_date: Option<chrono::DateTime<Utc>>,
}

async fn create_periodic(
    State(state): State<Arc<AppState>>,
    AuthUser(staff_id): AuthUser,
    Json(body): Json<CreatePeriodicBody>,
) -> AppResult<(StatusCode, Json<PeriodicNotification>)> {
    let schedule = CronSchedule::parse(&body.cron_schedule)
        .map_err(|e| AppError::Validation(format!("invalid cron_schedule: {e}")))?;

    let now = Utc::now();
    if let Some(stop_date) = body.stop_date {
        if stop_date <= now {
            return Err(AppError::Validation(
                "stop_date must be in the future".to_string(),
            ));
        }
    }

    let next_run_time = schedule.next(now);

    let record = PeriodicNotificationRepository::create(
        &state.db,
        CreatePeriodicNotification {
            staff_id,
            template_id: body.template_id,
            channel_type: body.channel_type,
            event_type: body.event_type,
            subscriber_query_type: body.subscriber_query_type,
            subscriber_query_params: body.subscriber_query_params,
            cron_schedule: body.cron_schedule,
            next_run_time: Some(next_run_time),
            context: body.context,
            stop_date: body.stop_date,
        },
        next_run_time,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(record)))
}

async fn get_periodic(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<PeriodicNotification>> {
    let record = PeriodicNotificationRepository::get(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Periodic notification not found".to_string()))?;
    Ok(Json(record))
}

async fn update_periodic(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    _staff: AuthUser,
    Json(input): Json<UpdatePeriodicNotification>,
) -> AppResult<Json<PeriodicNotification>> {
    CronSchedule::parse(&input.cron_schedule)
        .map_err(|e| AppError::Validation(format!("invalid cron_schedule: {e}")))?;

    let record = PeriodicNotificationRepository::update(&state.db, id, input)
        .await?
        .ok_or_else(|| AppError::NotFound("Periodic notification not found".to_string()))?;
    Ok(Json(record))
}

async fn delete_periodic(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    _staff: AuthUser,
) -> AppResult<StatusCode> {
    let deleted = PeriodicNotificationRepository::delete(&state.db, id).await?;
    if !deleted {
        return Err(AppError::NotFound("Periodic notification not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn list_periodic(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<PeriodicNotification>>> {
    let page_size = query.page_size.unwrap_or(20).max(1);
    let page_number = query.page_number.unwrap_or(1).max(1);
    let skip = (page_number - 1) * page_size;
    let records = PeriodicNotificationRepository::list(&state.db, skip, page_size).await?;
    Ok(Json(records))
}
