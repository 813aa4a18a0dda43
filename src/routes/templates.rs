//! Template CRUD (§6). Create/update accept `multipart/form-data`: `name`
//! and `subject` as form fields, `body` as a UTF-8 text file upload (§3's
//! invariant that `body` must parse under the renderer's grammar at write
//! time is enforced here before the repository call).

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::db::{CreateTemplate, Template, TemplateRepository, UpdateTemplate};
use crate::error::{AppError, AppErrorWithDetails, AppResult};
use crate::render::Renderer;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_template).get(list_templates))
        .route(
            "/:id",
            get(get_template).put(update_template).delete(delete_template),
        )
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub page_number: Option<i64>,
    #[serde(default)]
    pub page_size: Option<i64>,
}

async fn parse_multipart_fields(
    mut multipart: Multipart,
) -> Result<(String, String, String), AppErrorWithDetails> {
    let mut name = None;
    let mut subject = None;
    let mut body = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("malformed multipart body: {e}")))?
    {
        match field.name().map(str::to_string).as_deref() {
            Some("name") => {
                name = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?,
                )
            }
            Some("subject") => {
                subject = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?,
                )
            }
            Some("body") => {
                body = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?,
                )
            }
            _ => {}
        }
    }

    let name = name.ok_or_else(|| {
        AppError::Validation("missing required field: name".to_string())
            .with_details(serde_json::json!({"location": "name"}))
    })?;
    let subject = subject.ok_or_else(|| {
        AppError::Validation("missing required field: subject".to_string())
            .with_details(serde_json::json!({"location": "subject"}))
    })?;
    let body = body.ok_or_else(|| {
        AppError::Validation("missing required field: body".to_string())
            .with_details(serde_json::json!({"location": "body"}))
    })?;

    Renderer::validate(&body).map_err(|e| {
        AppError::Validation(format!("template body failed to parse: {e}"))
            .with_details(serde_json::json!({"location": "body"}))
    })?;

    Ok((name, subject, body))
}

async fn create_template(
    State(state): State<Arc<AppState>>,
    AuthUser(staff_id): AuthUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Template>), AppErrorWithDetails> {
    let (name, subject, body) = parse_multipart_fields(multipart).await?;

    let template = TemplateRepository::create(
        &state.db,
        CreateTemplate {
            name,
            subject,
            body,
            staff_id,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(template)))
}

async fn get_template(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Template>> {
    let template = TemplateRepository::get(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Template not found".to_string()))?;
    Ok(Json(template))
}

async fn update_template(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    _staff: AuthUser,
    multipart: Multipart,
) -> Result<Json<Template>, AppErrorWithDetails> {
    let (name, subject, body) = parse_multipart_fields(multipart).await?;

    let template = TemplateRepository::update(&state.db, id, UpdateTemplate { name, subject, body })
        .await?
        .ok_or_else(|| AppError::NotFound("Template not found".to_string()))?;

    Ok(Json(template))
}

async fn delete_template(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    _staff: AuthUser,
) -> AppResult<StatusCode> {
    let deleted = TemplateRepository::delete(&state.db, id).await?;
    if !deleted {
        return Err(AppError::NotFound("Template not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn list_templates(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Template>>> {
    let page_size = query.page_size.unwrap_or(20).max(1);
    let page_number = query.page_number.unwrap_or(1).max(1);
    let skip = (page_number - 1) * page_size;
    let templates = TemplateRepository::list(&state.db, skip, page_size).await?;
    Ok(Json(templates))
}
