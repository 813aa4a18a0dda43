use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::template::{CreateTemplate, Template, UpdateTemplate};
use crate::db::repository::map_write_error;
use crate::error::AppError;

/// Component A — Template store (§4.A). `body` syntax is validated by the
/// caller (the renderer's grammar) before `create`/`update` are invoked.
pub struct TemplateRepository;

impl TemplateRepository {
    pub async fn create(pool: &SqlitePool, input: CreateTemplate) -> Result<Template, AppError> {
        let id = Uuid::new_v4();
        let now = chrono::Utc::now();
        sqlx::query_as::<_, Template>(
            r#"
            INSERT INTO templates (id, name, subject, body, staff_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id, name, subject, body, staff_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.subject)
        .bind(&input.body)
        .bind(input.staff_id)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(map_write_error)
    }

    pub async fn get(pool: &SqlitePool, id: Uuid) -> Result<Option<Template>, AppError> {
        sqlx::query_as::<_, Template>("SELECT * FROM templates WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(AppError::Database)
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        input: UpdateTemplate,
    ) -> Result<Option<Template>, AppError> {
        let now = chrono::Utc::now();
        sqlx::query_as::<_, Template>(
            r#"
            UPDATE templates
            SET name = ?, subject = ?, body = ?, updated_at = ?
            WHERE id = ?
            RETURNING id, name, subject, body, staff_id, created_at, updated_at
            "#,
        )
        .bind(&input.name)
        .bind(&input.subject)
        .bind(&input.body)
        .bind(now)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(map_write_error)
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM templates WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await
            .map_err(AppError::Database)?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list(pool: &SqlitePool, skip: i64, limit: i64) -> Result<Vec<Template>, AppError> {
        sqlx::query_as::<_, Template>(
            "SELECT * FROM templates ORDER BY created_at DESC LIMIT ? OFFSET ?",
        )
        .bind(limit)
        .bind(skip)
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)
    }
}
