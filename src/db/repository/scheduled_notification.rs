use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::scheduled_notification::{
    CreateScheduledNotification, ScheduledNotification, UpdateScheduledNotification,
};
use crate::db::repository::map_write_error;
use crate::error::AppError;

/// Component B, scheduled half (§4.A/§4.B).
pub struct ScheduledNotificationRepository;

impl ScheduledNotificationRepository {
    pub async fn create(
        pool: &SqlitePool,
        input: CreateScheduledNotification,
    ) -> Result<ScheduledNotification, AppError> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        sqlx::query_as::<_, ScheduledNotification>(
            r#"
            INSERT INTO scheduled_notifications
                (id, staff_id, template_id, channel_type, event_type, scheduled_time,
                 is_sent, context, subscriber_query_type, subscriber_query_params,
                 created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.staff_id)
        .bind(input.template_id)
        .bind(input.channel_type)
        .bind(input.event_type)
        .bind(input.scheduled_time)
        .bind(input.context)
        .bind(input.subscriber_query_type)
        .bind(input.subscriber_query_params)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(map_write_error)
    }

    pub async fn get(
        pool: &SqlitePool,
        id: Uuid,
    ) -> Result<Option<ScheduledNotification>, AppError> {
        sqlx::query_as::<_, ScheduledNotification>(
            "SELECT * FROM scheduled_notifications WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        input: UpdateScheduledNotification,
    ) -> Result<Option<ScheduledNotification>, AppError> {
        let now = Utc::now();
        sqlx::query_as::<_, ScheduledNotification>(
            r#"
            UPDATE scheduled_notifications
            SET template_id = ?, channel_type = ?, event_type = ?, scheduled_time = ?,
                is_sent = ?, context = ?, subscriber_query_type = ?, subscriber_query_params = ?,
                updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(input.template_id)
        .bind(input.channel_type)
        .bind(input.event_type)
        .bind(input.scheduled_time)
        .bind(input.is_sent)
        .bind(input.context)
        .bind(input.subscriber_query_type)
        .bind(input.subscriber_query_params)
        .bind(now)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(map_write_error)
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM scheduled_notifications WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await
            .map_err(AppError::Database)?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list(
        pool: &SqlitePool,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<ScheduledNotification>, AppError> {
        sqlx::query_as::<_, ScheduledNotification>(
            "SELECT * FROM scheduled_notifications ORDER BY scheduled_time DESC LIMIT ? OFFSET ?",
        )
        .bind(limit)
        .bind(skip)
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)
    }

    /// Unsent records whose `scheduled_time <= now`, ordered by
    /// `scheduled_time` ascending with `id` as a deterministic tiebreak (§4.A).
    pub async fn get_pending(
        pool: &SqlitePool,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<ScheduledNotification>, AppError> {
        sqlx::query_as::<_, ScheduledNotification>(
            r#"
            SELECT * FROM scheduled_notifications
            WHERE is_sent = 0 AND scheduled_time <= ?
            ORDER BY scheduled_time ASC, id ASC
            LIMIT ?
            "#,
        )
        .bind(now)
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)
    }

    /// Marks a record sent after the Scheduler has published every
    /// subscriber batch for it (§4.I step 3). Monotone false→true.
    pub async fn mark_sent(pool: &SqlitePool, id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE scheduled_notifications SET is_sent = 1, updated_at = ? WHERE id = ?",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .map_err(AppError::Database)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::template::CreateTemplate;
    use crate::db::repository::template::TemplateRepository;
    use crate::domain::{ChannelType, EventType};
    use chrono::Duration;

    async fn memory_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        pool
    }

    /// Round-trip/idempotence (spec.md §8): create -> update(is_sent=true)
    /// -> get returns is_sent=true, and the record drops out of get_pending.
    #[tokio::test]
    async fn mark_sent_is_monotone_and_excludes_from_pending() {
        let pool = memory_pool().await;
        let template = TemplateRepository::create(
            &pool,
            CreateTemplate {
                name: "t".into(),
                subject: "s".into(),
                body: "b".into(),
                staff_id: Uuid::new_v4(),
            },
        )
        .await
        .unwrap();

        let now = Utc::now();
        let record = ScheduledNotificationRepository::create(
            &pool,
            CreateScheduledNotification {
                staff_id: Uuid::new_v4(),
                template_id: template.id,
                channel_type: ChannelType::Email,
                event_type: EventType::Custom,
                scheduled_time: now - Duration::seconds(1),
                context: serde_json::json!({}),
                subscriber_query_type: "all".to_string(),
                subscriber_query_params: None,
            },
        )
        .await
        .unwrap();
        assert!(!record.is_sent);

        let pending_before = ScheduledNotificationRepository::get_pending(&pool, now, 10)
            .await
            .unwrap();
        assert!(pending_before.iter().any(|r| r.id == record.id));

        ScheduledNotificationRepository::mark_sent(&pool, record.id)
            .await
            .unwrap();

        let reloaded = ScheduledNotificationRepository::get(&pool, record.id)
            .await
            .unwrap()
            .unwrap();
        assert!(reloaded.is_sent);

        let pending_after = ScheduledNotificationRepository::get_pending(&pool, now, 10)
            .await
            .unwrap();
        assert!(pending_after.iter().all(|r| r.id != record.id));
    }
}
