use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::periodic_notification::{
    CreatePeriodicNotification, PeriodicNotification, UpdatePeriodicNotification,
};
use crate::db::repository::map_write_error;
use crate::error::AppError;

/// Component B, periodic half (§4.A/§4.B).
pub struct PeriodicNotificationRepository;

impl PeriodicNotificationRepository {
    pub async fn create(
        pool: &SqlitePool,
        input: CreatePeriodicNotification,
        next_run_time: DateTime<Utc>,
    ) -> Result<PeriodicNotification, AppError> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        sqlx::query_as::<_, PeriodicNotification>(
            r#"
            INSERT INTO periodic_notifications
                (id, staff_id, template_id, channel_type, event_type,
                 subscriber_query_type, subscriber_query_params, cron_schedule,
                 last_run_time, next_run_time, is_active, context, stop_date,
                 created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, NULL, ?, 1, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.staff_id)
        .bind(input.template_id)
        .bind(input.channel_type)
        .bind(input.event_type)
        .bind(input.subscriber_query_type)
        .bind(input.subscriber_query_params)
        .bind(input.cron_schedule)
        .bind(next_run_time)
        .bind(input.context)
        .bind(input.stop_date)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(map_write_error)
    }

    pub async fn get(pool: &SqlitePool, id: Uuid) -> Result<Option<PeriodicNotification>, AppError> {
        sqlx::query_as::<_, PeriodicNotification>("SELECT * FROM periodic_notifications WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(AppError::Database)
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        input: UpdatePeriodicNotification,
    ) -> Result<Option<PeriodicNotification>, AppError> {
        let now = Utc::now();
        sqlx::query_as::<_, PeriodicNotification>(
            r#"
            UPDATE periodic_notifications
            SET template_id = ?, channel_type = ?, event_type = ?,
                subscriber_query_type = ?, subscriber_query_params = ?, cron_schedule = ?,
                is_active = ?, context = ?, stop_date = ?, updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(input.template_id)
        .bind(input.channel_type)
        .bind(input.event_type)
        .bind(input.subscriber_query_type)
        .bind(input.subscriber_query_params)
        .bind(input.cron_schedule)
        .bind(input.is_active)
        .bind(input.context)
        .bind(input.stop_date)
        .bind(now)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(map_write_error)
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM periodic_notifications WHERE id = ?")
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
    ) -> Result<Vec<PeriodicNotification>, AppError> {
        sqlx::query_as::<_, PeriodicNotification>(
            "SELECT * FROM periodic_notifications ORDER BY created_at DESC LIMIT ? OFFSET ?",
        )
        .bind(limit)
        .bind(skip)
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)
    }

    /// Atomically deactivates records whose `stop_date` has passed, then
    /// returns active records due now, ordered by `next_run_time` — in that
    /// order, per §4.B: "first performs an atomic transition ... then
    /// returns".
    pub async fn get_pending(
        pool: &SqlitePool,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<PeriodicNotification>, AppError> {
        Self::deactivate_expired(pool, now).await?;

        sqlx::query_as::<_, PeriodicNotification>(
            r#"
            SELECT * FROM periodic_notifications
            WHERE is_active = 1 AND next_run_time <= ?
            ORDER BY next_run_time ASC
            LIMIT ?
            "#,
        )
        .bind(now)
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)
    }

    async fn deactivate_expired(pool: &SqlitePool, now: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE periodic_notifications SET is_active = 0, updated_at = ? \
             WHERE is_active = 1 AND stop_date IS NOT NULL AND stop_date <= ?",
        )
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .map_err(AppError::Database)?;
        Ok(())
    }

    /// Advances `last_run_time`/`next_run_time` after a tick has published
    /// every subscriber batch. Per §9 design note (c) / Open Question (c),
    /// `now` is passed as both the new `last_run_time` and the base for
    /// `cron.next`, deliberately preserving the original's quirk rather than
    /// computing `next` from the record's prior `last_run_time`.
    pub async fn update_run_time(
        pool: &SqlitePool,
        id: Uuid,
        now: DateTime<Utc>,
        next_run_time: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE periodic_notifications SET last_run_time = ?, next_run_time = ?, updated_at = ? \
             WHERE id = ?",
        )
        .bind(now)
        .bind(next_run_time)
        .bind(now)
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
    use crate::db::repository::template::TemplateRepository;
    use crate::db::models::template::CreateTemplate;
    use crate::domain::{ChannelType, EventType};
    use chrono::Duration;

    async fn memory_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        pool
    }

    async fn seed_template(pool: &SqlitePool) -> Uuid {
        let template = TemplateRepository::create(
            pool,
            CreateTemplate {
                name: "welcome".into(),
                subject: "Hi {{ first_name }}".into(),
                body: "Welcome, {{ first_name }}!".into(),
                staff_id: Uuid::new_v4(),
            },
        )
        .await
        .unwrap();
        template.id
    }

    /// Scenario 6 (spec.md §8): a record with `stop_date = now-1s` is
    /// deactivated on the next `get_pending` call and excluded from its result.
    #[tokio::test]
    async fn get_pending_deactivates_expired_records() {
        let pool = memory_pool().await;
        let template_id = seed_template(&pool).await;
        let now = Utc::now();

        let record = PeriodicNotificationRepository::create(
            &pool,
            CreatePeriodicNotification {
                staff_id: Uuid::new_v4(),
                template_id,
                channel_type: ChannelType::Email,
                event_type: EventType::Custom,
                subscriber_query_type: "all".to_string(),
                subscriber_query_params: None,
                cron_schedule: "*/5 * * * *".to_string(),
                next_run_time: Some(now - Duration::seconds(5)),
                context: serde_json::json!({}),
                stop_date: Some(now - Duration::seconds(1)),
            },
            now - Duration::seconds(5),
        )
        .await
        .unwrap();

        let pending = PeriodicNotificationRepository::get_pending(&pool, now, 10)
            .await
            .unwrap();
        assert!(pending.iter().all(|r| r.id != record.id));

        let reloaded = PeriodicNotificationRepository::get(&pool, record.id)
            .await
            .unwrap()
            .unwrap();
        assert!(!reloaded.is_active);
    }

    #[tokio::test]
    async fn get_pending_returns_active_due_records() {
        let pool = memory_pool().await;
        let template_id = seed_template(&pool).await;
        let now = Utc::now();

        let record = PeriodicNotificationRepository::create(
            &pool,
            CreatePeriodicNotification {
                staff_id: Uuid::new_v4(),
                template_id,
                channel_type: ChannelType::Email,
                event_type: EventType::Custom,
                subscriber_query_type: "all".to_string(),
                subscriber_query_params: None,
                cron_schedule: "*/5 * * * *".to_string(),
                next_run_time: Some(now - Duration::seconds(5)),
                context: serde_json::json!({}),
                stop_date: None,
            },
            now - Duration::seconds(5),
        )
        .await
        .unwrap();

        let pending = PeriodicNotificationRepository::get_pending(&pool, now, 10)
            .await
            .unwrap();
        assert!(pending.iter().any(|r| r.id == record.id));
    }
}
