use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::subscriber::Subscriber;
use crate::error::AppError;

/// Backs the in-process mock auth collaborator (§1 / §6: "the mock auth
/// service", specified only at the interface). Real deployments would call
/// out to an external auth service for `UserData`; this repository stands in
/// for that call with a local `subscribers` table seeded by migration.
pub struct SubscriberRepository;

impl SubscriberRepository {
    pub async fn get(pool: &SqlitePool, id: Uuid) -> Result<Option<Subscriber>, AppError> {
        sqlx::query_as::<_, Subscriber>("SELECT * FROM subscribers WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(AppError::Database)
    }

    /// Paginated lookup of subscribers whose birth month/day equal today
    /// (UTC), grounded on
    /// `original_source/src/services/subscriber_fetchers.py::fetch_birthday_users`.
    pub async fn find_birthday_today(
        pool: &SqlitePool,
        month: u32,
        day: u32,
        offset: i64,
        page_size: i64,
    ) -> Result<Vec<Subscriber>, AppError> {
        sqlx::query_as::<_, Subscriber>(
            r#"
            SELECT * FROM subscribers
            WHERE birth_date IS NOT NULL
              AND CAST(strftime('%m', birth_date) AS INTEGER) = ?
              AND CAST(strftime('%d', birth_date) AS INTEGER) = ?
            ORDER BY id ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(month as i64)
        .bind(day as i64)
        .bind(page_size)
        .bind(offset)
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)
    }
}
