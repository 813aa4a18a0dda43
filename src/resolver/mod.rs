//! Component C — Subscriber resolver (§4.C). Per §9's design note, this is
//! an explicit registry built once at startup rather than the original's
//! decorator-registered dynamic registry
//! (`original_source/src/services/subscriber_resolver.py`): no runtime
//! mutation, no implicit global state.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::WorkerError;

/// A named, lazily-yielding producer of subscriber-id batches. `fetch` is
/// called repeatedly with an advancing `offset`; an empty batch signals
/// exhaustion. Fetchers are finite and non-restartable within one resolve
/// cycle — callers own the offset, not the fetcher.
#[async_trait]
pub trait SubscriberFetcher: Send + Sync {
    async fn fetch(
        &self,
        pool: &SqlitePool,
        params: &serde_json::Value,
        offset: i64,
        batch_size: i64,
    ) -> Result<Vec<Uuid>, WorkerError>;
}

/// Built-in fetcher: subscribers whose birth month/day equal today (UTC),
/// grounded on
/// `original_source/src/services/subscriber_fetchers.py::fetch_birthday_users`.
pub struct BirthdayTodayFetcher;

#[async_trait]
impl SubscriberFetcher for BirthdayTodayFetcher {
    async fn fetch(
        &self,
        pool: &SqlitePool,
        _params: &serde_json::Value,
        offset: i64,
        batch_size: i64,
    ) -> Result<Vec<Uuid>, WorkerError> {
        use chrono::Datelike;
        let today = chrono::Utc::now().date_naive();
        let subscribers = crate::db::SubscriberRepository::find_birthday_today(
            pool,
            today.month(),
            today.day(),
            offset,
            batch_size,
        )
        .await
        .map_err(|e| WorkerError::MessageProcessor(e.to_string()))?;
        Ok(subscribers.into_iter().map(|s| s.id).collect())
    }
}

pub const BIRTHDAY_TODAY: &str = "birthday_today";

/// Process-wide, read-only after construction (§5's "subscriber-resolver
/// registry is initialized at startup and is read-only thereafter").
#[derive(Clone)]
pub struct SubscriberRegistry {
    fetchers: HashMap<&'static str, Arc<dyn SubscriberFetcher>>,
}

impl SubscriberRegistry {
    /// Builds the registry with the built-in fetchers wired in. Extra
    /// fetchers can be added by a caller before the registry is handed to
    /// workers, but never after.
    pub fn with_builtins() -> Self {
        let mut fetchers: HashMap<&'static str, Arc<dyn SubscriberFetcher>> = HashMap::new();
        fetchers.insert(BIRTHDAY_TODAY, Arc::new(BirthdayTodayFetcher));
        SubscriberRegistry { fetchers }
    }

    pub fn resolve(&self, query_type: &str) -> Result<Arc<dyn SubscriberFetcher>, WorkerError> {
        self.fetchers
            .get(query_type)
            .cloned()
            .ok_or_else(|| WorkerError::UnknownQueryType(query_type.to_string()))
    }

    /// Drains every batch for `query_type` eagerly into one Vec. Scheduler
    /// ticks fan a record out to all its subscribers before publishing, so
    /// there is no benefit to the caller seeing batches one at a time.
    pub async fn resolve_all(
        &self,
        pool: &SqlitePool,
        query_type: &str,
        params: &serde_json::Value,
        batch_size: i64,
    ) -> Result<Vec<Vec<Uuid>>, WorkerError> {
        let fetcher = self.resolve(query_type)?;
        let mut batches = Vec::new();
        let mut offset = 0i64;
        loop {
            let batch = fetcher.fetch(pool, params, offset, batch_size).await?;
            if batch.is_empty() {
                break;
            }
            offset += batch.len() as i64;
            batches.push(batch);
        }
        Ok(batches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_query_type_is_rejected() {
        let registry = SubscriberRegistry::with_builtins();
        let err = registry.resolve("not_a_real_fetcher").unwrap_err();
        assert!(matches!(err, WorkerError::UnknownQueryType(_)));
    }

    #[test]
    fn birthday_today_is_registered() {
        let registry = SubscriberRegistry::with_builtins();
        assert!(registry.resolve(BIRTHDAY_TODAY).is_ok());
    }
}
