use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::{ChannelType, EventType};

/// Component B — Record store, periodic half (§3): "as Scheduled plus"
/// cron_schedule/last_run_time/next_run_time/is_active/stop_date. Unlike the
/// original's occasional plain-string `subscribers` column (§9 Open Question
/// b), this record never materializes a subscriber list — subscriber fan-out
/// always goes through `subscriber_query_type`/`subscriber_query_params`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PeriodicNotification {
    pub id: Uuid,
    pub staff_id: Uuid,
    pub template_id: Uuid,
    pub channel_type: ChannelType,
    pub event_type: EventType,
    pub subscriber_query_type: String,
    pub subscriber_query_params: Option<serde_json::Value>,
    pub cron_schedule: String,
    pub last_run_time: Option<DateTime<Utc>>,
    pub next_run_time: DateTime<Utc>,
    pub is_active: bool,
    pub context: serde_json::Value,
    pub stop_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePeriodicNotification {
    pub staff_id: Uuid,
    pub template_id: Uuid,
    pub channel_type: ChannelType,
    pub event_type: EventType,
    pub subscriber_query_type: String,
    pub subscriber_query_params: Option<serde_json::Value>,
    pub cron_schedule: String,
    pub next_run_time: Option<DateTime<Utc>>,
    pub context: serde_json::Value,
    pub stop_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePeriodicNotification {
    pub template_id: Uuid,
    pub channel_type: ChannelType,
    pub event_type: EventType,
    pub subscriber_query_type: String,
    pub subscriber_query_params: Option<serde_json::Value>,
    pub cron_schedule: String,
    pub is_active: bool,
    pub context: serde_json::Value,
    pub stop_date: Option<DateTime<Utc>>,
}
