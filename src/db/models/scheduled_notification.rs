use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::{ChannelType, EventType};

/// Component B — Record store, scheduled half (§3). `is_sent` is monotone
/// (false→true once); `scheduled_time` is always stored/compared as UTC.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ScheduledNotification {
    pub id: Uuid,
    pub staff_id: Uuid,
    pub template_id: Uuid,
    pub channel_type: ChannelType,
    pub event_type: EventType,
    pub scheduled_time: DateTime<Utc>,
    pub is_sent: bool,
    pub context: serde_json::Value,
    pub subscriber_query_type: String,
    pub subscriber_query_params: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateScheduledNotification {
    pub staff_id: Uuid,
    pub template_id: Uuid,
    pub channel_type: ChannelType,
    pub event_type: EventType,
    pub scheduled_time: DateTime<Utc>,
    pub context: serde_json::Value,
    pub subscriber_query_type: String,
    pub subscriber_query_params: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateScheduledNotification {
    pub template_id: Uuid,
    pub channel_type: ChannelType,
    pub event_type: EventType,
    pub scheduled_time: DateTime<Utc>,
    pub is_sent: bool,
    pub context: serde_json::Value,
    pub subscriber_query_type: String,
    pub subscriber_query_params: Option<serde_json::Value>,
}
