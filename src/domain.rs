//! Enumerations shared across the whole pipeline: the event/channel taxonomy
//! (§3), the work-unit message type (§3), and the `WorkUnit` broker payload
//! itself. Grounded on `original_source/src/enums/db.py` (NotificationType,
//! EventType) and `original_source/src/enums/rabbitmq.py` (MessageType).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, std::hash::Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ChannelType {
    Email,
    Sms,
    Push,
}

impl ChannelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelType::Email => "email",
            ChannelType::Sms => "sms",
            ChannelType::Push => "push",
        }
    }
}

impl std::str::FromStr for ChannelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(ChannelType::Email),
            "sms" => Ok(ChannelType::Sms),
            "push" => Ok(ChannelType::Push),
            other => Err(format!("unknown channel_type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    UserRegistration,
    NewMovie,
    Custom,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::UserRegistration => "user_registration",
            EventType::NewMovie => "new_movie",
            EventType::Custom => "custom",
        }
    }
}

impl std::str::FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user_registration" => Ok(EventType::UserRegistration),
            "new_movie" => Ok(EventType::NewMovie),
            "custom" => Ok(EventType::Custom),
            other => Err(format!("unknown event_type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Immediate,
    Scheduled,
    Periodic,
}

/// The broker payload (§3). Carried as JSON with an optional `X-Request-Id`
/// broker header threaded alongside it (not part of the payload itself).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkUnit {
    pub template_id: Uuid,
    pub context: serde_json::Value,
    pub subscribers: Vec<Uuid>,
    pub event_type: EventType,
    pub channel_type: ChannelType,
    pub notification_id: Option<Uuid>,
    pub message_type: MessageType,
}
