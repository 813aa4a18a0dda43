//! Fixed queue configuration (§4.E) and the event→queue priority router
//! (§4.F). Grounded on `original_source/src/enums/rabbitmq.py`
//! (`RabbitMQQueues`, `EVENT_TO_QUEUE_MAPPING`, `get_queue_for_event`).

use crate::broker::priorities::PriorityLevels;
use crate::domain::EventType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueBucket {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy)]
pub struct QueueConfig {
    pub bucket: QueueBucket,
    pub queue_name: &'static str,
    pub message_ttl_ms: u64,
}

pub const HIGH: QueueConfig = QueueConfig {
    bucket: QueueBucket::High,
    queue_name: "notifications.high",
    message_ttl_ms: 3_600_000,
};

pub const MEDIUM: QueueConfig = QueueConfig {
    bucket: QueueBucket::Medium,
    queue_name: "notifications.medium",
    message_ttl_ms: 7_200_000,
};

pub const LOW: QueueConfig = QueueConfig {
    bucket: QueueBucket::Low,
    queue_name: "notifications.low",
    message_ttl_ms: 10_800_000,
};

pub const ALL_QUEUES: [QueueConfig; 3] = [HIGH, MEDIUM, LOW];

pub fn queue_by_name(name: &str) -> Option<QueueConfig> {
    ALL_QUEUES.into_iter().find(|q| q.queue_name == name)
}

pub fn list_names() -> Vec<&'static str> {
    ALL_QUEUES.iter().map(|q| q.queue_name).collect()
}

/// Static `event_type → (queue, priority)` mapping (§4.F). Both lookups
/// default to the MEDIUM/avg bucket for unmapped event types.
pub fn route_for_event(event_type: EventType) -> (QueueConfig, u8) {
    let levels = PriorityLevels::from_max_priority(crate::broker::priorities::MAX_PRIORITY);
    match event_type {
        EventType::UserRegistration => (HIGH, levels.max),
        EventType::NewMovie => (LOW, levels.min),
        EventType::Custom => (MEDIUM, levels.avg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_known_event_types() {
        assert_eq!(
            route_for_event(EventType::UserRegistration).0.queue_name,
            "notifications.high"
        );
        assert_eq!(route_for_event(EventType::UserRegistration).1, 5);
        assert_eq!(
            route_for_event(EventType::NewMovie).0.queue_name,
            "notifications.low"
        );
        assert_eq!(route_for_event(EventType::NewMovie).1, 1);
        assert_eq!(
            route_for_event(EventType::Custom).0.queue_name,
            "notifications.medium"
        );
        assert_eq!(route_for_event(EventType::Custom).1, 3);
    }

    #[test]
    fn queue_by_name_roundtrips() {
        for q in ALL_QUEUES {
            assert_eq!(queue_by_name(q.queue_name).unwrap().queue_name, q.queue_name);
        }
        assert!(queue_by_name("does-not-exist").is_none());
    }
}
