pub mod client;
pub mod priorities;
pub mod queues;

pub use client::BrokerClient;
pub use priorities::PriorityLevels;
pub use queues::{route_for_event, QueueConfig};
