pub mod email;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::ChannelType;
use crate::error::WorkerError;

/// Component H — one sender per channel. `send` composes and delivers a
/// single message; transient failures are the sender's own concern (the
/// email sender retries internally, §4.H) — by the time `send` returns
/// `Err`, the Former pushes straight to the DLQ.
#[async_trait]
pub trait Sender: Send + Sync {
    async fn send(&self, target: &str, subject: &str, body: &str) -> Result<(), WorkerError>;
}

/// `channel_type → Sender`. SMS/push are registered as `None` — encountering
/// a nil slot is a log-and-drop, never a DLQ push (there is nothing to
/// retry), per §4.H.
#[derive(Clone, Default)]
pub struct SenderRegistry {
    senders: HashMap<ChannelType, Arc<dyn Sender>>,
}

impl SenderRegistry {
    pub fn new() -> Self {
        SenderRegistry {
            senders: HashMap::new(),
        }
    }

    pub fn register(&mut self, channel: ChannelType, sender: Arc<dyn Sender>) {
        self.senders.insert(channel, sender);
    }

    /// `None` means a nil slot (channel registered but unimplemented, e.g.
    /// SMS/push) or a channel never registered at all — callers treat both
    /// the same way: log and drop.
    pub fn get(&self, channel: ChannelType) -> Option<Arc<dyn Sender>> {
        self.senders.get(&channel).cloned()
    }
}
