//! The three long-running loops (components I/J/K): Scheduler, Former,
//! Repeater. Grounded on teacher's `services/init.rs::spawn_background_workers`
//! for the `tokio::spawn` loop shape, generalized from "one retry worker" to
//! "N independent cron/consumer loops sharing one `WorkerContext`".

pub mod former;
pub mod repeater;
pub mod scheduler;

use sqlx::SqlitePool;

use crate::broker::BrokerClient;
use crate::config::Config;
use crate::dedup::DedupStore;
use crate::render::Renderer;
use crate::resolver::SubscriberRegistry;
use crate::sender::SenderRegistry;

/// Everything a worker loop needs, opened once per worker process (§5:
/// "one broker channel/KV client/DB session per worker process").
pub struct WorkerContext {
    pub pool: SqlitePool,
    pub broker: BrokerClient,
    pub dedup: DedupStore,
    pub subscribers: SubscriberRegistry,
    pub renderer: Renderer,
    pub senders: SenderRegistry,
    pub config: Config,
}

/// Deep-merges `patch` into `base`, with `patch`'s fields taking precedence.
/// Used to build a render context out of `UserData.fields ∪ unit.context`
/// (§4.J step 4c) — the subscriber's own fields, overridden by whatever the
/// notification's own context explicitly sets.
pub fn merge_json(base: &mut serde_json::Value, patch: &serde_json::Value) {
    if let (Some(base_map), Some(patch_map)) = (base.as_object_mut(), patch.as_object()) {
        for (key, value) in patch_map {
            base_map.insert(key.clone(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merge_overrides_base_fields() {
        let mut base = json!({"first_name": "Ada", "email": "ada@example.com"});
        let patch = json!({"email": "override@example.com", "subject": "Hi"});
        merge_json(&mut base, &patch);
        assert_eq!(base["first_name"], "Ada");
        assert_eq!(base["email"], "override@example.com");
        assert_eq!(base["subject"], "Hi");
    }
}
