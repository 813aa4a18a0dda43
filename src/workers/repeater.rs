//! Component K — Repeater worker (§4.K). Cron-driven; drains each queue's
//! DLQ list back into the broker at minimum priority. Grounded on
//! `original_source/src/workers/repeater.py`.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Utc;

use crate::broker::queues::list_names;
use crate::cron::CronSchedule;
use crate::workers::WorkerContext;

const REPEATER_PRIORITY: u8 = 1;

/// One repeater tick: for each queue, pop up to `repeater_batch_size`
/// entries and republish them. A republish failure pushes the payload back
/// and breaks out of that queue's loop, preserving ordering and avoiding a
/// tight failure spin (§4.K).
async fn run_tick(ctx: &WorkerContext) {
    for queue_name in list_names() {
        for _ in 0..ctx.config.schedule.repeater_batch_size {
            let payload = match ctx.dedup.dlq_pop(queue_name).await {
                Ok(Some(payload)) => payload,
                Ok(None) => break,
                Err(e) => {
                    tracing::error!("repeater: dlq_pop({}) failed: {}", queue_name, e);
                    break;
                }
            };

            if let Err(e) = ctx
                .broker
                .send_message(queue_name, &payload, REPEATER_PRIORITY, None)
                .await
            {
                tracing::error!(
                    "repeater: republish to {} failed ({}), pushing payload back",
                    queue_name,
                    e
                );
                if let Err(e) = ctx.dedup.dlq_push(queue_name, &payload).await {
                    tracing::error!("repeater: failed to push payload back to {}: {}", queue_name, e);
                }
                break;
            }
        }
    }
}

/// Entry point for `workers repeater`.
pub async fn run(ctx: Arc<WorkerContext>) -> anyhow::Result<()> {
    let schedule = CronSchedule::parse(&ctx.config.schedule.repeater_schedule)
        .map_err(|e| anyhow::anyhow!("invalid notify_repeater_schedule: {e}"))?;

    loop {
        let now = Utc::now();
        let next = schedule.next(now);
        let sleep_for = (next - now).to_std().unwrap_or(StdDuration::from_secs(1));
        tokio::time::sleep(sleep_for).await;
        run_tick(&ctx).await;
    }
}
