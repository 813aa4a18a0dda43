//! Component I — Scheduler worker (§4.I). Two independently cron-driven
//! ticks share one loop body each: the periodic tick (`notify_periodic_schedule`)
//! expands due `PeriodicNotification`s, the scheduled tick
//! (`notify_scheduled_schedule`) expands due `ScheduledNotification`s. Grounded
//! on `original_source/src/workers/scheduler.py`.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Utc;
use serde_json::json;

use crate::broker::route_for_event;
use crate::cron::CronSchedule;
use crate::db::{PeriodicNotificationRepository, ScheduledNotificationRepository};
use crate::domain::{ChannelType, EventType, MessageType, WorkUnit};
use crate::error::{WorkerError, WorkerResult};
use crate::workers::WorkerContext;

/// Resolves subscribers in batches and publishes one `WorkUnit` per batch,
/// per §4.I steps 2a/3 ("for each batch yielded ..., build a WorkUnit ...,
/// publish").
#[allow(clippy::too_many_arguments)]
async fn expand_and_publish(
    ctx: &WorkerContext,
    template_id: uuid::Uuid,
    context: serde_json::Value,
    event_type: EventType,
    channel_type: ChannelType,
    notification_id: Option<uuid::Uuid>,
    message_type: MessageType,
    subscriber_query_type: &str,
    subscriber_query_params: &serde_json::Value,
    batch_size: i64,
) -> WorkerResult<()> {
    let batches = ctx
        .subscribers
        .resolve_all(&ctx.pool, subscriber_query_type, subscriber_query_params, batch_size)
        .await?;

    let (queue, priority) = route_for_event(event_type);

    for batch in batches {
        let unit = WorkUnit {
            template_id,
            context: context.clone(),
            subscribers: batch,
            event_type,
            channel_type,
            notification_id,
            message_type,
        };
        let body = serde_json::to_vec(&unit)?;
        ctx.broker
            .send_message(queue.queue_name, &body, priority, None)
            .await
            .map_err(|e| WorkerError::BrokerPublish(e.to_string()))?;
    }

    Ok(())
}

/// One periodic tick (§4.I steps 2a/2b). Publish failures/unknown query
/// types are logged and the record's `last_run_time`/`next_run_time` is left
/// untouched so the next tick retries it (bounded at-least-once, per the
/// edge case note).
async fn run_periodic_tick(ctx: &WorkerContext) {
    let now = Utc::now();

    let records = match PeriodicNotificationRepository::get_pending(&ctx.pool, now, i64::MAX).await
    {
        Ok(records) => records,
        Err(e) => {
            tracing::error!("scheduler: failed to load pending periodic records: {}", e);
            return;
        }
    };

    for record in records {
        let params = record.subscriber_query_params.clone().unwrap_or_else(|| json!({}));

        let result = expand_and_publish(
            ctx,
            record.template_id,
            record.context.clone(),
            record.event_type,
            record.channel_type,
            Some(record.id),
            MessageType::Periodic,
            &record.subscriber_query_type,
            &params,
            100,
        )
        .await;

        match result {
            Ok(()) => {
                let schedule = match CronSchedule::parse(&record.cron_schedule) {
                    Ok(schedule) => schedule,
                    Err(e) => {
                        tracing::error!(
                            "scheduler: periodic {} has an unparseable cron_schedule ({}), skipping",
                            record.id,
                            e
                        );
                        continue;
                    }
                };
                // §9 design note (c): `now` is the base for both
                // `last_run_time` and `cron.next`, preserved deliberately.
                let next_run_time = schedule.next(now);
                if let Err(e) =
                    PeriodicNotificationRepository::update_run_time(&ctx.pool, record.id, now, next_run_time)
                        .await
                {
                    tracing::error!("scheduler: failed to advance periodic {}: {}", record.id, e);
                }
            }
            Err(WorkerError::UnknownQueryType(query_type)) => {
                tracing::warn!(
                    "scheduler: periodic {} references unknown query type {}, skipping",
                    record.id,
                    query_type
                );
            }
            Err(e) => {
                tracing::error!(
                    "scheduler: failed to expand periodic {}: {}, will retry next tick",
                    record.id,
                    e
                );
            }
        }
    }
}

/// One scheduled tick (§4.I step 3).
async fn run_scheduled_tick(ctx: &WorkerContext) {
    let now = Utc::now();

    let records = match ScheduledNotificationRepository::get_pending(
        &ctx.pool,
        now,
        ctx.config.schedule.scheduled_batch_size,
    )
    .await
    {
        Ok(records) => records,
        Err(e) => {
            tracing::error!("scheduler: failed to load pending scheduled records: {}", e);
            return;
        }
    };

    for record in records {
        let params = record.subscriber_query_params.clone().unwrap_or_else(|| json!({}));

        let result = expand_and_publish(
            ctx,
            record.template_id,
            record.context.clone(),
            record.event_type,
            record.channel_type,
            None,
            MessageType::Scheduled,
            &record.subscriber_query_type,
            &params,
            ctx.config.schedule.scheduled_batch_size,
        )
        .await;

        match result {
            Ok(()) => {
                if let Err(e) = ScheduledNotificationRepository::mark_sent(&ctx.pool, record.id).await {
                    tracing::error!("scheduler: failed to mark scheduled {} sent: {}", record.id, e);
                }
            }
            Err(WorkerError::UnknownQueryType(query_type)) => {
                tracing::warn!(
                    "scheduler: scheduled {} references unknown query type {}, skipping",
                    record.id,
                    query_type
                );
            }
            Err(e) => {
                tracing::error!(
                    "scheduler: failed to expand scheduled {}: {}, will retry next tick",
                    record.id,
                    e
                );
            }
        }
    }
}

/// Sleeps until `schedule`'s next firing, runs `tick`, repeats. Running the
/// tick to completion before computing the next sleep trivially satisfies
/// §5's "only one tick of a given name runs at a time."
async fn run_tick_loop<F, Fut>(schedule: CronSchedule, mut tick: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = ()>,
{
    loop {
        let now = Utc::now();
        let next = schedule.next(now);
        let sleep_for = (next - now).to_std().unwrap_or(StdDuration::from_secs(1));
        tokio::time::sleep(sleep_for).await;
        tick().await;
    }
}

/// Entry point for `workers scheduler`: runs the periodic and scheduled
/// ticks concurrently for the lifetime of the process.
pub async fn run(ctx: Arc<WorkerContext>) -> anyhow::Result<()> {
    let periodic_schedule = CronSchedule::parse(&ctx.config.schedule.periodic_schedule)
        .map_err(|e| anyhow::anyhow!("invalid notify_periodic_schedule: {e}"))?;
    let scheduled_schedule = CronSchedule::parse(&ctx.config.schedule.scheduled_schedule)
        .map_err(|e| anyhow::anyhow!("invalid notify_scheduled_schedule: {e}"))?;

    let periodic_ctx = ctx.clone();
    let periodic_task = run_tick_loop(periodic_schedule, move || {
        let ctx = periodic_ctx.clone();
        async move { run_periodic_tick(&ctx).await }
    });

    let scheduled_ctx = ctx.clone();
    let scheduled_task = run_tick_loop(scheduled_schedule, move || {
        let ctx = scheduled_ctx.clone();
        async move { run_scheduled_tick(&ctx).await }
    });

    tokio::join!(periodic_task, scheduled_task);
    Ok(())
}
