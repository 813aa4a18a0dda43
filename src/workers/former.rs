//! Component J — Former (consumer) worker (§4.J). One instance per broker
//! queue; N formers share a queue's competing-consumer semantics. Grounded
//! on `original_source/src/workers/former/former_worker.py` and
//! `message_processor.py`.

use std::sync::Arc;

use futures::StreamExt;
use lapin::options::BasicAckOptions;
use uuid::Uuid;

use crate::db::{PeriodicNotificationRepository, ScheduledNotificationRepository, SubscriberRepository, TemplateRepository};
use crate::domain::{MessageType, WorkUnit};
use crate::error::WorkerError;
use crate::workers::{merge_json, WorkerContext};

/// §4.J step 2: `immediate` is always live; `scheduled`/`periodic` are live
/// only if their backing record still exists and (for periodic) is active.
async fn check_message_status(ctx: &WorkerContext, unit: &WorkUnit) -> Result<bool, WorkerError> {
    match unit.message_type {
        MessageType::Immediate => Ok(true),
        MessageType::Scheduled => match unit.notification_id {
            Some(id) => Ok(ScheduledNotificationRepository::get(&ctx.pool, id).await?.is_some()),
            None => Ok(false),
        },
        MessageType::Periodic => match unit.notification_id {
            Some(id) => {
                let record = PeriodicNotificationRepository::get(&ctx.pool, id).await?;
                Ok(record.map(|r| r.is_active).unwrap_or(false))
            }
            None => Ok(false),
        },
    }
}

/// §4.J step 4: per-subscriber dedup check, render, send, mark-sent.
/// Propagates `WorkerError::SenderSendMessage` so the caller can push the
/// whole unit to the DLQ and stop iterating (step 4f) — everything else is
/// handled here and never escapes.
async fn process_subscriber(
    ctx: &WorkerContext,
    unit: &WorkUnit,
    template_body: &str,
    subject: &str,
    subscriber_id: Uuid,
) -> Result<(), WorkerError> {
    if let Some(notification_id) = unit.notification_id {
        if ctx.dedup.was_sent(subscriber_id, notification_id).await? {
            return Ok(());
        }
    }

    let subscriber = match SubscriberRepository::get(&ctx.pool, subscriber_id).await? {
        Some(subscriber) => subscriber,
        None => {
            tracing::warn!("former: subscriber {} not found, skipping", subscriber_id);
            return Ok(());
        }
    };

    let mut context = subscriber.as_context();
    merge_json(&mut context, &unit.context);

    let body = ctx.renderer.render(template_body, context).await?;

    let sender = match ctx.senders.get(unit.channel_type) {
        Some(sender) => sender,
        None => {
            tracing::error!(
                "former: no sender registered for channel {:?}, dropping subscriber {}",
                unit.channel_type,
                subscriber_id
            );
            return Ok(());
        }
    };

    sender.send(&subscriber.email, subject, &body).await?;

    if let Some(notification_id) = unit.notification_id {
        ctx.dedup
            .mark_sent(subscriber_id, notification_id, ctx.config.redis.message_ttl_seconds)
            .await?;
    }

    Ok(())
}

async fn process_unit(ctx: &WorkerContext, queue_name: &str, raw: &[u8]) {
    let unit: WorkUnit = match serde_json::from_slice(raw) {
        Ok(unit) => unit,
        Err(e) => {
            tracing::error!("former: malformed WorkUnit on {}: {}", queue_name, e);
            return;
        }
    };

    let is_live = match check_message_status(ctx, &unit).await {
        Ok(is_live) => is_live,
        Err(e) => {
            tracing::error!("former: preflight check failed on {}: {}", queue_name, e);
            return;
        }
    };
    if !is_live {
        tracing::debug!("former: preflight failed, discarding unit on {}", queue_name);
        return;
    }

    let template = match TemplateRepository::get(&ctx.pool, unit.template_id).await {
        Ok(Some(template)) => template,
        Ok(None) => {
            tracing::warn!("former: template {} missing, discarding unit", unit.template_id);
            return;
        }
        Err(e) => {
            tracing::error!("former: failed to load template {}: {}", unit.template_id, e);
            return;
        }
    };

    let subject = unit
        .context
        .get("subject")
        .and_then(|v| v.as_str())
        .unwrap_or(&ctx.config.default_notification_subject)
        .to_string();

    for subscriber_id in unit.subscribers.iter().copied() {
        match process_subscriber(ctx, &unit, &template.body, &subject, subscriber_id).await {
            Ok(()) => {}
            Err(WorkerError::SenderSendMessage(msg)) => {
                tracing::warn!(
                    "former: sender failed ({}), pushing original unit to DLQ {} and stopping",
                    msg,
                    queue_name
                );
                if let Err(e) = ctx.dedup.dlq_push(queue_name, raw).await {
                    tracing::error!("former: failed to push unit to DLQ {}: {}", queue_name, e);
                }
                break;
            }
            Err(e) => {
                tracing::error!(
                    "former: unexpected error processing subscriber {} on {}: {}",
                    subscriber_id,
                    queue_name,
                    e
                );
            }
        }
    }
}

/// Entry point for `workers former <queue_name>`. Blocks forever, acking
/// every delivery unconditionally after the per-unit block (§4.J step 5 —
/// the DLQ, not broker redelivery, owns the retry path). Any per-unit panic
/// surface is already caught inside `process_unit`'s own error handling, so
/// there is nothing left to unwind past the ack.
pub async fn run(ctx: Arc<WorkerContext>, queue_name: &str) -> anyhow::Result<()> {
    let consumer_tag = format!("former-{queue_name}");
    let mut consumer = ctx.broker.consume(queue_name, &consumer_tag).await?;

    while let Some(delivery) = consumer.next().await {
        let delivery = match delivery {
            Ok(delivery) => delivery,
            Err(e) => {
                tracing::error!("former: error reading delivery from {}: {}", queue_name, e);
                continue;
            }
        };

        process_unit(&ctx, queue_name, &delivery.data).await;

        if let Err(e) = delivery.ack(BasicAckOptions::default()).await {
            tracing::error!("former: failed to ack delivery on {}: {}", queue_name, e);
        }
    }

    Ok(())
}
