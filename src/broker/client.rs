//! Typed publish/consume over the AMQP broker (component E, §4.E).
//! Grounded on `original_source/src/services/rabbitmq.py::RabbitMQService`:
//! a direct exchange named `notifications`, three durable priority queues
//! declared at startup, and a `send_message` that returns an error rather
//! than propagating an exception on publish failure.

use lapin::options::{
    BasicConsumeOptions, BasicPublishOptions, ExchangeDeclareOptions, QueueBindOptions,
    QueueDeclareOptions,
};
use lapin::types::{AMQPValue, FieldTable};
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties, Consumer};

use crate::broker::queues::{QueueConfig, ALL_QUEUES};
use crate::error::AppError;

pub const EXCHANGE_NAME: &str = "notifications";

#[derive(Clone)]
pub struct BrokerClient {
    channel: Channel,
}

impl BrokerClient {
    /// Connect, declare the direct exchange and the three priority queues
    /// with their `x-message-ttl`/`x-max-priority` arguments, and bind each
    /// queue to the exchange under a routing key equal to its own name.
    pub async fn connect(amqp_url: &str) -> Result<Self, AppError> {
        let connection = Connection::connect(amqp_url, ConnectionProperties::default())
            .await
            .map_err(|e| AppError::ServiceUnavailable(format!("rabbitmq connect: {e}")))?;
        let channel = connection
            .create_channel()
            .await
            .map_err(|e| AppError::ServiceUnavailable(format!("rabbitmq channel: {e}")))?;

        channel
            .exchange_declare(
                EXCHANGE_NAME,
                lapin::ExchangeKind::Direct,
                ExchangeDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| AppError::ServiceUnavailable(format!("exchange_declare: {e}")))?;

        for queue in ALL_QUEUES {
            Self::declare_and_bind(&channel, queue).await?;
        }

        Ok(BrokerClient { channel })
    }

    async fn declare_and_bind(channel: &Channel, queue: QueueConfig) -> Result<(), AppError> {
        let mut args = FieldTable::default();
        args.insert(
            "x-message-ttl".into(),
            AMQPValue::LongUInt(queue.message_ttl_ms as u32),
        );
        args.insert(
            "x-max-priority".into(),
            AMQPValue::ShortShortUInt(crate::broker::priorities::MAX_PRIORITY),
        );

        channel
            .queue_declare(
                queue.queue_name,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                args,
            )
            .await
            .map_err(|e| AppError::ServiceUnavailable(format!("queue_declare: {e}")))?;

        channel
            .queue_bind(
                queue.queue_name,
                EXCHANGE_NAME,
                queue.queue_name,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|e| AppError::ServiceUnavailable(format!("queue_bind: {e}")))?;

        Ok(())
    }

    /// Publish `body` to `queue_name` with the given per-message priority
    /// (1..=5) and an optional `X-Request-Id` header. On publish failure this
    /// returns `Err` rather than panicking or propagating a broker exception,
    /// per spec.md §4.E / §7 (`BrokerPublishError`).
    pub async fn send_message(
        &self,
        queue_name: &str,
        body: &[u8],
        priority: u8,
        request_id: Option<&str>,
    ) -> Result<(), AppError> {
        let mut properties = BasicProperties::default()
            .with_delivery_mode(2) // persistent
            .with_priority(priority);

        if let Some(rid) = request_id {
            let mut headers = FieldTable::default();
            headers.insert("X-Request-Id".into(), AMQPValue::LongString(rid.into()));
            properties = properties.with_headers(headers);
        }

        self.channel
            .basic_publish(
                EXCHANGE_NAME,
                queue_name,
                BasicPublishOptions::default(),
                body,
                properties,
            )
            .await
            .map_err(|e| AppError::BrokerPublish(e.to_string()))?
            .await
            .map_err(|e| AppError::BrokerPublish(e.to_string()))?;

        Ok(())
    }

    /// Open a competing-consumer iterator over `queue_name`. Former workers
    /// ack each delivery after successfully finishing the per-unit work (the
    /// DLQ, not broker redelivery, owns the retry path per §4.J step 5).
    pub async fn consume(&self, queue_name: &str, consumer_tag: &str) -> Result<Consumer, AppError> {
        self.channel
            .basic_consume(
                queue_name,
                consumer_tag,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|e| AppError::ServiceUnavailable(format!("basic_consume: {e}")))
    }
}
