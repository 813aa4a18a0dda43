//! Email sender (component H, §4.H). Composition grounded on
//! `octofhir-server-rs/crates/octofhir-notifications/src/adapters/email.rs`
//! (`lettre::Message::builder()` / `AsyncSmtpTransport::<Tokio1Executor>`);
//! the 5-attempt exponential backoff mirrors
//! `original_source/src/workers/senders/email.py`'s
//! `@backoff.on_exception(backoff.expo, SMTPException, max_tries=5)`.

use std::time::Duration;

use async_trait::async_trait;
use backoff::{exponential::ExponentialBackoff, SystemClock};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;
use crate::error::WorkerError;
use crate::sender::Sender;

const MAX_ATTEMPTS: u32 = 5;

fn backoff_policy() -> ExponentialBackoff<SystemClock> {
    ExponentialBackoff {
        initial_interval: Duration::from_secs(1),
        max_interval: Duration::from_secs(16),
        max_elapsed_time: None,
        ..ExponentialBackoff::default()
    }
}

pub struct EmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl EmailSender {
    pub fn new(config: &SmtpConfig) -> Result<Self, WorkerError> {
        let credentials = Credentials::new(config.user.clone(), config.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|e| WorkerError::SenderSendMessage(format!("smtp relay setup: {e}")))?
            .port(config.port)
            .credentials(credentials)
            .build();

        Ok(EmailSender {
            transport,
            from: config.from.clone(),
        })
    }

    async fn build_and_send(&self, target: &str, subject: &str, body: &str) -> Result<(), String> {
        let message = Message::builder()
            .from(self.from.parse().map_err(|e| format!("invalid From address: {e}"))?)
            .to(target.parse().map_err(|e| format!("invalid To address: {e}"))?)
            .subject(subject)
            .header(lettre::message::header::ContentType::TEXT_HTML)
            .body(body.to_string())
            .map_err(|e| format!("failed to build message: {e}"))?;

        self.transport
            .send(message)
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

#[async_trait]
impl Sender for EmailSender {
    async fn send(&self, target: &str, subject: &str, body: &str) -> Result<(), WorkerError> {
        let attempts = std::sync::atomic::AtomicU32::new(0);

        let result = backoff::future::retry(backoff_policy(), || async {
            let attempt = attempts.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1;
            match self.build_and_send(target, subject, body).await {
                Ok(()) => Ok(()),
                Err(e) if attempt >= MAX_ATTEMPTS => {
                    Err(backoff::Error::permanent(e))
                }
                Err(e) => {
                    tracing::warn!(
                        "email send attempt {}/{} failed, retrying: {}",
                        attempt,
                        MAX_ATTEMPTS,
                        e
                    );
                    Err(backoff::Error::transient(e))
                }
            }
        })
        .await;

        result.map_err(|e| {
            WorkerError::SenderSendMessage(format!("email send failed after {MAX_ATTEMPTS} attempts: {e}"))
        })
    }
}
