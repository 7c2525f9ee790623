use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, instrument};
use uuid::Uuid;

/// SMS delivery errors. Callers on the notification path log and swallow
/// these; delivery failure never reaches the shopper.
#[derive(Debug, Error)]
pub enum SmsError {
    #[error("SMS delivery failed: {0}")]
    Delivery(String),
}

#[derive(Debug, Clone)]
pub struct SmsReceipt {
    pub message_id: String,
}

/// SMS-sending collaborator. The dispatcher only depends on this trait,
/// so a real provider can replace the simulated adapter without touching
/// the notification path.
#[async_trait]
pub trait SmsSender: Send + Sync {
    async fn send(&self, to: &str, message: &str, kind: &str) -> Result<SmsReceipt, SmsError>;
}

/// Simulated sender: waits a configured delay, logs the message, and
/// reports success. No real delivery happens.
pub struct SimulatedSmsSender {
    delay: Duration,
}

impl SimulatedSmsSender {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl SmsSender for SimulatedSmsSender {
    #[instrument(skip(self, message))]
    async fn send(&self, to: &str, message: &str, kind: &str) -> Result<SmsReceipt, SmsError> {
        tokio::time::sleep(self.delay).await;

        let message_id = Uuid::new_v4().to_string();
        info!(%to, %kind, %message_id, "SMS sent (simulated): {}", message);

        Ok(SmsReceipt { message_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn simulated_sender_reports_success_with_message_id() {
        let sender = SimulatedSmsSender::new(Duration::ZERO);
        let receipt = sender
            .send("+91 0000000000", "test message", "order_placed")
            .await
            .unwrap();

        assert!(!receipt.message_id.is_empty());
    }
}
