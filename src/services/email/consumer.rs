// src/services/email/consumer.rs
// DOCUMENTATION: Consumer side of the email queue
// PURPOSE: Drain queued emails and hand them to the mailer.
// Failed deliveries are logged and dropped; there is no retry or dead-letter topic.

use crate::errors::GalleryError;
use crate::models::EmailMessage;
use crate::services::email::Mailer;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::{ClientConfig, Message};
use std::sync::Arc;
use tokio::sync::mpsc;

/// What happened to one queued payload
#[derive(Debug, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    Undecodable,
    Failed,
}

/// Decode a raw queue payload
pub fn decode_payload(payload: &[u8]) -> Result<EmailMessage, serde_json::Error> {
    serde_json::from_slice(payload)
}

/// Send one message, logging instead of propagating failures
pub async fn deliver(mailer: &dyn Mailer, message: &EmailMessage) -> Delivery {
    log::info!("Processing email to {}", message.to);
    match mailer.send(message).await {
        Ok(()) => Delivery::Sent,
        Err(e) => {
            log::error!("Failed to process email to {}: {}", message.to, e);
            Delivery::Failed
        }
    }
}

/// Decode and deliver one raw payload
pub async fn handle_payload(mailer: &dyn Mailer, payload: &[u8]) -> Delivery {
    match decode_payload(payload) {
        Ok(message) => deliver(mailer, &message).await,
        Err(e) => {
            log::error!("Dropping undecodable email payload: {}", e);
            Delivery::Undecodable
        }
    }
}

/// Consume the in-process channel until every sender is gone
pub async fn run_channel_consumer(
    mut receiver: mpsc::UnboundedReceiver<EmailMessage>,
    mailer: Arc<dyn Mailer>,
) {
    log::info!("In-process email worker started");
    while let Some(message) = receiver.recv().await {
        deliver(mailer.as_ref(), &message).await;
    }
    log::info!("In-process email worker stopped");
}

/// Consume the Kafka topic forever
pub async fn run_kafka_consumer(
    brokers: &str,
    group_id: &str,
    topic: &str,
    mailer: Arc<dyn Mailer>,
) -> Result<(), GalleryError> {
    let consumer: StreamConsumer = ClientConfig::new()
        .set("group.id", group_id)
        .set("bootstrap.servers", brokers)
        .set("enable.auto.commit", "true")
        .set("auto.offset.reset", "latest")
        .set("enable.partition.eof", "false")
        .create()
        .map_err(|e| GalleryError::QueueError(format!("Failed to create consumer: {}", e)))?;

    consumer
        .subscribe(&[topic])
        .map_err(|e| GalleryError::QueueError(format!("Failed to subscribe to {}: {}", topic, e)))?;

    log::info!("Email worker listening on Kafka topic: {}", topic);

    loop {
        match consumer.recv().await {
            Ok(msg) => match msg.payload() {
                Some(payload) => {
                    handle_payload(mailer.as_ref(), payload).await;
                }
                None => log::warn!("Skipping empty message at offset {}", msg.offset()),
            },
            Err(e) => log::error!("Kafka receive error: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<EmailMessage>>,
        fail_for: Option<String>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, message: &EmailMessage) -> Result<(), GalleryError> {
            if self.fail_for.as_deref() == Some(message.to.as_str()) {
                return Err(GalleryError::InternalError("smtp down".to_string()));
            }
            self.sent.lock().await.push(message.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_handle_payload() {
        let mailer = RecordingMailer::default();
        let payload = br#"{"to":"a@b.co","subject":"Hi","text":"Body"}"#;

        assert_eq!(handle_payload(&mailer, payload).await, Delivery::Sent);
        assert_eq!(handle_payload(&mailer, b"not json").await, Delivery::Undecodable);
        assert_eq!(mailer.sent.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_failures_are_dropped() {
        let mailer = RecordingMailer {
            fail_for: Some("bad@b.co".to_string()),
            ..Default::default()
        };
        let payload = br#"{"to":"bad@b.co","subject":"Hi","text":"Body"}"#;
        assert_eq!(handle_payload(&mailer, payload).await, Delivery::Failed);
        assert!(mailer.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_channel_consumer_drains_until_closed() {
        let mailer = Arc::new(RecordingMailer::default());
        let (tx, rx) = mpsc::unbounded_channel();

        for to in ["a@b.co", "c@d.co"] {
            tx.send(EmailMessage {
                to: to.to_string(),
                subject: "s".to_string(),
                text: "t".to_string(),
                html: None,
            })
            .unwrap();
        }
        drop(tx);

        run_channel_consumer(rx, mailer.clone()).await;
        assert_eq!(mailer.sent.lock().await.len(), 2);
    }
}
