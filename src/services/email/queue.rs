// src/services/email/queue.rs
// DOCUMENTATION: Producer side of the email queue
// PURPOSE: Publish JSON email payloads to Kafka or to an in-process channel

use crate::errors::GalleryError;
use crate::models::EmailMessage;
use async_trait::async_trait;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::ClientConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Anything that accepts emails for later delivery
#[async_trait]
pub trait EmailQueue: Send + Sync {
    async fn enqueue(&self, message: &EmailMessage) -> Result<(), GalleryError>;
}

pub type SharedEmailQueue = Arc<dyn EmailQueue>;

/// Enqueue and log failures instead of propagating them.
/// Used for notifications that must never fail the request that caused them.
pub async fn enqueue_best_effort(queue: &dyn EmailQueue, message: &EmailMessage) {
    if let Err(e) = queue.enqueue(message).await {
        log::error!("Failed to enqueue email to {}: {}", message.to, e);
    }
}

/// Kafka-backed queue
pub struct KafkaEmailQueue {
    producer: FutureProducer,
    topic: String,
}

impl KafkaEmailQueue {
    pub fn new(brokers: &str, topic: &str) -> Result<Self, GalleryError> {
        let producer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("client.id", "email-service")
            .set("message.timeout.ms", "5000")
            .create::<FutureProducer>()
            .map_err(|e| GalleryError::QueueError(format!("Failed to create producer: {}", e)))?;

        log::info!("Kafka email producer ready (topic: {})", topic);

        Ok(Self {
            producer,
            topic: topic.to_string(),
        })
    }
}

#[async_trait]
impl EmailQueue for KafkaEmailQueue {
    async fn enqueue(&self, message: &EmailMessage) -> Result<(), GalleryError> {
        let payload = serde_json::to_vec(message)
            .map_err(|e| GalleryError::QueueError(format!("Failed to encode email: {}", e)))?;

        let record = FutureRecord::to(&self.topic)
            .key(message.to.as_str())
            .payload(&payload);

        self.producer
            .send(record, Duration::from_secs(5))
            .await
            .map_err(|(e, _)| GalleryError::QueueError(format!("Failed to publish email: {}", e)))?;

        log::info!("Email request enqueued for {}", message.to);
        Ok(())
    }
}

/// In-process queue used when no broker is configured
pub struct ChannelEmailQueue {
    sender: mpsc::UnboundedSender<EmailMessage>,
}

impl ChannelEmailQueue {
    /// Create the queue together with the receiver its consumer drains
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<EmailMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl EmailQueue for ChannelEmailQueue {
    async fn enqueue(&self, message: &EmailMessage) -> Result<(), GalleryError> {
        self.sender
            .send(message.clone())
            .map_err(|_| GalleryError::QueueError("Email consumer has stopped".to_string()))?;

        log::info!("Email request enqueued for {} (in-process)", message.to);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(to: &str) -> EmailMessage {
        EmailMessage {
            to: to.to_string(),
            subject: "Hello".to_string(),
            text: "Body".to_string(),
            html: None,
        }
    }

    #[tokio::test]
    async fn test_channel_queue_delivers_in_order() {
        let (queue, mut rx) = ChannelEmailQueue::channel();
        queue.enqueue(&message("a@b.co")).await.unwrap();
        queue.enqueue(&message("c@d.co")).await.unwrap();

        assert_eq!(rx.recv().await.unwrap().to, "a@b.co");
        assert_eq!(rx.recv().await.unwrap().to, "c@d.co");
    }

    #[tokio::test]
    async fn test_channel_queue_reports_closed_consumer() {
        let (queue, rx) = ChannelEmailQueue::channel();
        drop(rx);

        let err = queue.enqueue(&message("a@b.co")).await.unwrap_err();
        assert!(matches!(err, GalleryError::QueueError(_)));

        // best effort never panics or propagates
        enqueue_best_effort(&queue, &message("a@b.co")).await;
    }
}
