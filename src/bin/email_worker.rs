// src/bin/email_worker.rs
// DOCUMENTATION: Standalone email worker
// PURPOSE: Consume the Kafka email topic and deliver messages over SMTP

use photo_gallery::config::{self, Config};
use photo_gallery::services::email::{run_kafka_consumer, Mailer, SmtpMailer};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    config::init_logging(&config.log_level);

    if config.kafka_broker.is_empty() {
        anyhow::bail!("KAFKA_BROKER is required to run the email worker");
    }

    let mailer: Arc<dyn Mailer> = Arc::new(SmtpMailer::from_config(&config)?);

    log::info!(
        "Starting email worker (brokers: {}, topic: {}, group: {})",
        config.kafka_broker,
        config.email_topic,
        config.email_consumer_group
    );

    run_kafka_consumer(
        &config.kafka_broker,
        &config.email_consumer_group,
        &config.email_topic,
        mailer,
    )
    .await?;

    Ok(())
}
