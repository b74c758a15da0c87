// src/services/email/mailer.rs
// DOCUMENTATION: SMTP delivery
// PURPOSE: Turn an EmailMessage into a real email, or log it when SMTP is off

use crate::config::Config;
use crate::errors::GalleryError;
use crate::models::EmailMessage;
use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

/// Final hop of the email pipeline
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), GalleryError>;
}

/// lettre SMTP transport; `transport` is None in no-op mode
pub struct SmtpMailer {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn from_config(config: &Config) -> Result<Self, GalleryError> {
        let from_addr = if config.smtp_from.is_empty() {
            "no-reply@localhost"
        } else {
            config.smtp_from.as_str()
        };
        let from = from_addr
            .parse::<Mailbox>()
            .map_err(|e| GalleryError::InternalError(format!("Invalid SMTP_FROM address: {}", e)))?;

        if config.smtp_host.trim().is_empty() {
            log::warn!("SMTP host not configured; emails will only be logged");
            return Ok(Self {
                transport: None,
                from,
            });
        }

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| {
                GalleryError::InternalError(format!("Failed to configure SMTP transport: {}", e))
            })?
            .port(config.smtp_port);

        if !config.smtp_user.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.smtp_user.clone(),
                config.smtp_pass.clone(),
            ));
        }

        log::info!("SMTP transport configured for {}:{}", config.smtp_host, config.smtp_port);

        Ok(Self {
            transport: Some(builder.build()),
            from,
        })
    }

    fn build_message(&self, message: &EmailMessage) -> Result<Message, GalleryError> {
        let to = message
            .to
            .parse::<Mailbox>()
            .map_err(|e| GalleryError::InvalidInput(format!("Invalid recipient {}: {}", message.to, e)))?;

        let builder = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject.clone());

        let built = match &message.html {
            Some(html) => builder.multipart(MultiPart::alternative_plain_html(
                message.text.clone(),
                html.clone(),
            )),
            None => builder
                .header(ContentType::TEXT_PLAIN)
                .body(message.text.clone()),
        };

        built.map_err(|e| GalleryError::InternalError(format!("Failed to build email: {}", e)))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), GalleryError> {
        let email = self.build_message(message)?;

        match &self.transport {
            Some(transport) => {
                let response = transport
                    .send(email)
                    .await
                    .map_err(|e| GalleryError::InternalError(format!("Failed to send email: {}", e)))?;
                log::info!("Email sent to {}: {}", message.to, response.code());
            }
            None => {
                log::info!(
                    "SMTP disabled; skipping email to {} ({})",
                    message.to,
                    message.subject
                );
            }
        }
        Ok(())
    }
}
