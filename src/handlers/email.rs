// src/handlers/email.rs
// DOCUMENTATION: HTTP handlers for the email service
// PURPOSE: Validate send requests and hand them to the email queue

use crate::config::Config;
use crate::errors::GalleryError;
use crate::models::{SendEmailRequest, SendUsersEmailRequest};
use crate::services::email::SharedEmailQueue;
use crate::services::security::authenticate;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde_json::json;

const QUEUED_MESSAGE: &str = "Email request received and queued for processing.";

/// POST /api/email/send-email
pub async fn send_email(
    config: web::Data<Config>,
    queue: web::Data<SharedEmailQueue>,
    http: HttpRequest,
    req: web::Json<SendEmailRequest>,
) -> Result<impl Responder, GalleryError> {
    authenticate(&http, &config)?;

    let message = req.into_inner().into_message().ok_or_else(|| {
        GalleryError::InvalidInput("Missing required fields: to, subject, text".to_string())
    })?;

    queue.enqueue(&message).await?;
    log::info!("Queued email to {}", message.to);
    Ok(HttpResponse::Ok().json(json!({ "message": QUEUED_MESSAGE })))
}

/// POST /api/email/send-users-email
/// One queue message per recipient
pub async fn send_users_email(
    config: web::Data<Config>,
    queue: web::Data<SharedEmailQueue>,
    http: HttpRequest,
    req: web::Json<SendUsersEmailRequest>,
) -> Result<impl Responder, GalleryError> {
    authenticate(&http, &config)?;

    let messages = req
        .into_inner()
        .into_messages()
        .filter(|m| !m.is_empty())
        .ok_or_else(|| {
            GalleryError::InvalidInput("Missing required fields: emails, subject, text".to_string())
        })?;

    for message in &messages {
        queue.enqueue(message).await?;
    }
    log::info!("Queued {} emails", messages.len());
    Ok(HttpResponse::Ok().json(json!({ "message": QUEUED_MESSAGE })))
}

/// Configuration for email routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/email")
            .route("/send-email", web::post().to(send_email))
            .route("/send-users-email", web::post().to(send_users_email)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{bearer_for, test_state};
    use actix_web::{http::StatusCode, test, App};

    #[actix_web::test]
    async fn test_send_email_queues_message() {
        let mut state = test_state();
        let app = test::init_service(
            App::new()
                .app_data(state.config.clone())
                .app_data(state.queue.clone())
                .configure(config),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/email/send-email")
            .insert_header(("Authorization", bearer_for(&state, "USER")))
            .set_json(json!({"to": "a@b.co", "subject": "Hi", "text": "Hello"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let queued = state.outbox.try_recv().unwrap();
        assert_eq!(queued.to, "a@b.co");
        assert_eq!(queued.html, None);
    }

    #[actix_web::test]
    async fn test_send_email_missing_fields() {
        let mut state = test_state();
        let app = test::init_service(
            App::new()
                .app_data(state.config.clone())
                .app_data(state.queue.clone())
                .configure(config),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/email/send-email")
            .insert_header(("Authorization", bearer_for(&state, "USER")))
            .set_json(json!({"to": "a@b.co"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
        assert!(state.outbox.try_recv().is_err());
    }

    #[actix_web::test]
    async fn test_send_users_email_fans_out() {
        let mut state = test_state();
        let app = test::init_service(
            App::new()
                .app_data(state.config.clone())
                .app_data(state.queue.clone())
                .configure(config),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/email/send-users-email")
            .insert_header(("Authorization", bearer_for(&state, "ADMIN")))
            .set_json(json!({"emails": ["a@b.co", "c@d.co"], "subject": "News", "text": "Body", "html": "<p>Body</p>"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        assert_eq!(state.outbox.try_recv().unwrap().to, "a@b.co");
        assert_eq!(state.outbox.try_recv().unwrap().to, "c@d.co");
        assert!(state.outbox.try_recv().is_err());
    }
}
