// src/services/test_fixtures.rs
// DOCUMENTATION: Rows shared by the database-backed service tests

use crate::config::Config;
use crate::db::UserRepository;
use crate::models::{CreateGalleryRequest, EmailMessage, Gallery, Role, User};
use crate::services::email::ChannelEmailQueue;
use crate::services::gallery_service::GalleryService;
use crate::services::security::Claims;
use sqlx::PgPool;
use tokio::sync::mpsc;

pub fn config() -> Config {
    let mut config = Config::from_env();
    config.jwt_secret = "service-test-secret".to_string();
    config
}

pub fn queue() -> (ChannelEmailQueue, mpsc::UnboundedReceiver<EmailMessage>) {
    ChannelEmailQueue::channel()
}

pub fn claims_for(user: &User) -> Claims {
    Claims {
        id: user.id,
        email: user.email.clone(),
        role: user.role(),
        iat: 0,
        exp: 0,
    }
}

/// Insert a user without a usable password
pub async fn user(pool: &PgPool, email: &str, role: Role) -> (User, Claims) {
    let user = UserRepository::create_user(pool, "Test", email, "unused", role.as_str())
        .await
        .expect("insert user");
    let claims = claims_for(&user);
    (user, claims)
}

pub async fn gallery(pool: &PgPool, admin: &Claims, name: &str) -> Gallery {
    let req = CreateGalleryRequest {
        name: name.to_string(),
        description: None,
    };
    GalleryService::create_gallery(pool, admin, req)
        .await
        .expect("create gallery")
}

/// Drain queued emails to their recipients
pub fn recipients(outbox: &mut mpsc::UnboundedReceiver<EmailMessage>) -> Vec<String> {
    let mut to = Vec::new();
    while let Ok(message) = outbox.try_recv() {
        to.push(message.to);
    }
    to
}
