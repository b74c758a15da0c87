// src/services/auth_service.rs
// DOCUMENTATION: Business logic for accounts
// PURPOSE: Registration, login, password reset and user lookup

use crate::config::Config;
use crate::db::UserRepository;
use crate::errors::GalleryError;
use crate::models::{
    BulkUserResponse, LoginRequest, LoginResponse, RegisterRequest, Role, UserResponse,
};
use crate::services::email::{enqueue_best_effort, password_reset_email, EmailQueue};
use crate::services::security::{self, Claims};
use chrono::{Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use std::collections::HashSet;

/// Length of the random reset token sent by email
const RESET_TOKEN_LEN: usize = 48;

pub struct AuthService;

impl AuthService {
    /// Register a new account
    pub async fn register(pool: &PgPool, req: RegisterRequest) -> Result<UserResponse, GalleryError> {
        let role: Role = req
            .role
            .parse()
            .map_err(|_| GalleryError::InvalidInput("Invalid format credentials".to_string()))?;

        let email = normalize_email(&req.email);
        let password_hash = security::hash_password(&req.password)?;

        let user = UserRepository::create_user(
            pool,
            req.name.trim(),
            &email,
            &password_hash,
            role.as_str(),
        )
        .await?;

        log::info!("Registered user {} with role {}", user.id, user.role);
        Ok(user.to_response())
    }

    /// Check credentials and issue a token
    pub async fn login(
        pool: &PgPool,
        config: &Config,
        req: LoginRequest,
    ) -> Result<LoginResponse, GalleryError> {
        let email = normalize_email(&req.email);
        let user = UserRepository::get_by_email(pool, &email)
            .await?
            .ok_or_else(|| GalleryError::InvalidInput("User not found".to_string()))?;

        if !security::verify_password(&req.password, &user.password_hash)? {
            log::warn!("Invalid password for user {}", user.id);
            return Err(GalleryError::InvalidInput("Invalid credentials".to_string()));
        }

        let token = security::issue_token(&user, &config.jwt_secret, config.jwt_expiry_hours)?;
        log::info!("User {} signed in", user.id);

        Ok(LoginResponse {
            message: "Signin successful".to_string(),
            token,
            role: user.role,
        })
    }

    /// Profile of the authenticated caller
    pub async fn current_user(pool: &PgPool, claims: &Claims) -> Result<UserResponse, GalleryError> {
        UserRepository::get_by_id(pool, claims.id)
            .await?
            .map(|u| u.to_response())
            .ok_or_else(|| GalleryError::NotFound("User".to_string()))
    }

    /// Issue a reset token and queue the reset email.
    /// Unknown emails succeed silently so the endpoint cannot enumerate accounts.
    pub async fn forget_password(
        pool: &PgPool,
        config: &Config,
        queue: &dyn EmailQueue,
        email: &str,
    ) -> Result<(), GalleryError> {
        let email = normalize_email(email);
        let user = match UserRepository::get_by_email(pool, &email).await? {
            Some(user) => user,
            None => {
                log::info!("Password reset requested for unknown email");
                return Ok(());
            }
        };

        let token = generate_reset_token();
        let expires_at = Utc::now() + Duration::minutes(config.reset_token_ttl_minutes);
        UserRepository::create_reset_token(pool, user.id, &hash_token(&token), expires_at).await?;

        let message = password_reset_email(
            &user.email,
            &token,
            &config.frontend_url,
            config.reset_token_ttl_minutes,
        );
        enqueue_best_effort(queue, &message).await;

        log::info!("Password reset issued for user {}", user.id);
        Ok(())
    }

    /// Consume a reset token and set the new password
    pub async fn reset_password(pool: &PgPool, token: &str, password: &str) -> Result<(), GalleryError> {
        let user_id = UserRepository::consume_reset_token(pool, &hash_token(token.trim()))
            .await?
            .ok_or_else(|| GalleryError::InvalidInput("Invalid or expired reset token".to_string()))?;

        let password_hash = security::hash_password(password)?;
        UserRepository::update_password(pool, user_id, &password_hash).await?;

        log::info!("Password reset completed for user {}", user_id);
        Ok(())
    }

    pub async fn delete_account(pool: &PgPool, claims: &Claims) -> Result<(), GalleryError> {
        if !UserRepository::delete_user(pool, claims.id).await? {
            return Err(GalleryError::NotFound("User".to_string()));
        }
        log::info!("Deleted user {}", claims.id);
        Ok(())
    }

    pub async fn lookup_user(pool: &PgPool, email: &str) -> Result<UserResponse, GalleryError> {
        UserRepository::get_by_email(pool, &normalize_email(email))
            .await?
            .map(|u| u.to_response())
            .ok_or_else(|| GalleryError::NotFound("User".to_string()))
    }

    /// Split a list of emails into known users and unknown addresses
    pub async fn bulk_lookup(pool: &PgPool, emails: Vec<String>) -> Result<BulkUserResponse, GalleryError> {
        let normalized: Vec<String> = emails.iter().map(|e| normalize_email(e)).collect();
        let users = UserRepository::get_by_emails(pool, &normalized).await?;

        let found: HashSet<&str> = users.iter().map(|u| u.email.as_str()).collect();
        let missing_emails = missing_from(&normalized, &found);

        Ok(BulkUserResponse {
            success: true,
            found_users: users.iter().map(|u| u.to_response()).collect(),
            missing_emails,
        })
    }
}

/// Emails are compared case-insensitively
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn missing_from(requested: &[String], found: &HashSet<&str>) -> Vec<String> {
    let mut seen = HashSet::new();
    requested
        .iter()
        .filter(|e| !found.contains(e.as_str()) && seen.insert(e.as_str()))
        .cloned()
        .collect()
}

fn generate_reset_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RESET_TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Only the SHA-256 of a reset token is stored
fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
