// src/db/user_repository.rs
// DOCUMENTATION: User database operations
// PURPOSE: Accounts and password reset tokens

use crate::errors::GalleryError;
use crate::models::User;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at, updated_at";

pub struct UserRepository;

impl UserRepository {
    /// Insert a new user; a duplicate email surfaces as `AlreadyExists`
    pub async fn create_user(
        pool: &PgPool,
        name: &str,
        email: &str,
        password_hash: &str,
        role: &str,
    ) -> Result<User, GalleryError> {
        let sql = format!(
            "INSERT INTO users (id, name, email, password_hash, role) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(name)
            .bind(email)
            .bind(password_hash)
            .bind(role)
            .fetch_one(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to create user {}: {}", email, e);
                GalleryError::from_db(e, "User with this email")
            })
    }

    pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, GalleryError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to fetch user {}: {}", id, e);
                GalleryError::from_db(e, "Fetch user")
            })
    }

    pub async fn get_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, GalleryError> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to fetch user by email: {}", e);
                GalleryError::from_db(e, "Fetch user")
            })
    }

    /// Fetch every user whose email is in the list
    pub async fn get_by_emails(pool: &PgPool, emails: &[String]) -> Result<Vec<User>, GalleryError> {
        let sql = format!(
            "SELECT {} FROM users WHERE email = ANY($1) ORDER BY email",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(emails)
            .fetch_all(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to fetch users in bulk: {}", e);
                GalleryError::from_db(e, "Fetch users")
            })
    }

    pub async fn update_password(
        pool: &PgPool,
        id: Uuid,
        password_hash: &str,
    ) -> Result<(), GalleryError> {
        sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to update password for {}: {}", id, e);
                GalleryError::from_db(e, "Update password")
            })?;
        Ok(())
    }

    /// Delete a user; returns false when nothing was deleted
    pub async fn delete_user(pool: &PgPool, id: Uuid) -> Result<bool, GalleryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to delete user {}: {}", id, e);
                GalleryError::from_db(e, "Delete user")
            })?;
        Ok(result.rows_affected() > 0)
    }

    /// Store the hash of a password reset token
    pub async fn create_reset_token(
        pool: &PgPool,
        user_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), GalleryError> {
        sqlx::query(
            r#"
            INSERT INTO password_resets (token_hash, user_id, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(token_hash)
        .bind(user_id)
        .bind(expires_at)
        .execute(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to store reset token for {}: {}", user_id, e);
            GalleryError::from_db(e, "Store reset token")
        })?;
        Ok(())
    }

    /// Mark a reset token used and return its user.
    /// The conditional UPDATE makes a token usable exactly once.
    pub async fn consume_reset_token(
        pool: &PgPool,
        token_hash: &str,
    ) -> Result<Option<Uuid>, GalleryError> {
        let row = sqlx::query_as::<_, (Uuid,)>(
            r#"
            UPDATE password_resets
            SET used_at = NOW()
            WHERE token_hash = $1
              AND used_at IS NULL
              AND expires_at > NOW()
            RETURNING user_id
            "#,
        )
        .bind(token_hash)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to consume reset token: {}", e);
            GalleryError::from_db(e, "Consume reset token")
        })?;

        Ok(row.map(|(id,)| id))
    }
}
