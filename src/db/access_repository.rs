// src/db/access_repository.rs
// DOCUMENTATION: Access grant database operations
// PURPOSE: Upsert, lookup and revoke (email, gallery) grants

use crate::errors::GalleryError;
use crate::models::{AccessLevel, UserAccess};
use sqlx::PgPool;
use uuid::Uuid;

/// Grant row plus whether the upsert inserted it
#[derive(sqlx::FromRow)]
struct UpsertedGrant {
    #[sqlx(flatten)]
    access: UserAccess,
    inserted: bool,
}

pub struct AccessRepository;

impl AccessRepository {
    /// Create or update a grant. Returns the row and whether it was newly created.
    pub async fn upsert_grant(
        pool: &PgPool,
        email: &str,
        gallery_id: Uuid,
        level: AccessLevel,
        granted_by: Uuid,
    ) -> Result<(UserAccess, bool), GalleryError> {
        // xmax = 0 only for freshly inserted tuples
        let row = sqlx::query_as::<_, UpsertedGrant>(
            r#"
            INSERT INTO user_access (id, email, gallery_id, access_level, granted_by)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (email, gallery_id) DO UPDATE
            SET access_level = EXCLUDED.access_level,
                granted_by = EXCLUDED.granted_by,
                updated_at = NOW()
            RETURNING id, email, gallery_id, access_level, granted_by,
                      created_at, updated_at, (xmax = 0) AS inserted
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(gallery_id)
        .bind(level.as_str())
        .bind(granted_by)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to grant {} on {}: {}", email, gallery_id, e);
            GalleryError::from_db(e, "Grant access")
        })?;

        Ok((row.access, row.inserted))
    }

    pub async fn get_grant(
        pool: &PgPool,
        email: &str,
        gallery_id: Uuid,
    ) -> Result<Option<UserAccess>, GalleryError> {
        sqlx::query_as::<_, UserAccess>(
            r#"
            SELECT id, email, gallery_id, access_level, granted_by, created_at, updated_at
            FROM user_access
            WHERE email = $1 AND gallery_id = $2
            "#,
        )
        .bind(email)
        .bind(gallery_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to check access on {}: {}", gallery_id, e);
            GalleryError::from_db(e, "Check access")
        })
    }

    pub async fn list_by_gallery(
        pool: &PgPool,
        gallery_id: Uuid,
    ) -> Result<Vec<UserAccess>, GalleryError> {
        sqlx::query_as::<_, UserAccess>(
            r#"
            SELECT id, email, gallery_id, access_level, granted_by, created_at, updated_at
            FROM user_access
            WHERE gallery_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(gallery_id)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to list access for {}: {}", gallery_id, e);
            GalleryError::from_db(e, "List access")
        })
    }

    /// Remove a grant; returns false when none existed
    pub async fn delete_grant(
        pool: &PgPool,
        email: &str,
        gallery_id: Uuid,
    ) -> Result<bool, GalleryError> {
        let result = sqlx::query("DELETE FROM user_access WHERE email = $1 AND gallery_id = $2")
            .bind(email)
            .bind(gallery_id)
            .execute(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to revoke {} on {}: {}", email, gallery_id, e);
                GalleryError::from_db(e, "Revoke access")
            })?;
        Ok(result.rows_affected() > 0)
    }
}
