// src/db/gallery_repository.rs
// DOCUMENTATION: Gallery database operations
// PURPOSE: CRUD for galleries; creation also writes the owner grant

use crate::errors::GalleryError;
use crate::models::{AccessLevel, CreateGalleryRequest, Gallery, GallerySummary, UpdateGalleryRequest};
use sqlx::PgPool;
use uuid::Uuid;

const SUMMARY_SELECT: &str = r#"
    SELECT g.id, g.name, g.description, g.created_by, g.created_at, g.updated_at,
           COUNT(i.id) FILTER (WHERE i.status = 'APPROVED') AS image_count
    FROM galleries g
    LEFT JOIN images i ON i.gallery_id = g.id
"#;

pub struct GalleryRepository;

impl GalleryRepository {
    /// Create a gallery and grant OWNER access to its creator in one transaction
    pub async fn create_gallery(
        pool: &PgPool,
        creator_id: Uuid,
        creator_email: &str,
        req: &CreateGalleryRequest,
    ) -> Result<Gallery, GalleryError> {
        let mut tx = pool.begin().await.map_err(|e| {
            log::error!("Failed to open transaction: {}", e);
            GalleryError::from_db(e, "Create gallery")
        })?;

        let gallery = sqlx::query_as::<_, Gallery>(
            r#"
            INSERT INTO galleries (id, name, description, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, description, created_by, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(req.name.trim())
        .bind(&req.description)
        .bind(creator_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            log::error!("Failed to create gallery: {}", e);
            GalleryError::from_db(e, "Create gallery")
        })?;

        sqlx::query(
            r#"
            INSERT INTO user_access (id, email, gallery_id, access_level, granted_by)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(creator_email)
        .bind(gallery.id)
        .bind(AccessLevel::Owner.as_str())
        .bind(creator_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            log::error!("Failed to grant owner access on {}: {}", gallery.id, e);
            GalleryError::from_db(e, "Grant owner access")
        })?;

        tx.commit().await.map_err(|e| {
            log::error!("Failed to commit gallery {}: {}", gallery.id, e);
            GalleryError::from_db(e, "Create gallery")
        })?;

        Ok(gallery)
    }

    pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Gallery, GalleryError> {
        sqlx::query_as::<_, Gallery>(
            r#"
            SELECT id, name, description, created_by, created_at, updated_at
            FROM galleries
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to fetch gallery {}: {}", id, e);
            GalleryError::from_db(e, "Fetch gallery")
        })?
        .ok_or_else(|| GalleryError::NotFound("Gallery".to_string()))
    }

    /// Every gallery, newest first
    pub async fn list_all(pool: &PgPool) -> Result<Vec<GallerySummary>, GalleryError> {
        let sql = format!("{} GROUP BY g.id ORDER BY g.created_at DESC", SUMMARY_SELECT);
        sqlx::query_as::<_, GallerySummary>(&sql)
            .fetch_all(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to list galleries: {}", e);
                GalleryError::from_db(e, "List galleries")
            })
    }

    /// Galleries created by the user or granted to their email
    pub async fn list_visible_to(
        pool: &PgPool,
        user_id: Uuid,
        email: &str,
    ) -> Result<Vec<GallerySummary>, GalleryError> {
        let sql = format!(
            "{} WHERE g.created_by = $1 \
             OR EXISTS (SELECT 1 FROM user_access a WHERE a.gallery_id = g.id AND a.email = $2) \
             GROUP BY g.id ORDER BY g.created_at DESC",
            SUMMARY_SELECT
        );
        sqlx::query_as::<_, GallerySummary>(&sql)
            .bind(user_id)
            .bind(email)
            .fetch_all(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to list galleries for {}: {}", user_id, e);
                GalleryError::from_db(e, "List galleries")
            })
    }

    /// Galleries where the email holds a grant
    pub async fn list_granted_to(
        pool: &PgPool,
        email: &str,
    ) -> Result<Vec<GallerySummary>, GalleryError> {
        let sql = format!(
            "{} JOIN user_access a ON a.gallery_id = g.id AND a.email = $1 \
             GROUP BY g.id ORDER BY g.created_at DESC",
            SUMMARY_SELECT
        );
        sqlx::query_as::<_, GallerySummary>(&sql)
            .bind(email)
            .fetch_all(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to list granted galleries: {}", e);
                GalleryError::from_db(e, "List granted galleries")
            })
    }

    /// Update only the provided fields
    pub async fn update_gallery(
        pool: &PgPool,
        id: Uuid,
        req: &UpdateGalleryRequest,
    ) -> Result<Gallery, GalleryError> {
        sqlx::query_as::<_, Gallery>(
            r#"
            UPDATE galleries
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, description, created_by, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(req.name.as_deref().map(str::trim))
        .bind(&req.description)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to update gallery {}: {}", id, e);
            GalleryError::from_db(e, "Update gallery")
        })?
        .ok_or_else(|| GalleryError::NotFound("Gallery".to_string()))
    }

    /// Delete a gallery; images and grants cascade
    pub async fn delete_gallery(pool: &PgPool, id: Uuid) -> Result<(), GalleryError> {
        let result = sqlx::query("DELETE FROM galleries WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to delete gallery {}: {}", id, e);
                GalleryError::from_db(e, "Delete gallery")
            })?;

        if result.rows_affected() == 0 {
            return Err(GalleryError::NotFound("Gallery".to_string()));
        }
        Ok(())
    }
}
