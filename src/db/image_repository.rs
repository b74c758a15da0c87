// src/db/image_repository.rs
// DOCUMENTATION: Image database operations
// PURPOSE: Submission, listing and review of gallery images

use crate::errors::GalleryError;
use crate::models::{Image, ImageStatus, SubmitImageRequest};
use sqlx::PgPool;
use uuid::Uuid;

const IMAGE_COLUMNS: &str = "id, gallery_id, filename, file_url, thumbnail_url, uploaded_by, \
     status, review_note, reviewed_by, reviewed_at, created_at";

pub struct ImageRepository;

impl ImageRepository {
    /// Insert a new image in PENDING status
    pub async fn create_image(
        pool: &PgPool,
        uploader_id: Uuid,
        req: &SubmitImageRequest,
    ) -> Result<Image, GalleryError> {
        let sql = format!(
            "INSERT INTO images (id, gallery_id, filename, file_url, thumbnail_url, uploaded_by, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            IMAGE_COLUMNS
        );

        sqlx::query_as::<_, Image>(&sql)
            .bind(Uuid::new_v4())
            .bind(req.gallery_id)
            .bind(&req.filename)
            .bind(&req.file_url)
            .bind(&req.thumbnail_url)
            .bind(uploader_id)
            .bind(ImageStatus::Pending.as_str())
            .fetch_one(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to create image in {}: {}", req.gallery_id, e);
                GalleryError::from_db(e, "Image submission")
            })
    }

    pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Image, GalleryError> {
        let sql = format!("SELECT {} FROM images WHERE id = $1", IMAGE_COLUMNS);
        sqlx::query_as::<_, Image>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to fetch image {}: {}", id, e);
                GalleryError::from_db(e, "Fetch image")
            })?
            .ok_or_else(|| GalleryError::NotFound("Image".to_string()))
    }

    /// Images whose original or thumbnail URL is the given storage URL
    pub async fn list_by_file_url(pool: &PgPool, url: &str) -> Result<Vec<Image>, GalleryError> {
        let sql = format!(
            "SELECT {} FROM images WHERE file_url = $1 OR thumbnail_url = $1",
            IMAGE_COLUMNS
        );
        sqlx::query_as::<_, Image>(&sql)
            .bind(url)
            .fetch_all(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to fetch images for {}: {}", url, e);
                GalleryError::from_db(e, "Fetch images by file")
            })
    }

    /// Images of a gallery with the given status, newest first
    pub async fn list_by_gallery(
        pool: &PgPool,
        gallery_id: Uuid,
        status: ImageStatus,
    ) -> Result<Vec<Image>, GalleryError> {
        let sql = format!(
            "SELECT {} FROM images WHERE gallery_id = $1 AND status = $2 ORDER BY created_at DESC",
            IMAGE_COLUMNS
        );
        sqlx::query_as::<_, Image>(&sql)
            .bind(gallery_id)
            .bind(status.as_str())
            .fetch_all(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to fetch images for gallery {}: {}", gallery_id, e);
                GalleryError::from_db(e, "Fetch gallery images")
            })
    }

    /// Pending images across every gallery, oldest first (review queue order)
    pub async fn list_pending(pool: &PgPool) -> Result<Vec<Image>, GalleryError> {
        let sql = format!(
            "SELECT {} FROM images WHERE status = 'PENDING' ORDER BY created_at ASC",
            IMAGE_COLUMNS
        );
        sqlx::query_as::<_, Image>(&sql)
            .fetch_all(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to fetch pending images: {}", e);
                GalleryError::from_db(e, "Fetch pending images")
            })
    }

    pub async fn list_by_uploader(pool: &PgPool, uploader_id: Uuid) -> Result<Vec<Image>, GalleryError> {
        let sql = format!(
            "SELECT {} FROM images WHERE uploaded_by = $1 ORDER BY created_at DESC",
            IMAGE_COLUMNS
        );
        sqlx::query_as::<_, Image>(&sql)
            .bind(uploader_id)
            .fetch_all(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to fetch uploads of {}: {}", uploader_id, e);
                GalleryError::from_db(e, "Fetch uploads")
            })
    }

    /// Apply a review decision.
    /// Returns None when the image is no longer PENDING, so two concurrent
    /// reviewers cannot both win.
    pub async fn review_image(
        pool: &PgPool,
        id: Uuid,
        reviewer_id: Uuid,
        status: ImageStatus,
        note: Option<&str>,
    ) -> Result<Option<Image>, GalleryError> {
        let sql = format!(
            "UPDATE images \
             SET status = $2, review_note = $3, reviewed_by = $4, reviewed_at = NOW() \
             WHERE id = $1 AND status = 'PENDING' \
             RETURNING {}",
            IMAGE_COLUMNS
        );
        sqlx::query_as::<_, Image>(&sql)
            .bind(id)
            .bind(status.as_str())
            .bind(note)
            .bind(reviewer_id)
            .fetch_optional(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to review image {}: {}", id, e);
                GalleryError::from_db(e, "Review image")
            })
    }

    pub async fn delete_image(pool: &PgPool, id: Uuid) -> Result<(), GalleryError> {
        let result = sqlx::query("DELETE FROM images WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to delete image {}: {}", id, e);
                GalleryError::from_db(e, "Delete image")
            })?;

        if result.rows_affected() == 0 {
            return Err(GalleryError::NotFound("Image".to_string()));
        }
        Ok(())
    }
}
