// src/db/metadata_repository.rs
// DOCUMENTATION: Image metadata storage and full-text search
// PURPOSE: Postgres tsvector index over filename, tags, camera and location

use crate::errors::GalleryError;
use crate::models::{ExtractedMetadata, ImageMetadata};
use sqlx::PgPool;
use uuid::Uuid;

const METADATA_COLUMNS: &str = "id, user_id, filename, path, width, height, camera_model, \
     location, tags, indexed, upload_date";

/// Maximum rows returned by a single search
pub const SEARCH_LIMIT: i64 = 50;

pub struct MetadataRepository;

impl MetadataRepository {
    pub async fn create_metadata(
        pool: &PgPool,
        user_id: Uuid,
        filename: &str,
        path: &str,
        extracted: &ExtractedMetadata,
        tags: &[String],
    ) -> Result<ImageMetadata, GalleryError> {
        let sql = format!(
            "INSERT INTO image_metadata \
             (id, user_id, filename, path, width, height, camera_model, location, tags) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {}",
            METADATA_COLUMNS
        );
        sqlx::query_as::<_, ImageMetadata>(&sql)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(filename)
            .bind(path)
            .bind(extracted.width)
            .bind(extracted.height)
            .bind(&extracted.camera_model)
            .bind(&extracted.location)
            .bind(tags)
            .fetch_one(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to store metadata for {}: {}", filename, e);
                GalleryError::from_db(e, "Store metadata")
            })
    }

    /// Mark a row indexed and rebuild its search document
    pub async fn mark_indexed(pool: &PgPool, id: Uuid) -> Result<ImageMetadata, GalleryError> {
        let sql = format!(
            "UPDATE image_metadata \
             SET indexed = TRUE, \
                 search_vector = to_tsvector('simple', \
                     coalesce(filename, '') || ' ' || \
                     array_to_string(tags, ' ') || ' ' || \
                     coalesce(camera_model, '') || ' ' || \
                     coalesce(location, '')) \
             WHERE id = $1 \
             RETURNING {}",
            METADATA_COLUMNS
        );
        sqlx::query_as::<_, ImageMetadata>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to index metadata {}: {}", id, e);
                GalleryError::from_db(e, "Index image")
            })?
            .ok_or_else(|| GalleryError::NotFound("Image".to_string()))
    }

    /// Full-text search over indexed rows, best match first.
    /// `owner` limits the search to one user's images.
    pub async fn search(
        pool: &PgPool,
        owner: Option<Uuid>,
        query: &str,
    ) -> Result<Vec<ImageMetadata>, GalleryError> {
        let sql = format!(
            "SELECT {} FROM image_metadata \
             WHERE indexed AND search_vector @@ plainto_tsquery('simple', $1) \
               AND ($3::uuid IS NULL OR user_id = $3) \
             ORDER BY ts_rank(search_vector, plainto_tsquery('simple', $1)) DESC, upload_date DESC \
             LIMIT $2",
            METADATA_COLUMNS
        );
        sqlx::query_as::<_, ImageMetadata>(&sql)
            .bind(query)
            .bind(SEARCH_LIMIT)
            .bind(owner)
            .fetch_all(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to search metadata: {}", e);
                GalleryError::from_db(e, "Search images")
            })
    }
}
