// src/services/metadata_service.rs
// DOCUMENTATION: Image metadata extraction, indexing and search
// PURPOSE: EXIF camera/GPS extraction plus cached full-text search

use crate::db::MetadataRepository;
use crate::errors::GalleryError;
use crate::models::{ExtractRequest, ExtractedMetadata, ImageMetadata};
use crate::services::cache::SearchCache;
use crate::services::security::Claims;
use crate::services::storage::StorageService;
use exif::{In, Reader, Tag, Value};
use sqlx::PgPool;
use std::io::Cursor;
use uuid::Uuid;

pub struct MetadataService;

impl MetadataService {
    /// Read one of the caller's uploads and store its metadata row
    pub async fn extract(
        pool: &PgPool,
        storage: &StorageService,
        user_id: Uuid,
        req: ExtractRequest,
    ) -> Result<ImageMetadata, GalleryError> {
        let path = storage.original_path(user_id, &req.filename)?;
        let bytes = storage.read_original(user_id, &req.filename).await?;

        let extracted = tokio::task::spawn_blocking(move || extract_from_bytes(&bytes))
            .await
            .map_err(|e| GalleryError::InternalError(format!("Metadata task failed: {}", e)))?;

        let tags = normalize_tags(&req.tags);
        let metadata = MetadataRepository::create_metadata(
            pool,
            user_id,
            &req.filename,
            &path.to_string_lossy(),
            &extracted,
            &tags,
        )
        .await?;

        log::info!(
            "Extracted metadata {} for {} (camera: {:?})",
            metadata.id,
            metadata.filename,
            metadata.camera_model
        );
        Ok(metadata)
    }

    /// Make a row searchable; cached results are dropped
    pub async fn index(pool: &PgPool, cache: &SearchCache, id: Uuid) -> Result<ImageMetadata, GalleryError> {
        let metadata = MetadataRepository::mark_indexed(pool, id).await?;
        cache.invalidate().await;
        log::info!("Indexed image metadata {}", id);
        Ok(metadata)
    }

    /// Search the caller's indexed images; ADMIN searches every user's
    pub async fn search(
        pool: &PgPool,
        cache: &SearchCache,
        claims: &Claims,
        query: Option<&str>,
    ) -> Result<Vec<ImageMetadata>, GalleryError> {
        let query = query.map(str::trim).filter(|q| !q.is_empty()).ok_or_else(|| {
            GalleryError::InvalidInput("Search query is required".to_string())
        })?;

        let owner = if claims.is_admin() { None } else { Some(claims.id) };
        let key = SearchCache::search_key(owner, query);
        if let Some(results) = cache.get(&key).await {
            return Ok(results);
        }

        let results = MetadataRepository::search(pool, owner, query).await?;
        log::debug!("Search '{}' matched {} images", query, results.len());
        cache.set(key, results.clone()).await;
        Ok(results)
    }
}

/// Blocking: dimensions from the decoder, camera and GPS from EXIF
pub fn extract_from_bytes(bytes: &[u8]) -> ExtractedMetadata {
    let mut extracted = ExtractedMetadata::default();

    match image::load_from_memory(bytes) {
        Ok(img) => {
            extracted.width = i32::try_from(img.width()).ok();
            extracted.height = i32::try_from(img.height()).ok();
        }
        Err(e) => log::warn!("Could not decode image for metadata: {}", e),
    }

    let exif = match Reader::new().read_from_container(&mut Cursor::new(bytes)) {
        Ok(exif) => exif,
        Err(e) => {
            log::debug!("No EXIF data: {}", e);
            return extracted;
        }
    };

    let make = ascii_field(&exif, Tag::Make);
    let model = ascii_field(&exif, Tag::Model);
    extracted.camera_model = match (make, model) {
        (Some(make), Some(model)) if model.starts_with(&make) => Some(model),
        (Some(make), Some(model)) => Some(format!("{} {}", make, model)),
        (make, model) => make.or(model),
    };

    let latitude = gps_coordinate(&exif, Tag::GPSLatitude, Tag::GPSLatitudeRef);
    let longitude = gps_coordinate(&exif, Tag::GPSLongitude, Tag::GPSLongitudeRef);
    if let (Some(lat), Some(lon)) = (latitude, longitude) {
        extracted.location = Some(format!("{:.6},{:.6}", lat, lon));
    }

    extracted
}

fn ascii_field(exif: &exif::Exif, tag: Tag) -> Option<String> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    match &field.value {
        Value::Ascii(parts) => parts
            .first()
            .map(|raw| String::from_utf8_lossy(raw).trim_matches(char::from(0)).trim().to_string())
            .filter(|s| !s.is_empty()),
        _ => None,
    }
}

fn gps_coordinate(exif: &exif::Exif, tag: Tag, ref_tag: Tag) -> Option<f64> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    let parts: Vec<f64> = match &field.value {
        Value::Rational(values) => values.iter().map(|r| r.to_f64()).collect(),
        _ => return None,
    };
    let reference = ascii_field(exif, ref_tag).unwrap_or_default();
    dms_to_decimal(&parts, &reference)
}

/// Degrees/minutes/seconds to signed decimal degrees; S and W are negative
pub fn dms_to_decimal(parts: &[f64], reference: &str) -> Option<f64> {
    let degrees = *parts.first()?;
    let minutes = parts.get(1).copied().unwrap_or(0.0);
    let seconds = parts.get(2).copied().unwrap_or(0.0);
    let value = degrees + minutes / 60.0 + seconds / 3600.0;

    if !value.is_finite() {
        return None;
    }

    match reference.trim().to_ascii_uppercase().as_str() {
        "S" | "W" => Some(-value),
        _ => Some(value),
    }
}

/// Trimmed, lowercased, deduplicated tags
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}
