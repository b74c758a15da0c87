// src/models/metadata.rs
// DOCUMENTATION: Image metadata indexed by the search service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Row from the `image_metadata` table (search vector excluded)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ImageMetadata {
    pub id: Uuid,
    pub user_id: Uuid,
    pub filename: String,
    /// Server-side location; never sent to clients
    #[serde(skip_serializing)]
    pub path: String,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub camera_model: Option<String>,
    /// "lat,lon" in decimal degrees
    pub location: Option<String>,
    pub tags: Vec<String>,
    pub indexed: bool,
    pub upload_date: DateTime<Utc>,
}

/// Values pulled out of an image file before insertion
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedMetadata {
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub camera_model: Option<String>,
    pub location: Option<String>,
}

/// POST /api/metadata/extract
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ExtractRequest {
    #[validate(length(min = 1, message = "Filename is required"))]
    pub filename: String,

    #[serde(default)]
    pub tags: Vec<String>,
}

/// GET /api/metadata/search?query=
#[derive(Debug, Clone, Deserialize)]
pub struct MetadataSearchQuery {
    pub query: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataSearchResponse {
    pub results: Vec<ImageMetadata>,
}
