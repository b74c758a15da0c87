// src/models/gallery.rs
// DOCUMENTATION: Gallery records and DTOs
// PURPOSE: Serialization models for gallery CRUD

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::{AccessResponse, ImageResponse};

/// Gallery record from the `galleries` table
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Gallery {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// User that created the gallery; always has manage rights
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Gallery row joined with its approved image count, used for listings
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GallerySummary {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub image_count: i64,
}

/// POST /api/galleries
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateGalleryRequest {
    #[validate(length(min = 3, max = 255, message = "Gallery name must be at least 3 characters long"))]
    pub name: String,

    #[validate(length(max = 2000))]
    pub description: Option<String>,
}

/// PUT /api/galleries/{id}
/// All fields are optional - only provided fields are updated
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateGalleryRequest {
    #[validate(length(min = 3, max = 255, message = "Gallery name must be at least 3 characters long"))]
    pub name: Option<String>,

    #[validate(length(max = 2000))]
    pub description: Option<String>,
}

/// GET /api/galleries/{id}
#[derive(Debug, Serialize)]
pub struct GalleryDetailResponse {
    #[serde(flatten)]
    pub gallery: Gallery,
    pub images: Vec<ImageResponse>,
    /// Only present for callers who can manage the gallery
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_list: Option<Vec<AccessResponse>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_gallery_name_length() {
        let short = CreateGalleryRequest {
            name: "ab".to_string(),
            description: None,
        };
        assert!(short.validate().is_err());

        let ok = CreateGalleryRequest {
            name: "Summer 2024".to_string(),
            description: Some("Beach trip".to_string()),
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_detail_hides_access_list_when_absent() {
        let gallery = Gallery {
            id: Uuid::new_v4(),
            name: "Summer".to_string(),
            description: None,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let detail = GalleryDetailResponse {
            gallery,
            images: vec![],
            access_list: None,
        };
        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["name"], "Summer");
        assert!(json.get("access_list").is_none());
    }
}
