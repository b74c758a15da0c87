// src/models/gallery_image.rs
// DOCUMENTATION: Uploaded images and their review status
// PURPOSE: Models for the submit/review workflow

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// Review status assigned to an uploaded image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ImageStatus {
    Pending,
    Approved,
    Rejected,
}

impl ImageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageStatus::Pending => "PENDING",
            ImageStatus::Approved => "APPROVED",
            ImageStatus::Rejected => "REJECTED",
        }
    }

    /// A review moves an image out of PENDING exactly once
    pub fn can_transition_to(&self, next: ImageStatus) -> bool {
        matches!(
            (self, next),
            (ImageStatus::Pending, ImageStatus::Approved)
                | (ImageStatus::Pending, ImageStatus::Rejected)
        )
    }
}

impl fmt::Display for ImageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(ImageStatus::Pending),
            "APPROVED" => Ok(ImageStatus::Approved),
            "REJECTED" => Ok(ImageStatus::Rejected),
            other => Err(format!("Unknown image status: {}", other)),
        }
    }
}

/// Image record from the `images` table
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Image {
    pub id: Uuid,
    pub gallery_id: Uuid,
    pub filename: String,
    pub file_url: String,
    pub thumbnail_url: Option<String>,
    pub uploaded_by: Uuid,
    pub status: String,
    pub review_note: Option<String>,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Image DTO for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageResponse {
    pub id: Uuid,
    pub gallery_id: Uuid,
    pub filename: String,
    pub file_url: String,
    pub thumbnail_url: Option<String>,
    pub uploaded_by: Uuid,
    pub status: String,
    pub review_note: Option<String>,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Image {
    pub fn to_response(&self) -> ImageResponse {
        ImageResponse {
            id: self.id,
            gallery_id: self.gallery_id,
            filename: self.filename.clone(),
            file_url: self.file_url.clone(),
            thumbnail_url: self.thumbnail_url.clone(),
            uploaded_by: self.uploaded_by,
            status: self.status.clone(),
            review_note: self.review_note.clone(),
            reviewed_by: self.reviewed_by,
            reviewed_at: self.reviewed_at,
            created_at: self.created_at,
        }
    }

    pub fn status(&self) -> ImageStatus {
        self.status.parse().unwrap_or(ImageStatus::Pending)
    }
}

/// POST /api/images
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitImageRequest {
    pub gallery_id: Uuid,

    #[validate(length(min = 1, max = 255, message = "Filename is required"))]
    pub filename: String,

    #[validate(length(min = 1, message = "Storage path is required"))]
    pub file_url: String,

    pub thumbnail_url: Option<String>,
}

/// PATCH /api/images/review/{image_id}
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReviewImageRequest {
    pub status: ImageStatus,

    #[validate(length(max = 1000))]
    pub note: Option<String>,
}

/// GET /api/images/gallery/{gallery_id}?status=
#[derive(Debug, Clone, Deserialize)]
pub struct ImageListQuery {
    pub status: Option<ImageStatus>,
}

/// Paths returned by the storage service after an upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredFile {
    pub message: String,
    pub original: String,
    pub thumbnail: String,
    pub width: u32,
    pub height: u32,
}

/// GET /api/storage/transform/{filename}?width&height&format&quality
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransformQuery {
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// jpeg, png or webp; defaults to the stored format
    pub format: Option<String>,
    pub quality: Option<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_transitions() {
        assert!(ImageStatus::Pending.can_transition_to(ImageStatus::Approved));
        assert!(ImageStatus::Pending.can_transition_to(ImageStatus::Rejected));
        assert!(!ImageStatus::Pending.can_transition_to(ImageStatus::Pending));
        assert!(!ImageStatus::Approved.can_transition_to(ImageStatus::Rejected));
        assert!(!ImageStatus::Rejected.can_transition_to(ImageStatus::Approved));
    }

    #[test]
    fn test_status_serde() {
        let req: ReviewImageRequest =
            serde_json::from_str(r#"{"status":"APPROVED","note":"nice"}"#).unwrap();
        assert_eq!(req.status, ImageStatus::Approved);
        assert!(serde_json::from_str::<ReviewImageRequest>(r#"{"status":"MAYBE"}"#).is_err());
    }
}
