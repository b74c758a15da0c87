// src/models/access.rs
// DOCUMENTATION: Gallery access grants
// PURPOSE: Models for granting, revoking and listing per-email access

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// Level of a grant; ordering is meaningful (Owner > Uploader > Viewer)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccessLevel {
    Viewer,
    Uploader,
    Owner,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::Viewer => "VIEWER",
            AccessLevel::Uploader => "UPLOADER",
            AccessLevel::Owner => "OWNER",
        }
    }
}

impl Default for AccessLevel {
    fn default() -> Self {
        AccessLevel::Viewer
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "VIEWER" => Ok(AccessLevel::Viewer),
            "UPLOADER" => Ok(AccessLevel::Uploader),
            "OWNER" => Ok(AccessLevel::Owner),
            other => Err(format!("Unknown access level: {}", other)),
        }
    }
}

/// Grant record from the `user_access` table, unique on (email, gallery_id)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserAccess {
    pub id: Uuid,
    pub email: String,
    pub gallery_id: Uuid,
    pub access_level: String,
    pub granted_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessResponse {
    pub email: String,
    pub gallery_id: Uuid,
    pub access_level: String,
    pub granted_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl UserAccess {
    pub fn to_response(&self) -> AccessResponse {
        AccessResponse {
            email: self.email.clone(),
            gallery_id: self.gallery_id,
            access_level: self.access_level.clone(),
            granted_by: self.granted_by,
            created_at: self.created_at,
        }
    }

    pub fn level(&self) -> AccessLevel {
        self.access_level.parse().unwrap_or_default()
    }
}

/// POST /api/access/grant
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GrantAccessRequest {
    pub gallery_id: Uuid,

    #[validate(length(min = 1, message = "At least one email is required"))]
    pub emails: Vec<String>,

    #[serde(default)]
    pub access_level: AccessLevel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(AccessLevel::Owner > AccessLevel::Uploader);
        assert!(AccessLevel::Uploader > AccessLevel::Viewer);
    }

    #[test]
    fn test_grant_defaults_to_viewer() {
        let req: GrantAccessRequest = serde_json::from_str(
            r#"{"gallery_id":"6f1c1b9e-2f7a-4c1e-9d55-0c8c2b8f4a10","emails":["a@b.co"]}"#,
        )
        .unwrap();
        assert_eq!(req.access_level, AccessLevel::Viewer);
    }
}
