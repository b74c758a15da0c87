// src/services/gallery_service.rs
// DOCUMENTATION: Business logic for galleries
// PURPOSE: Gallery CRUD guarded by access control

use crate::db::{AccessRepository, GalleryRepository, ImageRepository};
use crate::errors::GalleryError;
use crate::models::{
    CreateGalleryRequest, Gallery, GalleryDetailResponse, GallerySummary, ImageStatus, Role,
    UpdateGalleryRequest,
};
use crate::services::access_service::AccessService;
use crate::services::auth_service::normalize_email;
use crate::services::security::{require_role, Claims};
use sqlx::PgPool;
use uuid::Uuid;

pub struct GalleryService;

impl GalleryService {
    /// Create a gallery; the creator is granted OWNER on it
    pub async fn create_gallery(
        pool: &PgPool,
        claims: &Claims,
        req: CreateGalleryRequest,
    ) -> Result<Gallery, GalleryError> {
        require_role(claims, &[Role::Admin])?;

        if req.name.trim().chars().count() < 3 {
            return Err(GalleryError::ValidationError(
                "Gallery name must be at least 3 characters long".to_string(),
            ));
        }

        let gallery =
            GalleryRepository::create_gallery(pool, claims.id, &normalize_email(&claims.email), &req)
                .await?;
        log::info!("Gallery {} created by {}", gallery.id, claims.email);
        Ok(gallery)
    }

    /// ADMIN sees every gallery, everyone else what they created or were granted
    pub async fn list_galleries(pool: &PgPool, claims: &Claims) -> Result<Vec<GallerySummary>, GalleryError> {
        if claims.is_admin() {
            GalleryRepository::list_all(pool).await
        } else {
            GalleryRepository::list_visible_to(pool, claims.id, &normalize_email(&claims.email)).await
        }
    }

    /// Gallery with its approved images, plus the access list for managers
    pub async fn get_gallery(
        pool: &PgPool,
        claims: &Claims,
        id: Uuid,
    ) -> Result<GalleryDetailResponse, GalleryError> {
        let (gallery, permissions) = AccessService::load(pool, claims, id).await?;
        permissions.require_view()?;

        let images = ImageRepository::list_by_gallery(pool, gallery.id, ImageStatus::Approved).await?;

        let access_list = if permissions.can_manage {
            let grants = AccessRepository::list_by_gallery(pool, gallery.id).await?;
            Some(grants.iter().map(|g| g.to_response()).collect())
        } else {
            None
        };

        Ok(GalleryDetailResponse {
            gallery,
            images: images.iter().map(|i| i.to_response()).collect(),
            access_list,
        })
    }

    pub async fn update_gallery(
        pool: &PgPool,
        claims: &Claims,
        id: Uuid,
        req: UpdateGalleryRequest,
    ) -> Result<Gallery, GalleryError> {
        let (gallery, permissions) = AccessService::load(pool, claims, id).await?;
        permissions.require_manage()?;

        if let Some(name) = &req.name {
            if name.trim().chars().count() < 3 {
                return Err(GalleryError::ValidationError(
                    "Gallery name must be at least 3 characters long".to_string(),
                ));
            }
        }

        GalleryRepository::update_gallery(pool, gallery.id, &req).await
    }

    pub async fn delete_gallery(pool: &PgPool, claims: &Claims, id: Uuid) -> Result<(), GalleryError> {
        let (gallery, permissions) = AccessService::load(pool, claims, id).await?;
        permissions.require_manage()?;

        GalleryRepository::delete_gallery(pool, gallery.id).await?;
        log::info!("Gallery {} deleted by {}", gallery.id, claims.email);
        Ok(())
    }
}
