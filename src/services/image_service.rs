// src/services/image_service.rs
// DOCUMENTATION: Business logic for gallery images
// PURPOSE: Submission, upload forwarding, listing and the review workflow

use crate::config::Config;
use crate::db::{GalleryRepository, ImageRepository, UserRepository};
use crate::errors::GalleryError;
use crate::models::{ImageResponse, ImageStatus, ReviewImageRequest, Role, SubmitImageRequest};
use crate::services::access_service::AccessService;
use crate::services::email::{enqueue_best_effort, review_result_email, EmailQueue};
use crate::services::security::{require_role, Claims};
use crate::services::storage_client::StorageClient;
use sqlx::PgPool;
use uuid::Uuid;

/// File received by the upload proxy
pub struct IncomingFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

pub struct ImageService;

impl ImageService {
    /// Record an already stored file as a PENDING image
    pub async fn submit_image(
        pool: &PgPool,
        claims: &Claims,
        req: SubmitImageRequest,
    ) -> Result<ImageResponse, GalleryError> {
        let (_, permissions) = AccessService::load(pool, claims, req.gallery_id).await?;
        permissions.require_upload()?;

        let image = ImageRepository::create_image(pool, claims.id, &req).await?;
        log::info!(
            "Image {} submitted to gallery {} by {}",
            image.id,
            image.gallery_id,
            claims.email
        );
        Ok(image.to_response())
    }

    /// Store the file through the storage service, then submit it
    pub async fn upload_image(
        pool: &PgPool,
        storage: &StorageClient,
        claims: &Claims,
        token: &str,
        gallery_id: Uuid,
        file: IncomingFile,
    ) -> Result<ImageResponse, GalleryError> {
        let (_, permissions) = AccessService::load(pool, claims, gallery_id).await?;
        permissions.require_upload()?;

        let stored = storage
            .upload(token, &file.filename, &file.content_type, file.bytes)
            .await?;

        let req = SubmitImageRequest {
            gallery_id,
            filename: file.filename,
            file_url: stored.original,
            thumbnail_url: Some(stored.thumbnail),
        };
        let image = match ImageRepository::create_image(pool, claims.id, &req).await {
            Ok(image) => image,
            Err(e) => {
                if let Err(cleanup) = storage.delete(token, &req.file_url).await {
                    log::error!("Orphaned upload {}: {}", req.file_url, cleanup);
                }
                return Err(e);
            }
        };
        log::info!("Image {} uploaded to gallery {}", image.id, gallery_id);
        Ok(image.to_response())
    }

    /// Approved images for viewers; managers may ask for another status
    pub async fn list_gallery_images(
        pool: &PgPool,
        claims: &Claims,
        gallery_id: Uuid,
        status: Option<ImageStatus>,
    ) -> Result<Vec<ImageResponse>, GalleryError> {
        let (gallery, permissions) = AccessService::load(pool, claims, gallery_id).await?;
        permissions.require_view()?;

        let status = status.unwrap_or(ImageStatus::Approved);
        if status != ImageStatus::Approved {
            permissions.require_manage()?;
        }

        let images = ImageRepository::list_by_gallery(pool, gallery.id, status).await?;
        Ok(images.iter().map(|i| i.to_response()).collect())
    }

    pub async fn list_pending(pool: &PgPool, claims: &Claims) -> Result<Vec<ImageResponse>, GalleryError> {
        require_role(claims, &[Role::Admin])?;
        let images = ImageRepository::list_pending(pool).await?;
        Ok(images.iter().map(|i| i.to_response()).collect())
    }

    pub async fn list_mine(pool: &PgPool, claims: &Claims) -> Result<Vec<ImageResponse>, GalleryError> {
        let images = ImageRepository::list_by_uploader(pool, claims.id).await?;
        Ok(images.iter().map(|i| i.to_response()).collect())
    }

    /// Approve or reject a PENDING image and notify its uploader
    pub async fn review_image(
        pool: &PgPool,
        config: &Config,
        queue: &dyn EmailQueue,
        claims: &Claims,
        image_id: Uuid,
        req: ReviewImageRequest,
    ) -> Result<ImageResponse, GalleryError> {
        if req.status == ImageStatus::Pending {
            return Err(GalleryError::InvalidInput(
                "Review status must be APPROVED or REJECTED".to_string(),
            ));
        }

        let image = ImageRepository::get_by_id(pool, image_id).await?;
        let (gallery, permissions) = AccessService::load(pool, claims, image.gallery_id).await?;
        permissions.require_manage()?;

        if !image.status().can_transition_to(req.status) {
            return Err(GalleryError::Conflict(format!(
                "Image already reviewed ({})",
                image.status
            )));
        }

        // Nothing after the conditional update may fail
        let uploader = UserRepository::get_by_id(pool, image.uploaded_by).await?;

        let note = req.note.as_deref().map(str::trim).filter(|n| !n.is_empty());
        let reviewed = ImageRepository::review_image(pool, image.id, claims.id, req.status, note)
            .await?
            .ok_or_else(|| GalleryError::Conflict("Image already reviewed".to_string()))?;

        log::info!(
            "Image {} {} by {}",
            reviewed.id,
            reviewed.status,
            claims.email
        );

        match uploader {
            Some(uploader) => {
                let message = review_result_email(
                    &uploader.email,
                    &reviewed.filename,
                    &gallery,
                    req.status,
                    note,
                    &config.frontend_url,
                );
                enqueue_best_effort(queue, &message).await;
            }
            None => log::warn!("Uploader of image {} no longer exists", reviewed.id),
        }

        Ok(reviewed.to_response())
    }

    /// A stored file may be read by its owner, ADMIN, managers of a gallery that
    /// references it, and that gallery's viewers once the image is APPROVED
    pub async fn authorize_file_read(
        pool: &PgPool,
        claims: &Claims,
        owner_id: Uuid,
        url: &str,
    ) -> Result<(), GalleryError> {
        if claims.id == owner_id || claims.is_admin() {
            return Ok(());
        }

        for image in ImageRepository::list_by_file_url(pool, url).await? {
            let gallery = GalleryRepository::get_by_id(pool, image.gallery_id).await?;
            let permissions = AccessService::permissions(pool, claims, &gallery).await?;
            if permissions.can_manage
                || (permissions.can_view && image.status() == ImageStatus::Approved)
            {
                return Ok(());
            }
        }

        log::warn!("User {} denied access to {}", claims.id, url);
        Err(GalleryError::Forbidden(
            "You do not have permission to view this image".to_string(),
        ))
    }

    /// Uploaders may delete their own images, managers any image of the gallery
    pub async fn delete_image(pool: &PgPool, claims: &Claims, image_id: Uuid) -> Result<(), GalleryError> {
        let image = ImageRepository::get_by_id(pool, image_id).await?;

        if image.uploaded_by != claims.id {
            let gallery = GalleryRepository::get_by_id(pool, image.gallery_id).await?;
            AccessService::permissions(pool, claims, &gallery)
                .await?
                .require_manage()?;
        }

        ImageRepository::delete_image(pool, image.id).await?;
        log::info!("Image {} deleted by {}", image.id, claims.email);
        Ok(())
    }
}
