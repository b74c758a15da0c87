// src/handlers/images.rs
// DOCUMENTATION: HTTP handlers for gallery images and their review

use crate::config::Config;
use crate::errors::GalleryError;
use crate::handlers::multipart::read_image_field;
use crate::models::{ImageListQuery, ReviewImageRequest, SubmitImageRequest};
use crate::services::email::SharedEmailQueue;
use crate::services::security::{authenticate, extract_token};
use crate::services::{ImageService, StorageClient};
use actix_multipart::Multipart;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// POST /api/images
pub async fn submit_image(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http: HttpRequest,
    req: web::Json<SubmitImageRequest>,
) -> Result<impl Responder, GalleryError> {
    let claims = authenticate(&http, &config)?;

    if let Err(e) = req.validate() {
        return Err(GalleryError::ValidationError(e.to_string()));
    }

    let image = ImageService::submit_image(pool.get_ref(), &claims, req.into_inner()).await?;
    Ok(HttpResponse::Created().json(image))
}

/// POST /api/images/upload/{gallery_id}
/// Forwards the file to the storage service with the caller's token
pub async fn upload_image(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    storage: web::Data<StorageClient>,
    http: HttpRequest,
    path: web::Path<Uuid>,
    payload: Multipart,
) -> Result<impl Responder, GalleryError> {
    let claims = authenticate(&http, &config)?;
    let token = http
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(extract_token)
        .unwrap_or_default()
        .to_string();

    let file = read_image_field(payload, config.max_upload_bytes).await?;
    let image = ImageService::upload_image(
        pool.get_ref(),
        storage.get_ref(),
        &claims,
        &token,
        path.into_inner(),
        file,
    )
    .await?;
    Ok(HttpResponse::Created().json(image))
}

/// GET /api/images/gallery/{gallery_id}?status=
pub async fn gallery_images(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http: HttpRequest,
    path: web::Path<Uuid>,
    query: web::Query<ImageListQuery>,
) -> Result<impl Responder, GalleryError> {
    let claims = authenticate(&http, &config)?;
    let images =
        ImageService::list_gallery_images(pool.get_ref(), &claims, path.into_inner(), query.status)
            .await?;
    Ok(HttpResponse::Ok().json(images))
}

/// GET /api/images/pending
/// ADMIN only
pub async fn pending_images(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http: HttpRequest,
) -> Result<impl Responder, GalleryError> {
    let claims = authenticate(&http, &config)?;
    let images = ImageService::list_pending(pool.get_ref(), &claims).await?;
    Ok(HttpResponse::Ok().json(images))
}

/// GET /api/images/mine
pub async fn my_images(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http: HttpRequest,
) -> Result<impl Responder, GalleryError> {
    let claims = authenticate(&http, &config)?;
    let images = ImageService::list_mine(pool.get_ref(), &claims).await?;
    Ok(HttpResponse::Ok().json(images))
}

/// PATCH /api/images/review/{image_id}
pub async fn review_image(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    queue: web::Data<SharedEmailQueue>,
    http: HttpRequest,
    path: web::Path<Uuid>,
    req: web::Json<ReviewImageRequest>,
) -> Result<impl Responder, GalleryError> {
    let claims = authenticate(&http, &config)?;

    if let Err(e) = req.validate() {
        return Err(GalleryError::ValidationError(e.to_string()));
    }

    let image = ImageService::review_image(
        pool.get_ref(),
        config.get_ref(),
        queue.get_ref().as_ref(),
        &claims,
        path.into_inner(),
        req.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(image))
}

/// DELETE /api/images/{image_id}
pub async fn delete_image(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<impl Responder, GalleryError> {
    let claims = authenticate(&http, &config)?;
    ImageService::delete_image(pool.get_ref(), &claims, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Image deleted" })))
}

/// Configuration for image routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/images")
            .route("", web::post().to(submit_image))
            .route("/pending", web::get().to(pending_images))
            .route("/mine", web::get().to(my_images))
            .route("/upload/{gallery_id}", web::post().to(upload_image))
            .route("/gallery/{gallery_id}", web::get().to(gallery_images))
            .route("/review/{image_id}", web::patch().to(review_image))
            .route("/{image_id}", web::delete().to(delete_image)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{bearer_for, test_state};
    use actix_web::{http::StatusCode, test, App};

    #[actix_web::test]
    async fn test_review_guards() {
        let state = test_state();
        let app = test::init_service(
            App::new()
                .app_data(state.pool.clone())
                .app_data(state.config.clone())
                .app_data(state.queue.clone())
                .configure(config),
        )
        .await;

        let back_to_pending = test::TestRequest::patch()
            .uri(&format!("/api/images/review/{}", Uuid::new_v4()))
            .insert_header(("Authorization", bearer_for(&state, "ADMIN")))
            .set_json(json!({"status": "PENDING"}))
            .to_request();
        assert_eq!(
            test::call_service(&app, back_to_pending).await.status(),
            StatusCode::BAD_REQUEST
        );

        let unknown_status = test::TestRequest::patch()
            .uri(&format!("/api/images/review/{}", Uuid::new_v4()))
            .insert_header(("Authorization", bearer_for(&state, "ADMIN")))
            .set_json(json!({"status": "MAYBE"}))
            .to_request();
        assert_eq!(
            test::call_service(&app, unknown_status).await.status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[actix_web::test]
    async fn test_pending_is_admin_only() {
        let state = test_state();
        let app = test::init_service(
            App::new()
                .app_data(state.pool.clone())
                .app_data(state.config.clone())
                .configure(config),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/images/pending")
            .insert_header(("Authorization", bearer_for(&state, "UPLOADER")))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
    }
}
