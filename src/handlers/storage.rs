// src/handlers/storage.rs
// DOCUMENTATION: HTTP handlers for the storage service
// PURPOSE: Upload, serve, transform and delete stored image files

use crate::config::Config;
use crate::errors::GalleryError;
use crate::handlers::multipart::read_image_field;
use crate::models::TransformQuery;
use crate::services::security::authenticate;
use crate::services::storage::{original_url, thumbnail_url, validate_filename};
use crate::services::{ImageService, OutputFormat, StorageService};
use actix_multipart::Multipart;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

fn image_response(bytes: Vec<u8>) -> HttpResponse {
    let content_type = OutputFormat::detect(&bytes)
        .map(|f| f.content_type())
        .unwrap_or("application/octet-stream");
    HttpResponse::Ok().content_type(content_type).body(bytes)
}

/// POST /api/storage/upload
pub async fn upload(
    config: web::Data<Config>,
    storage: web::Data<StorageService>,
    http: HttpRequest,
    payload: Multipart,
) -> Result<impl Responder, GalleryError> {
    let claims = authenticate(&http, &config)?;

    let file = read_image_field(payload, storage.max_upload_bytes()).await?;
    let stored = storage
        .save_upload(claims.id, &file.filename, &file.content_type, file.bytes)
        .await?;
    Ok(HttpResponse::Ok().json(stored))
}

/// GET /api/storage/uploads/{filename}
/// Shortcut for the caller's own files
pub async fn get_original(
    config: web::Data<Config>,
    storage: web::Data<StorageService>,
    http: HttpRequest,
    path: web::Path<String>,
) -> Result<impl Responder, GalleryError> {
    let claims = authenticate(&http, &config)?;
    let bytes = storage.read_original(claims.id, &path.into_inner()).await?;
    Ok(image_response(bytes))
}

/// GET /api/storage/thumbnails/{filename}
pub async fn get_thumbnail(
    config: web::Data<Config>,
    storage: web::Data<StorageService>,
    http: HttpRequest,
    path: web::Path<String>,
) -> Result<impl Responder, GalleryError> {
    let claims = authenticate(&http, &config)?;
    let bytes = storage.read_thumbnail(claims.id, &path.into_inner()).await?;
    Ok(image_response(bytes))
}

/// GET /api/storage/transform/{filename}?width&height&format&quality
pub async fn transform(
    config: web::Data<Config>,
    storage: web::Data<StorageService>,
    http: HttpRequest,
    path: web::Path<String>,
    query: web::Query<TransformQuery>,
) -> Result<impl Responder, GalleryError> {
    let claims = authenticate(&http, &config)?;
    let (bytes, format) = storage
        .transform(claims.id, &path.into_inner(), query.into_inner())
        .await?;
    Ok(HttpResponse::Ok().content_type(format.content_type()).body(bytes))
}

/// GET /api/storage/uploads/{user_id}/{filename}
/// The URL recorded as an image's `file_url`
pub async fn get_user_original(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    storage: web::Data<StorageService>,
    http: HttpRequest,
    path: web::Path<(Uuid, String)>,
) -> Result<impl Responder, GalleryError> {
    let claims = authenticate(&http, &config)?;
    let (owner_id, filename) = path.into_inner();
    validate_filename(&filename)?;

    let url = original_url(owner_id, &filename);
    ImageService::authorize_file_read(pool.get_ref(), &claims, owner_id, &url).await?;

    let bytes = storage.read_original(owner_id, &filename).await?;
    Ok(image_response(bytes))
}

/// GET /api/storage/thumbnails/{user_id}/{filename}
pub async fn get_user_thumbnail(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    storage: web::Data<StorageService>,
    http: HttpRequest,
    path: web::Path<(Uuid, String)>,
) -> Result<impl Responder, GalleryError> {
    let claims = authenticate(&http, &config)?;
    let (owner_id, filename) = path.into_inner();
    validate_filename(&filename)?;

    let url = thumbnail_url(owner_id, &filename);
    ImageService::authorize_file_read(pool.get_ref(), &claims, owner_id, &url).await?;

    let bytes = storage.read_thumbnail(owner_id, &filename).await?;
    Ok(image_response(bytes))
}

/// GET /api/storage/transform/{user_id}/{filename}?width&height&format&quality
pub async fn transform_user_file(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    storage: web::Data<StorageService>,
    http: HttpRequest,
    path: web::Path<(Uuid, String)>,
    query: web::Query<TransformQuery>,
) -> Result<impl Responder, GalleryError> {
    let claims = authenticate(&http, &config)?;
    let (owner_id, filename) = path.into_inner();
    validate_filename(&filename)?;

    let url = original_url(owner_id, &filename);
    ImageService::authorize_file_read(pool.get_ref(), &claims, owner_id, &url).await?;

    let (bytes, format) = storage
        .transform(owner_id, &filename, query.into_inner())
        .await?;
    Ok(HttpResponse::Ok().content_type(format.content_type()).body(bytes))
}

/// DELETE /api/storage/uploads/{user_id}/{filename}
/// Owner or ADMIN only
pub async fn delete_upload(
    config: web::Data<Config>,
    storage: web::Data<StorageService>,
    http: HttpRequest,
    path: web::Path<(Uuid, String)>,
) -> Result<impl Responder, GalleryError> {
    let claims = authenticate(&http, &config)?;
    let (owner_id, filename) = path.into_inner();

    if claims.id != owner_id && !claims.is_admin() {
        return Err(GalleryError::Forbidden(
            "You can only delete your own files".to_string(),
        ));
    }

    storage.delete_upload(owner_id, &filename).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "File deleted" })))
}

/// Configuration for storage routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/storage")
            .route("/upload", web::post().to(upload))
            .route("/uploads/{filename}", web::get().to(get_original))
            .route("/uploads/{user_id}/{filename}", web::get().to(get_user_original))
            .route("/uploads/{user_id}/{filename}", web::delete().to(delete_upload))
            .route("/thumbnails/{filename}", web::get().to(get_thumbnail))
            .route("/thumbnails/{user_id}/{filename}", web::get().to(get_user_thumbnail))
            .route("/transform/{filename}", web::get().to(transform))
            .route("/transform/{user_id}/{filename}", web::get().to(transform_user_file)),
    );
}
