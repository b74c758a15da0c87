// src/handlers/galleries.rs
// DOCUMENTATION: HTTP handlers for gallery CRUD

use crate::config::Config;
use crate::errors::GalleryError;
use crate::models::{CreateGalleryRequest, UpdateGalleryRequest};
use crate::services::security::authenticate;
use crate::services::GalleryService;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// POST /api/galleries
/// ADMIN only
pub async fn create_gallery(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http: HttpRequest,
    req: web::Json<CreateGalleryRequest>,
) -> Result<impl Responder, GalleryError> {
    let claims = authenticate(&http, &config)?;

    if let Err(e) = req.validate() {
        return Err(GalleryError::ValidationError(e.to_string()));
    }

    let gallery = GalleryService::create_gallery(pool.get_ref(), &claims, req.into_inner()).await?;
    Ok(HttpResponse::Created().json(gallery))
}

/// GET /api/galleries
pub async fn list_galleries(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http: HttpRequest,
) -> Result<impl Responder, GalleryError> {
    let claims = authenticate(&http, &config)?;
    let galleries = GalleryService::list_galleries(pool.get_ref(), &claims).await?;
    Ok(HttpResponse::Ok().json(galleries))
}

/// GET /api/galleries/{id}
pub async fn get_gallery(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<impl Responder, GalleryError> {
    let claims = authenticate(&http, &config)?;
    let gallery = GalleryService::get_gallery(pool.get_ref(), &claims, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(gallery))
}

/// PUT /api/galleries/{id}
pub async fn update_gallery(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http: HttpRequest,
    path: web::Path<Uuid>,
    req: web::Json<UpdateGalleryRequest>,
) -> Result<impl Responder, GalleryError> {
    let claims = authenticate(&http, &config)?;

    if let Err(e) = req.validate() {
        return Err(GalleryError::ValidationError(e.to_string()));
    }

    let gallery =
        GalleryService::update_gallery(pool.get_ref(), &claims, path.into_inner(), req.into_inner())
            .await?;
    Ok(HttpResponse::Ok().json(gallery))
}

/// DELETE /api/galleries/{id}
pub async fn delete_gallery(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<impl Responder, GalleryError> {
    let claims = authenticate(&http, &config)?;
    GalleryService::delete_gallery(pool.get_ref(), &claims, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Gallery deleted" })))
}

/// Configuration for gallery routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/galleries")
            .route("", web::post().to(create_gallery))
            .route("", web::get().to(list_galleries))
            .route("/{id}", web::get().to(get_gallery))
            .route("/{id}", web::put().to(update_gallery))
            .route("/{id}", web::delete().to(delete_gallery)),
    );
}
