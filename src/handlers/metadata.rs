// src/handlers/metadata.rs
// DOCUMENTATION: HTTP handlers for the search service

use crate::config::Config;
use crate::errors::GalleryError;
use crate::models::{ExtractRequest, MetadataSearchQuery, MetadataSearchResponse};
use crate::services::security::authenticate;
use crate::services::{MetadataService, SearchCache, StorageService};
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// POST /api/metadata/extract
pub async fn extract_metadata(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    storage: web::Data<StorageService>,
    http: HttpRequest,
    req: web::Json<ExtractRequest>,
) -> Result<impl Responder, GalleryError> {
    let claims = authenticate(&http, &config)?;

    if let Err(e) = req.validate() {
        return Err(GalleryError::ValidationError(e.to_string()));
    }

    let metadata =
        MetadataService::extract(pool.get_ref(), storage.get_ref(), claims.id, req.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Metadata extracted",
        "metadata": metadata
    })))
}

/// POST /api/metadata/index/{id}
pub async fn index_image(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    cache: web::Data<Arc<SearchCache>>,
    http: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<impl Responder, GalleryError> {
    authenticate(&http, &config)?;
    MetadataService::index(pool.get_ref(), cache.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Image indexed successfully" })))
}

/// GET /api/metadata/search?query=
pub async fn search_images(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    cache: web::Data<Arc<SearchCache>>,
    http: HttpRequest,
    query: web::Query<MetadataSearchQuery>,
) -> Result<impl Responder, GalleryError> {
    let claims = authenticate(&http, &config)?;
    let results = MetadataService::search(
        pool.get_ref(),
        cache.get_ref(),
        &claims,
        query.query.as_deref(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(MetadataSearchResponse { results }))
}

/// Configuration for metadata routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/metadata")
            .route("/extract", web::post().to(extract_metadata))
            .route("/index/{id}", web::post().to(index_image))
            .route("/search", web::get().to(search_images)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{bearer_for, test_state};
    use actix_web::{http::StatusCode, test, App};

    #[actix_web::test]
    async fn test_search_requires_query() {
        let state = test_state();
        let app = test::init_service(
            App::new()
                .app_data(state.pool.clone())
                .app_data(state.config.clone())
                .app_data(web::Data::new(Arc::new(SearchCache::new(60))))
                .configure(config),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/metadata/search?query=%20")
            .insert_header(("Authorization", bearer_for(&state, "USER")))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }
}
