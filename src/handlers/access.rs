// src/handlers/access.rs
// DOCUMENTATION: HTTP handlers for gallery access grants

use crate::config::Config;
use crate::errors::GalleryError;
use crate::models::GrantAccessRequest;
use crate::services::email::SharedEmailQueue;
use crate::services::security::authenticate;
use crate::services::AccessService;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// POST /api/access/grant
pub async fn grant_access(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    queue: web::Data<SharedEmailQueue>,
    http: HttpRequest,
    req: web::Json<GrantAccessRequest>,
) -> Result<impl Responder, GalleryError> {
    let claims = authenticate(&http, &config)?;

    if let Err(e) = req.validate() {
        return Err(GalleryError::ValidationError(e.to_string()));
    }

    let grants = AccessService::grant(
        pool.get_ref(),
        config.get_ref(),
        queue.get_ref().as_ref(),
        &claims,
        req.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Created().json(grants))
}

/// DELETE /api/access/{gallery_id}/{email}
pub async fn revoke_access(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http: HttpRequest,
    path: web::Path<(Uuid, String)>,
) -> Result<impl Responder, GalleryError> {
    let claims = authenticate(&http, &config)?;
    let (gallery_id, email) = path.into_inner();

    AccessService::revoke(pool.get_ref(), &claims, gallery_id, &email).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Access revoked" })))
}

/// GET /api/access/gallery/{gallery_id}
pub async fn list_gallery_access(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<impl Responder, GalleryError> {
    let claims = authenticate(&http, &config)?;
    let grants = AccessService::list_for_gallery(pool.get_ref(), &claims, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(grants))
}

/// GET /api/access/my-galleries
pub async fn my_galleries(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http: HttpRequest,
) -> Result<impl Responder, GalleryError> {
    let claims = authenticate(&http, &config)?;
    let galleries = AccessService::my_galleries(pool.get_ref(), &claims).await?;
    Ok(HttpResponse::Ok().json(galleries))
}

/// Configuration for access routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/access")
            .route("/grant", web::post().to(grant_access))
            .route("/my-galleries", web::get().to(my_galleries))
            .route("/gallery/{gallery_id}", web::get().to(list_gallery_access))
            .route("/{gallery_id}/{email}", web::delete().to(revoke_access)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{bearer_for, test_state};
    use actix_web::{http::StatusCode, test, App};

    #[actix_web::test]
    async fn test_grant_requires_emails() {
        let state = test_state();
        let app = test::init_service(
            App::new()
                .app_data(state.pool.clone())
                .app_data(state.config.clone())
                .app_data(state.queue.clone())
                .configure(config),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/access/grant")
            .insert_header(("Authorization", bearer_for(&state, "ADMIN")))
            .set_json(json!({"gallery_id": Uuid::new_v4(), "emails": []}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }
}
