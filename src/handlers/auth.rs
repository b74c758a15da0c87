// src/handlers/auth.rs
// DOCUMENTATION: HTTP handlers for accounts and user lookup
// PURPOSE: Parse requests, call AuthService, return responses

use crate::config::Config;
use crate::errors::GalleryError;
use crate::models::{
    BulkUserRequest, ForgetPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest,
    UserLookupQuery,
};
use crate::services::email::SharedEmailQueue;
use crate::services::security::{authenticate, client_key, LoginRateLimiter};
use crate::services::AuthService;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

/// POST /api/auth/register
pub async fn register(
    pool: web::Data<PgPool>,
    req: web::Json<RegisterRequest>,
) -> Result<impl Responder, GalleryError> {
    if let Err(e) = req.validate() {
        return Err(GalleryError::ValidationError(e.to_string()));
    }

    let user = AuthService::register(pool.get_ref(), req.into_inner()).await?;
    Ok(HttpResponse::Created().json(json!({
        "message": "User registered successfully",
        "user": user
    })))
}

/// POST /api/auth/login
/// Throttled per client address
pub async fn login(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    limiter: web::Data<LoginRateLimiter>,
    http: HttpRequest,
    req: web::Json<LoginRequest>,
) -> Result<impl Responder, GalleryError> {
    limiter.check(&client_key(&http, &config.trusted_proxies))?;

    if let Err(e) = req.validate() {
        return Err(GalleryError::ValidationError(e.to_string()));
    }

    let response = AuthService::login(pool.get_ref(), config.get_ref(), req.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// GET /api/auth
pub async fn current_user(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http: HttpRequest,
) -> Result<impl Responder, GalleryError> {
    let claims = authenticate(&http, &config)?;
    let user = AuthService::current_user(pool.get_ref(), &claims).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// POST /api/auth/forget-password
/// Same answer whether or not the account exists
pub async fn forget_password(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    queue: web::Data<SharedEmailQueue>,
    req: web::Json<ForgetPasswordRequest>,
) -> Result<impl Responder, GalleryError> {
    if let Err(e) = req.validate() {
        return Err(GalleryError::ValidationError(e.to_string()));
    }

    AuthService::forget_password(pool.get_ref(), config.get_ref(), queue.get_ref().as_ref(), &req.email)
        .await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "If the account exists, a password reset link has been sent"
    })))
}

/// POST /api/auth/reset-password
pub async fn reset_password(
    pool: web::Data<PgPool>,
    req: web::Json<ResetPasswordRequest>,
) -> Result<impl Responder, GalleryError> {
    if let Err(e) = req.validate() {
        return Err(GalleryError::ValidationError(e.to_string()));
    }

    AuthService::reset_password(pool.get_ref(), &req.token, &req.password).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Password reset successful" })))
}

/// DELETE /api/auth/delete
pub async fn delete_account(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http: HttpRequest,
) -> Result<impl Responder, GalleryError> {
    let claims = authenticate(&http, &config)?;
    AuthService::delete_account(pool.get_ref(), &claims).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Account deleted successfully" })))
}

/// GET /api/auth/logout
/// Tokens are stateless; the client drops its copy
pub async fn logout() -> impl Responder {
    HttpResponse::Ok().json(json!({ "message": "Logout successful" }))
}

/// GET /api/auth/user?email=
pub async fn lookup_user(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http: HttpRequest,
    query: web::Query<UserLookupQuery>,
) -> Result<impl Responder, GalleryError> {
    authenticate(&http, &config)?;

    let email = query
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| GalleryError::InvalidInput("Email is required".to_string()))?;

    let user = AuthService::lookup_user(pool.get_ref(), email).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// POST /api/auth/user/bulk
pub async fn bulk_lookup(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http: HttpRequest,
    req: web::Json<BulkUserRequest>,
) -> Result<impl Responder, GalleryError> {
    authenticate(&http, &config)?;

    let emails = parse_email_list(req.into_inner().emails)?;
    let response = AuthService::bulk_lookup(pool.get_ref(), emails).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// `emails` must be a JSON array of strings
fn parse_email_list(value: Option<serde_json::Value>) -> Result<Vec<String>, GalleryError> {
    let invalid = || GalleryError::InvalidInput("emails must be an array of strings".to_string());

    match value {
        Some(serde_json::Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                serde_json::Value::String(s) => Ok(s),
                _ => Err(invalid()),
            })
            .collect(),
        _ => Err(invalid()),
    }
}

/// Configuration for auth routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/auth")
            .route("", web::get().to(current_user))
            .route("/register", web::post().to(register))
            .route("/login", web::post().to(login))
            .route("/forget-password", web::post().to(forget_password))
            .route("/reset-password", web::post().to(reset_password))
            .route("/delete", web::delete().to(delete_account))
            .route("/logout", web::get().to(logout))
            .route("/user", web::get().to(lookup_user))
            .route("/user/bulk", web::post().to(bulk_lookup)),
    );
}

#[cfg(test)]
mod parse_tests {
    use super::*;

    #[test]
    fn test_parse_email_list() {
        let ok = parse_email_list(Some(json!(["a@b.co", "c@d.co"]))).unwrap();
        assert_eq!(ok.len(), 2);
        assert!(parse_email_list(Some(json!("a@b.co"))).is_err());
        assert!(parse_email_list(Some(json!([1, 2]))).is_err());
        assert!(parse_email_list(None).is_err());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{bearer_for, test_state};
    use actix_web::{http::StatusCode, test, App};

    #[actix_web::test]
    async fn test_current_user_requires_token() {
        let state = test_state();
        let app = test::init_service(
            App::new()
                .app_data(state.pool.clone())
                .app_data(state.config.clone())
                .configure(config),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/auth").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let empty_bearer = test::TestRequest::get()
            .uri("/api/auth")
            .insert_header(("Authorization", "Bearer "))
            .to_request();
        let resp = test::call_service(&app, empty_bearer).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri("/api/auth")
            .insert_header(("Authorization", "Bearer not-a-token"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_register_rejects_bad_input() {
        let state = test_state();
        let app = test::init_service(
            App::new()
                .app_data(state.pool.clone())
                .app_data(state.config.clone())
                .configure(config),
        )
        .await;

        let short_password = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({"name": "Ana", "email": "ana@example.com", "password": "123", "role": "USER"}))
            .to_request();
        let resp = test::call_service(&app, short_password).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let bad_role = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({"name": "Ana", "email": "ana@example.com", "password": "123456", "role": "ROOT"}))
            .to_request();
        let resp = test::call_service(&app, bad_role).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_bulk_lookup_rejects_non_array() {
        let state = test_state();
        let app = test::init_service(
            App::new()
                .app_data(state.pool.clone())
                .app_data(state.config.clone())
                .configure(config),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/auth/user/bulk")
            .insert_header(("Authorization", bearer_for(&state, "USER")))
            .set_json(json!({"emails": "a@b.co"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_logout() {
        let app = test::init_service(App::new().configure(config)).await;
        let req = test::TestRequest::get().uri("/api/auth/logout").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
