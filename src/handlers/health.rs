// src/handlers/health.rs
// DOCUMENTATION: Health check handler
// PURPOSE: Simple endpoint to verify service status

use crate::config::Config;
use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

pub async fn health_check(config: web::Data<Config>) -> impl Responder {
    let services: Vec<&str> = config.services.iter().map(|s| s.as_str()).collect();

    HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": "photo-gallery",
        "version": env!("CARGO_PKG_VERSION"),
        "services": services
    }))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceKind;
    use actix_web::{test, App};

    #[actix_web::test]
    async fn test_health_lists_mounted_services() {
        let mut cfg = Config::from_env();
        cfg.services = vec![ServiceKind::Auth, ServiceKind::Storage];

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(cfg))
                .configure(config),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "photo-gallery");
        assert_eq!(body["services"], json!(["auth", "storage"]));
    }
}
