// src/bin/gateway.rs
// DOCUMENTATION: API gateway entry point
// PURPOSE: Route /api/* prefixes to the owning service

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpRequest, HttpResponse, HttpServer, Responder};
use photo_gallery::config::{self, GatewayConfig};
use photo_gallery::errors::GalleryError;
use photo_gallery::services::Proxy;
use serde_json::json;

async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": "gateway",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn forward(
    proxy: web::Data<Proxy>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, GalleryError> {
    proxy.forward(&req, body).await
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let gateway = GatewayConfig::from_env();
    config::init_logging(&gateway.log_level);

    for (prefix, upstream) in &gateway.routes {
        log::info!("Route {} -> {}", prefix, upstream);
    }

    let proxy = web::Data::new(Proxy::new(gateway.routes.clone(), gateway.timeout_ms)?);
    let addr = format!("{}:{}", gateway.address, gateway.port);
    log::info!("Gateway listening on {}", addr);

    HttpServer::new(move || {
        App::new()
            .app_data(proxy.clone())
            // Uploads pass through untouched
            .app_data(web::PayloadConfig::new(64 * 1024 * 1024))
            .wrap(Logger::default())
            .wrap(Cors::permissive())
            .route("/health", web::get().to(health))
            .default_service(web::to(forward))
    })
    .bind(&addr)?
    .run()
    .await?;

    Ok(())
}
