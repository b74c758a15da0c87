// src/main.rs
// DOCUMENTATION: Application entry point
// PURPOSE: Initialize config, database, email pipeline and start HTTP server

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use photo_gallery::config::{self, Config, ServiceKind};
use photo_gallery::handlers;
use photo_gallery::services::email::{
    run_channel_consumer, ChannelEmailQueue, KafkaEmailQueue, Mailer, SharedEmailQueue, SmtpMailer,
};
use photo_gallery::services::{
    start_cleanup_task, LoginRateLimiter, SearchCache, StorageClient, StorageService,
};
use std::sync::Arc;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration (also reads .env)
    let config = Config::from_env();

    // 2. Initialize logging
    config::init_logging(&config.log_level);

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    let names: Vec<&str> = config.services.iter().map(|s| s.as_str()).collect();
    log::info!("Starting photo-gallery services: {}", names.join(","));
    log::info!("Environment: {}", config.environment);
    log::info!(
        "Server Address: {}:{}",
        config.server_address,
        config.server_port
    );

    // 3. Initialize database connection pool
    let pool = config::init_db_pool(&config)
        .await
        .context("Failed to connect to database")?;

    // 4. Email queue: Kafka when configured, otherwise an in-process channel
    //    drained by a local worker
    let queue: SharedEmailQueue = if config.kafka_broker.is_empty() {
        let (queue, receiver) = ChannelEmailQueue::channel();
        let mailer: Arc<dyn Mailer> = Arc::new(SmtpMailer::from_config(&config)?);
        tokio::spawn(run_channel_consumer(receiver, mailer));
        Arc::new(queue)
    } else {
        Arc::new(KafkaEmailQueue::new(&config.kafka_broker, &config.email_topic)?)
    };

    // 5. Search cache with periodic cleanup
    let cache = Arc::new(SearchCache::new(config.search_cache_ttl_secs));
    start_cleanup_task(cache.clone(), config.search_cache_ttl_secs.max(30));

    let storage = StorageService::from_config(&config);
    let storage_client = StorageClient::new(&config.storage_service_url);
    let limiter = web::Data::new(LoginRateLimiter::new(config.login_rate_per_minute));

    // 6. Start HTTP server
    let server_addr = format!("{}:{}", config.server_address, config.server_port);
    let config_clone = config.clone();

    HttpServer::new(move || {
        let config = config_clone.clone();
        let mut app = App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(queue.clone()))
            .app_data(web::Data::new(cache.clone()))
            .app_data(web::Data::new(storage.clone()))
            .app_data(web::Data::new(storage_client.clone()))
            .app_data(limiter.clone())
            .wrap(Logger::default())
            .wrap(actix_web::middleware::Compress::default())
            .wrap(Cors::permissive())
            .configure(handlers::health_config);

        if config.is_enabled(ServiceKind::Auth) {
            app = app.configure(handlers::auth_config);
        }
        if config.is_enabled(ServiceKind::Gallery) {
            app = app
                .configure(handlers::galleries_config)
                .configure(handlers::images_config)
                .configure(handlers::access_config);
        }
        if config.is_enabled(ServiceKind::Storage) {
            app = app.configure(handlers::storage_config);
        }
        if config.is_enabled(ServiceKind::Search) {
            app = app.configure(handlers::metadata_config);
        }
        if config.is_enabled(ServiceKind::Email) {
            app = app.configure(handlers::email_config);
        }
        app
    })
    .bind(&server_addr)?
    .run()
    .await?;

    Ok(())
}
