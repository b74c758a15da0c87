// src/config/logging.rs
// DOCUMENTATION: Logger initialization shared by every binary

/// Initialize env_logger; RUST_LOG wins over the configured level
pub fn init_logging(log_level: &str) {
    if std::env::var("RUST_LOG").is_err() {
        let level = if !log_level.is_empty() {
            log_level
        } else {
            "info,actix_web=info,sqlx=warn"
        };
        std::env::set_var("RUST_LOG", level);
    }
    env_logger::init();
}
