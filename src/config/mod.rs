// src/config/mod.rs
// DOCUMENTATION: Configuration module organization
// PURPOSE: Re-export configuration components

pub mod db;
pub mod env;
pub mod logging;

pub use db::init_db_pool;
pub use env::{default_routes, parse_services, Config, GatewayConfig, ServiceKind};
pub use logging::init_logging;
