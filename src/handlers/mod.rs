// src/handlers/mod.rs
// DOCUMENTATION: Handlers module organization
// PURPOSE: Re-export handler components

pub mod access;
pub mod auth;
pub mod email;
pub mod galleries;
pub mod health;
pub mod images;
pub mod metadata;
pub mod multipart;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_support;

pub use access::config as access_config;
pub use auth::config as auth_config;
pub use email::config as email_config;
pub use galleries::config as galleries_config;
pub use health::config as health_config;
pub use images::config as images_config;
pub use metadata::config as metadata_config;
pub use storage::config as storage_config;
