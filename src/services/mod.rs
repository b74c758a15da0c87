// src/services/mod.rs
// DOCUMENTATION: Services module organization
// PURPOSE: Re-export service components

pub mod access_service;
pub mod auth_service;
pub mod cache;
pub mod email;
pub mod gallery_service;
pub mod image_service;
pub mod metadata_service;
pub mod proxy;
pub mod security;
pub mod storage;
pub mod storage_client;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use access_service::{AccessService, Permissions};
pub use auth_service::AuthService;
pub use cache::{start_cleanup_task, SearchCache, TtlCache};
pub use gallery_service::GalleryService;
pub use image_service::{ImageService, IncomingFile};
pub use metadata_service::MetadataService;
pub use proxy::Proxy;
pub use security::{authenticate, Claims, LoginRateLimiter};
pub use storage::{OutputFormat, StorageService};
pub use storage_client::StorageClient;
