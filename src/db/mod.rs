// src/db/mod.rs
// DOCUMENTATION: Database module organization
// PURPOSE: Re-export repository components

pub mod access_repository;
pub mod gallery_repository;
pub mod image_repository;
pub mod metadata_repository;
pub mod user_repository;

pub use access_repository::*;
pub use gallery_repository::*;
pub use image_repository::*;
pub use metadata_repository::*;
pub use user_repository::*;
