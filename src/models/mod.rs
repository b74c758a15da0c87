// src/models/mod.rs
// DOCUMENTATION: Models module organization
// PURPOSE: Re-export model components

pub mod access;
pub mod email;
pub mod gallery;
pub mod gallery_image;
pub mod metadata;
pub mod user;

pub use access::*;
pub use email::*;
pub use gallery::*;
pub use gallery_image::*;
pub use metadata::*;
pub use user::*;
