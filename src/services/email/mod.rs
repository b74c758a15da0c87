// src/services/email/mod.rs
// DOCUMENTATION: Email queue, consumer, mailer and templates

pub mod consumer;
pub mod mailer;
pub mod queue;
pub mod templates;

pub use consumer::*;
pub use mailer::*;
pub use queue::*;
pub use templates::*;
