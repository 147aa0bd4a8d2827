//! API route modules.

pub mod files;
pub mod health;
pub mod posts;
pub mod user;
