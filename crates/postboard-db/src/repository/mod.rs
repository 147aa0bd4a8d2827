//! Repository layer — query functions organized by domain.

pub mod posts;
pub mod users;
