//! Domain models shared between the database layer and the API.
//!
//! These are the "truth" types: what the database stores and the API serializes.
//! Records are keyed by UUID v7, see [`crate::snowflake`].

pub mod post;
pub mod user;

pub use post::*;
pub use user::*;
