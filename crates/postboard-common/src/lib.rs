//! # postboard-common
//!
//! Shared types, configuration, error handling, and utilities used across all Postboard crates.
//! No business logic lives here, only primitives and contracts.

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod snowflake;
pub mod validation;
