//! Domain models.
//!
//! These are internal domain models, distinct from the wire DTOs in
//! `wardkey_api` (which carry `#[serde(rename)]` for camelCase etc.).

pub mod assignment;
pub mod auth;
