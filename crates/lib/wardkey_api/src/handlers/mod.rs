//! Request handlers.

pub mod assignment_tokens;
pub mod auth;
pub mod devices;
pub mod health;
