//! Services mapping domain results onto wire DTOs.

pub mod assignment;
pub mod auth;
