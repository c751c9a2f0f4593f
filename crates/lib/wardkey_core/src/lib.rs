//! # wardkey_core
//!
//! Core domain logic for Wardkey: card authentication, session tokens and
//! bedside assignment tokens.

pub mod assignment;
pub mod auth;
pub mod clock;
pub mod config;
pub mod migrate;
pub mod models;
pub mod store;
pub mod uuid;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_not_empty() {
        assert!(!version().is_empty());
    }
}
