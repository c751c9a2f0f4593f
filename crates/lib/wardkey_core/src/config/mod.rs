//! Configuration module: signing secret and token policy.
//!
//! Everything here is loaded once at startup and then shared read-only.

pub mod policy;
pub mod secret;

use std::str::FromStr;

use thiserror::Error;

pub use policy::TokenPolicy;
pub use secret::SigningSecret;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    Missing(String),

    #[error("Invalid setting {key}: {reason}")]
    Invalid { key: String, reason: String },
}

/// Read and parse an optional environment variable. Unset or blank is `None`.
pub fn env_parse<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => {
            raw.trim()
                .parse()
                .map(Some)
                .map_err(|e: T::Err| ConfigError::Invalid {
                    key: key.to_string(),
                    reason: e.to_string(),
                })
        }
        _ => Ok(None),
    }
}
