//! Session token signing secret.

use std::fmt;
use std::sync::Arc;

use rand::distr::Alphanumeric;
use rand::{Rng, rng};

use super::ConfigError;

/// Environment variables consulted for the secret, in order.
pub const SECRET_ENV_VARS: [&str; 2] = ["SESSION_SIGNING_SECRET", "JWT_SECRET"];

/// Shortest secret accepted for HS256 signing.
pub const MIN_SECRET_LEN: usize = 32;

/// Process-wide HMAC secret. Immutable once loaded; rotating it invalidates
/// every outstanding session token.
#[derive(Clone)]
pub struct SigningSecret(Arc<[u8]>);

impl SigningSecret {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, ConfigError> {
        let bytes = bytes.into();
        if bytes.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Invalid {
                key: SECRET_ENV_VARS[0].to_string(),
                reason: format!("must be at least {MIN_SECRET_LEN} bytes"),
            });
        }
        Ok(Self(bytes.into()))
    }

    /// Resolve the secret: `SESSION_SIGNING_SECRET` → `JWT_SECRET`.
    ///
    /// There is no fallback; a missing secret is a startup error.
    pub fn from_env() -> Result<Self, ConfigError> {
        for key in SECRET_ENV_VARS {
            if let Ok(secret) = std::env::var(key)
                && !secret.is_empty()
            {
                return Self::new(secret);
            }
        }
        Err(ConfigError::Missing(SECRET_ENV_VARS.join(" or ")))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret(<redacted>)")
    }
}

/// Generate a random alphanumeric secret suitable for `SESSION_SIGNING_SECRET`.
pub fn generate_secret(len: usize) -> String {
    rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
