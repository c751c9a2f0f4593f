//! API server configuration.

use chrono::Duration;
use wardkey_core::auth::jwt::DEFAULT_SESSION_TTL_SECS;
use wardkey_core::config::{ConfigError, SigningSecret, TokenPolicy, env_parse};

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3100").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub pg_connection_url: String,
    /// Session token signing secret.
    pub signing_secret: SigningSecret,
    /// Session token lifetime in seconds.
    pub session_ttl_secs: i64,
    /// Upper bounds on assignment token lifetimes.
    pub token_policy: TokenPolicy,
    /// Report which cascade step denied a card (`false` collapses every
    /// denial to a plain 401).
    pub expose_auth_failure_reasons: bool,
}

impl ApiConfig {
    /// Reads configuration from environment variables.
    ///
    /// | Variable                            | Default                          |
    /// |-------------------------------------|----------------------------------|
    /// | `BIND_ADDR`                         | `127.0.0.1:3100`                 |
    /// | `DATABASE_URL`                      | `postgres://localhost:5432/wardkey` |
    /// | `SESSION_SIGNING_SECRET` / `JWT_SECRET` | required                     |
    /// | `SESSION_TOKEN_TTL_SECS`            | `3600`                           |
    /// | `MAX_PATIENT_ASSIGNMENT_TTL_HOURS`  | `168`                            |
    /// | `MAX_PRESCRIPTION_INFO_TTL_HOURS`   | `720`                            |
    /// | `AUTH_EXPOSE_FAILURE_REASONS`       | `true`                           |
    pub fn from_env() -> Result<Self, ConfigError> {
        let session_ttl_secs =
            env_parse::<i64>("SESSION_TOKEN_TTL_SECS")?.unwrap_or(DEFAULT_SESSION_TTL_SECS);
        if session_ttl_secs <= 0 {
            return Err(ConfigError::Invalid {
                key: "SESSION_TOKEN_TTL_SECS".into(),
                reason: "must be positive".into(),
            });
        }

        Ok(Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3100".into()),
            pg_connection_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/wardkey".into()),
            signing_secret: SigningSecret::from_env()?,
            session_ttl_secs,
            token_policy: TokenPolicy::from_env()?,
            expose_auth_failure_reasons: env_parse::<bool>("AUTH_EXPOSE_FAILURE_REASONS")?
                .unwrap_or(true),
        })
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::seconds(self.session_ttl_secs)
    }
}
