//! Card authentication and session tokens.
//!
//! A scanned card UID is resolved to a principal by [`resolver::AuthResolver`];
//! [`jwt::SessionTokenIssuer`] then signs a bearer token for it.

pub mod jwt;
pub mod queries;
pub mod resolver;

use thiserror::Error;

use crate::store::StoreError;

/// Why a presented session token was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidTokenKind {
    #[error("malformed")]
    Malformed,

    #[error("bad signature")]
    BadSignature,

    #[error("expired")]
    Expired,
}

/// Authentication errors.
///
/// Every variant except `Store` and `Internal` is an expected, terminal
/// denial; none is retried.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Card UID must not be empty")]
    EmptyCardUid,

    #[error("Card not recognised")]
    CredentialNotFound,

    #[error("Card has been deactivated")]
    CredentialInactive,

    #[error("Card owner not found")]
    OwningPrincipalMissing,

    #[error("Account has been deactivated")]
    PrincipalInactive,

    #[error("Invalid token: {0}")]
    InvalidToken(InvalidTokenKind),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Whether this is a denial (as opposed to an infrastructure fault).
    pub fn is_denial(&self) -> bool {
        !matches!(self, AuthError::Store(_) | AuthError::Internal(_))
    }
}
