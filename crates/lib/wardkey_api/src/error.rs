//! Application error types.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;
use wardkey_core::assignment::AssignmentError;
use wardkey_core::auth::AuthError;
use wardkey_core::store::StoreError;

use crate::models::ErrorResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
///
/// `code` is the machine-readable `error` field of the JSON body.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {message}")]
    NotFound { code: &'static str, message: String },

    #[error("Unauthorized: {message}")]
    Unauthorized { code: &'static str, message: String },

    #[error("Forbidden: {message}")]
    Forbidden { code: &'static str, message: String },

    /// A token that exists but may not be used in its current state.
    #[error("Rejected: {message}")]
    Rejected { code: &'static str, message: String },

    #[error("Database unavailable: {0}")]
    DbUnavailable(String),

    #[error("Internal server error")]
    Internal(String),
}

impl AppError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        AppError::Unauthorized {
            code: "unauthorized",
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        AppError::Forbidden {
            code: "forbidden",
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(m) => (StatusCode::BAD_REQUEST, "validation_error", m.as_str()),
            AppError::NotFound { code, message } => {
                (StatusCode::NOT_FOUND, *code, message.as_str())
            }
            AppError::Unauthorized { code, message } => {
                (StatusCode::UNAUTHORIZED, *code, message.as_str())
            }
            AppError::Forbidden { code, message } => {
                (StatusCode::FORBIDDEN, *code, message.as_str())
            }
            AppError::Rejected { code, message } => {
                (StatusCode::BAD_REQUEST, *code, message.as_str())
            }
            AppError::DbUnavailable(m) => {
                (StatusCode::SERVICE_UNAVAILABLE, "db_unavailable", m.as_str())
            }
            AppError::Internal(detail) => {
                error!(%detail, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error",
                )
            }
        };
        let body = Json(ErrorResponse {
            error: code.to_string(),
            message: message.to_string(),
        });
        (status, body).into_response()
    }
}

/// Malformed, mistyped or incomplete JSON bodies.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DbError(sqlx::Error::PoolTimedOut) => {
                AppError::DbUnavailable("connection pool timed out".into())
            }
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        let message = e.to_string();
        match e {
            AuthError::EmptyCardUid => AppError::Validation(message),
            AuthError::CredentialNotFound => AppError::NotFound {
                code: "credential_not_found",
                message,
            },
            AuthError::CredentialInactive => AppError::Forbidden {
                code: "credential_inactive",
                message,
            },
            AuthError::OwningPrincipalMissing => AppError::Unauthorized {
                code: "principal_missing",
                message,
            },
            AuthError::PrincipalInactive => AppError::Forbidden {
                code: "principal_inactive",
                message,
            },
            AuthError::InvalidToken(_) => AppError::unauthorized("Invalid or expired token"),
            AuthError::Store(e) => AppError::from(e),
            AuthError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<AssignmentError> for AppError {
    fn from(e: AssignmentError) -> Self {
        let message = e.to_string();
        match e {
            AssignmentError::InvalidInput(msg) => AppError::Validation(msg),
            AssignmentError::PatientNotFound => AppError::NotFound {
                code: "patient_not_found",
                message,
            },
            AssignmentError::DeviceNotFound => AppError::NotFound {
                code: "device_not_found",
                message,
            },
            AssignmentError::InvalidToken => AppError::NotFound {
                code: "invalid_token",
                message,
            },
            AssignmentError::TokenExpired => AppError::Rejected {
                code: "token_expired",
                message,
            },
            AssignmentError::TokenAlreadyUsed => AppError::Rejected {
                code: "token_already_used",
                message,
            },
            AssignmentError::WrongTokenType { .. } => AppError::Rejected {
                code: "wrong_token_type",
                message,
            },
            AssignmentError::QrEncoding(msg) => AppError::Internal(msg),
            AssignmentError::Store(e) => AppError::from(e),
        }
    }
}
