//! Bedside assignment tokens.
//!
//! A clinician issues a short-lived token (rendered as a QR code); a bedside
//! device later redeems it to bind itself to the patient, or reads it to
//! fetch prescription info.

pub mod qr;
pub mod queries;
pub mod service;
pub mod token;

use thiserror::Error;

use crate::models::assignment::TokenType;
use crate::store::StoreError;

/// Assignment token errors.
#[derive(Debug, Error)]
pub enum AssignmentError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Device not found")]
    DeviceNotFound,

    #[error("Token not found")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token has already been used")]
    TokenAlreadyUsed,

    #[error("Expected a {expected} token, got {actual}")]
    WrongTokenType {
        expected: TokenType,
        actual: TokenType,
    },

    #[error("QR encoding failed: {0}")]
    QrEncoding(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}
