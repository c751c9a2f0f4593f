//! Issue, validate and redeem assignment tokens.
//!
//! Token states: `Active` → `Used` (patient assignment only) and
//! `Active` → `Expired` (derived from the clock, never stored). Neither
//! `Used` nor `Expired` has an exit.

use std::sync::Arc;

use chrono::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use super::AssignmentError;
use super::qr::QrEncoder;
use super::token::{check_token_str, generate_token, normalize_mac};
use crate::clock::Clock;
use crate::config::TokenPolicy;
use crate::models::assignment::{AssignmentToken, Device, TokenType};
use crate::store::{AssignmentTokenStore, DeviceStore, PatientStore, Redemption, Stores};
use crate::uuid::uuidv7;

/// A freshly issued token together with its QR rendering.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: AssignmentToken,
    pub qr_image: Vec<u8>,
    pub qr_mime_type: &'static str,
}

/// Owns the assignment-token lifecycle.
#[derive(Clone)]
pub struct AssignmentTokenService {
    tokens: Arc<dyn AssignmentTokenStore>,
    patients: Arc<dyn PatientStore>,
    devices: Arc<dyn DeviceStore>,
    qr: Arc<dyn QrEncoder>,
    policy: TokenPolicy,
    clock: Arc<dyn Clock>,
}

impl AssignmentTokenService {
    pub fn new(
        stores: &Stores,
        qr: Arc<dyn QrEncoder>,
        policy: TokenPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            tokens: stores.tokens.clone(),
            patients: stores.patients.clone(),
            devices: stores.devices.clone(),
            qr,
            policy,
            clock,
        }
    }

    /// Issue a single-use token that binds `patient_id` to whichever device redeems it.
    pub async fn issue_patient_assignment_token(
        &self,
        patient_id: Uuid,
        ttl_hours: u32,
    ) -> Result<IssuedToken, AssignmentError> {
        self.issue(TokenType::PatientAssignment, patient_id, None, ttl_hours)
            .await
    }

    /// Issue a re-readable token exposing `patient_id`'s prescription info to `device_id`.
    pub async fn issue_prescription_info_token(
        &self,
        patient_id: Uuid,
        device_id: Uuid,
        ttl_hours: u32,
    ) -> Result<IssuedToken, AssignmentError> {
        if self.devices.find_device_by_id(device_id).await?.is_none() {
            return Err(AssignmentError::DeviceNotFound);
        }
        self.issue(
            TokenType::PrescriptionInfo,
            patient_id,
            Some(device_id),
            ttl_hours,
        )
        .await
    }

    async fn issue(
        &self,
        token_type: TokenType,
        patient_id: Uuid,
        device_id: Option<Uuid>,
        ttl_hours: u32,
    ) -> Result<IssuedToken, AssignmentError> {
        self.policy
            .check_ttl(token_type, ttl_hours)
            .map_err(AssignmentError::InvalidInput)?;

        if self.patients.find_patient_by_id(patient_id).await?.is_none() {
            return Err(AssignmentError::PatientNotFound);
        }

        let now = self.clock.now();
        let token = AssignmentToken {
            id: uuidv7(),
            token: generate_token(),
            token_type,
            patient_id,
            device_id,
            created_at: now,
            expires_at: now + Duration::hours(i64::from(ttl_hours)),
            is_used: false,
            used_at: None,
        };
        let qr_image = self.qr.encode(&token.token)?;
        self.tokens.insert_token(&token).await?;

        info!(
            token_id = %token.id,
            %token_type,
            %patient_id,
            expires_at = %token.expires_at,
            "assignment token issued"
        );
        Ok(IssuedToken {
            token,
            qr_image,
            qr_mime_type: self.qr.mime_type(),
        })
    }

    /// Check a presented token: exists, unexpired, and (if single-use) unused.
    pub async fn validate_token(&self, token: &str) -> Result<AssignmentToken, AssignmentError> {
        let token = check_token_str(token)?;
        let record = self
            .tokens
            .find_token(token)
            .await?
            .ok_or(AssignmentError::InvalidToken)?;

        if record.is_expired_at(self.clock.now()) {
            return Err(AssignmentError::TokenExpired);
        }
        if record.token_type.is_single_use() && record.is_used {
            return Err(AssignmentError::TokenAlreadyUsed);
        }
        Ok(record)
    }

    /// Bind the token's patient to the device with `device_mac`, consuming the token.
    ///
    /// Exactly one of any set of concurrent redemptions of the same token
    /// succeeds; the rest fail with `TokenAlreadyUsed`.
    pub async fn redeem_patient_assignment(
        &self,
        token: &str,
        device_mac: &str,
    ) -> Result<Device, AssignmentError> {
        let record = self.validate_token(token).await?;
        if record.token_type != TokenType::PatientAssignment {
            return Err(AssignmentError::WrongTokenType {
                expected: TokenType::PatientAssignment,
                actual: record.token_type,
            });
        }

        let mac = normalize_mac(device_mac)?;
        let mut device = self
            .devices
            .find_device_by_mac(&mac)
            .await?
            .ok_or(AssignmentError::DeviceNotFound)?;

        let outcome = self
            .tokens
            .consume_and_assign(&record.token, device.id, record.patient_id, self.clock.now())
            .await?;

        let reason = match outcome {
            Redemption::Claimed => None,
            // Deleted after the lookup above; the token is still unused.
            Redemption::DeviceMissing => Some(AssignmentError::DeviceNotFound),
            // Lost the race, or the token lapsed in between: report which.
            Redemption::TokenUnavailable => Some(match self.validate_token(&record.token).await {
                Err(e) => e,
                Ok(_) => AssignmentError::TokenAlreadyUsed,
            }),
        };
        if let Some(reason) = reason {
            warn!(token_id = %record.id, device_id = %device.id, %reason, "assignment token redemption refused");
            return Err(reason);
        }

        device.patient_id = Some(record.patient_id);
        info!(
            token_id = %record.id,
            device_id = %device.id,
            patient_id = %record.patient_id,
            "patient assigned to device"
        );
        Ok(device)
    }

    /// Return a prescription-info token's record. Never mutates it.
    pub async fn read_prescription_info(
        &self,
        token: &str,
    ) -> Result<AssignmentToken, AssignmentError> {
        let record = self.validate_token(token).await?;
        if record.token_type != TokenType::PrescriptionInfo {
            return Err(AssignmentError::WrongTokenType {
                expected: TokenType::PrescriptionInfo,
                actual: record.token_type,
            });
        }
        Ok(record)
    }

    /// Clear whatever patient is bound to the device with `device_mac`.
    pub async fn release_device(&self, device_mac: &str) -> Result<Device, AssignmentError> {
        let mac = normalize_mac(device_mac)?;
        let mut device = self
            .devices
            .find_device_by_mac(&mac)
            .await?
            .ok_or(AssignmentError::DeviceNotFound)?;

        if let Some(patient_id) = device.patient_id.take() {
            self.devices.update_device(&device).await?;
            info!(device_id = %device.id, %patient_id, "device released");
        }
        Ok(device)
    }
}
