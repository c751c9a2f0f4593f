//! Assignment token, patient and device models.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What an assignment token authorizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Binds a patient to the device that redeems it. Single use.
    PatientAssignment,
    /// Lets a device read a patient's prescription info. Re-readable until expiry.
    PrescriptionInfo,
}

impl TokenType {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenType::PatientAssignment => "patient_assignment",
            TokenType::PrescriptionInfo => "prescription_info",
        }
    }

    pub fn is_single_use(self) -> bool {
        matches!(self, TokenType::PatientAssignment)
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "patient_assignment" => Ok(TokenType::PatientAssignment),
            "prescription_info" => Ok(TokenType::PrescriptionInfo),
            other => Err(format!("unknown token type: {other}")),
        }
    }
}

/// Short-lived token binding a patient (and optionally a device) to one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentToken {
    pub id: Uuid,
    pub token: String,
    pub token_type: TokenType,
    pub patient_id: Uuid,
    pub device_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_used: bool,
    pub used_at: Option<DateTime<Utc>>,
}

impl AssignmentToken {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Usable iff unexpired and, for single-use types, not yet consumed.
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_expired_at(now) && !(self.token_type.is_single_use() && self.is_used)
    }
}

/// Patient reference. Everything else about a patient lives in the CRUD layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patient {
    pub id: Uuid,
    pub display_name: String,
}

/// Bedside device, addressed by its MAC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub id: Uuid,
    /// Normalised `AA:BB:CC:DD:EE:FF` form.
    pub mac_address: String,
    pub patient_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn token(token_type: TokenType, is_used: bool, expires_at: DateTime<Utc>) -> AssignmentToken {
        AssignmentToken {
            id: Uuid::nil(),
            token: "t".into(),
            token_type,
            patient_id: Uuid::nil(),
            device_id: None,
            created_at: expires_at - Duration::hours(1),
            expires_at,
            is_used,
            used_at: None,
        }
    }

    #[test]
    fn usable_until_expiry_boundary() {
        let t = Utc::now();
        let tok = token(TokenType::PatientAssignment, false, t);
        assert!(tok.is_usable_at(t - Duration::milliseconds(1)));
        assert!(!tok.is_usable_at(t));
        assert!(!tok.is_usable_at(t + Duration::seconds(1)));
    }

    #[test]
    fn used_patient_assignment_is_not_usable() {
        let t = Utc::now() + Duration::hours(1);
        assert!(!token(TokenType::PatientAssignment, true, t).is_usable_at(Utc::now()));
    }

    #[test]
    fn prescription_info_ignores_usage_flag() {
        let t = Utc::now() + Duration::hours(1);
        assert!(token(TokenType::PrescriptionInfo, true, t).is_usable_at(Utc::now()));
    }

    #[test]
    fn token_type_round_trips_through_str() {
        for tt in [TokenType::PatientAssignment, TokenType::PrescriptionInfo] {
            assert_eq!(tt.as_str().parse::<TokenType>(), Ok(tt));
        }
        assert!("refill".parse::<TokenType>().is_err());
    }
}
