//! Assignment token lifetime policy.

use serde::{Deserialize, Serialize};

use super::{ConfigError, env_parse};
use crate::models::assignment::TokenType;

/// Default cap for patient-assignment tokens: one week.
pub const DEFAULT_MAX_PATIENT_ASSIGNMENT_TTL_HOURS: u32 = 168;

/// Default cap for prescription-info tokens: thirty days.
pub const DEFAULT_MAX_PRESCRIPTION_INFO_TTL_HOURS: u32 = 720;

/// Upper bounds on caller-supplied token lifetimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPolicy {
    pub max_patient_assignment_ttl_hours: u32,
    pub max_prescription_info_ttl_hours: u32,
}

impl TokenPolicy {
    /// Defaults overridden by `MAX_PATIENT_ASSIGNMENT_TTL_HOURS` and
    /// `MAX_PRESCRIPTION_INFO_TTL_HOURS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let policy = Self {
            max_patient_assignment_ttl_hours: env_parse("MAX_PATIENT_ASSIGNMENT_TTL_HOURS")?
                .unwrap_or(defaults.max_patient_assignment_ttl_hours),
            max_prescription_info_ttl_hours: env_parse("MAX_PRESCRIPTION_INFO_TTL_HOURS")?
                .unwrap_or(defaults.max_prescription_info_ttl_hours),
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            (
                "MAX_PATIENT_ASSIGNMENT_TTL_HOURS",
                self.max_patient_assignment_ttl_hours,
            ),
            (
                "MAX_PRESCRIPTION_INFO_TTL_HOURS",
                self.max_prescription_info_ttl_hours,
            ),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    key: key.to_string(),
                    reason: "must be at least 1".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn max_ttl_hours(&self, token_type: TokenType) -> u32 {
        match token_type {
            TokenType::PatientAssignment => self.max_patient_assignment_ttl_hours,
            TokenType::PrescriptionInfo => self.max_prescription_info_ttl_hours,
        }
    }

    /// Check a requested lifetime against the bound for `token_type`.
    pub fn check_ttl(&self, token_type: TokenType, ttl_hours: u32) -> Result<(), String> {
        let max = self.max_ttl_hours(token_type);
        if ttl_hours == 0 || ttl_hours > max {
            return Err(format!(
                "ttlHours for {token_type} tokens must be between 1 and {max}, got {ttl_hours}"
            ));
        }
        Ok(())
    }
}

impl Default for TokenPolicy {
    fn default() -> Self {
        Self {
            max_patient_assignment_ttl_hours: DEFAULT_MAX_PATIENT_ASSIGNMENT_TTL_HOURS,
            max_prescription_info_ttl_hours: DEFAULT_MAX_PRESCRIPTION_INFO_TTL_HOURS,
        }
    }
}
