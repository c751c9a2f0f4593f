//! Assignment token flows and their wire shapes.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use uuid::Uuid;
use wardkey_core::assignment::service::IssuedToken;
use wardkey_core::models::assignment::{AssignmentToken, Device};
use wardkey_core::models::auth::Principal;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{DeviceInfo, IssuedTokenResponse, TokenInfo};

/// Parse a UUID request field.
pub fn parse_id(field: &str, raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::Validation(format!("{field} must be a UUID, got '{raw}'")))
}

fn issued_response(issued: IssuedToken) -> IssuedTokenResponse {
    let IssuedToken {
        token,
        qr_image,
        qr_mime_type,
    } = issued;
    IssuedTokenResponse {
        token_type: token.token_type.to_string(),
        patient_id: token.patient_id.to_string(),
        device_id: token.device_id.map(|d| d.to_string()),
        expires_at: token.expires_at.to_rfc3339(),
        token: token.token,
        qr_image: STANDARD.encode(qr_image),
        qr_mime_type: qr_mime_type.to_string(),
    }
}

pub fn token_info(token: &AssignmentToken) -> TokenInfo {
    TokenInfo {
        token_type: token.token_type.to_string(),
        patient_id: token.patient_id.to_string(),
        device_id: token.device_id.map(|d| d.to_string()),
        expires_at: token.expires_at.to_rfc3339(),
        is_used: token.is_used,
        used_at: token.used_at.map(|t| t.to_rfc3339()),
    }
}

pub fn device_info(device: &Device) -> DeviceInfo {
    DeviceInfo {
        id: device.id.to_string(),
        mac_address: device.mac_address.clone(),
        patient_id: device.patient_id.map(|p| p.to_string()),
    }
}

pub async fn issue_patient_assignment(
    state: &AppState,
    issuer: &Principal,
    patient_id: &str,
    ttl_hours: u32,
) -> AppResult<IssuedTokenResponse> {
    if !issuer.role.can_assign_patients() {
        return Err(AppError::forbidden(format!(
            "role '{}' may not assign patients to devices",
            issuer.role
        )));
    }
    let patient_id = parse_id("patientId", patient_id)?;
    let issued = state
        .assignments
        .issue_patient_assignment_token(patient_id, ttl_hours)
        .await?;
    Ok(issued_response(issued))
}

pub async fn issue_prescription_info(
    state: &AppState,
    issuer: &Principal,
    patient_id: &str,
    device_id: &str,
    ttl_hours: u32,
) -> AppResult<IssuedTokenResponse> {
    if !issuer.role.can_share_prescriptions() {
        return Err(AppError::forbidden(format!(
            "role '{}' may not share prescription info",
            issuer.role
        )));
    }
    let patient_id = parse_id("patientId", patient_id)?;
    let device_id = parse_id("deviceId", device_id)?;
    let issued = state
        .assignments
        .issue_prescription_info_token(patient_id, device_id, ttl_hours)
        .await?;
    Ok(issued_response(issued))
}

pub async fn release_device(
    state: &AppState,
    caller: &Principal,
    device_mac: &str,
) -> AppResult<DeviceInfo> {
    if !caller.role.can_assign_patients() {
        return Err(AppError::forbidden(format!(
            "role '{}' may not release devices",
            caller.role
        )));
    }
    let device = state.assignments.release_device(device_mac).await?;
    Ok(device_info(&device))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_rejects_garbage() {
        assert!(matches!(
            parse_id("patientId", "P1"),
            Err(AppError::Validation(_))
        ));
        let id = Uuid::new_v4();
        assert_eq!(parse_id("patientId", &format!(" {id} ")).unwrap(), id);
    }
}
