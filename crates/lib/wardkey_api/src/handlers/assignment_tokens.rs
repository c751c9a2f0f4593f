//! Assignment token request handlers.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::{Extension, Json};

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedPrincipal;
use crate::models::{
    DeviceInfo, IssuePatientAssignmentRequest, IssuePrescriptionInfoRequest, IssuedTokenResponse,
    RedeemRequest, TokenInfo, TokenRequest,
};
use crate::services::assignment;

/// `POST /api/assignment-tokens/patient-assignment`: issue a single-use
/// token (and QR code) that binds a patient to the device that redeems it.
pub async fn issue_patient_assignment_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedPrincipal(caller)): Extension<AuthenticatedPrincipal>,
    body: Result<Json<IssuePatientAssignmentRequest>, JsonRejection>,
) -> AppResult<Json<IssuedTokenResponse>> {
    let Json(body) = body?;
    let resp =
        assignment::issue_patient_assignment(&state, &caller, &body.patient_id, body.ttl_hours)
            .await?;
    Ok(Json(resp))
}

/// `POST /api/assignment-tokens/prescription-info`: issue a re-readable
/// prescription-info token for a device.
pub async fn issue_prescription_info_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedPrincipal(caller)): Extension<AuthenticatedPrincipal>,
    body: Result<Json<IssuePrescriptionInfoRequest>, JsonRejection>,
) -> AppResult<Json<IssuedTokenResponse>> {
    let Json(body) = body?;
    let resp = assignment::issue_prescription_info(
        &state,
        &caller,
        &body.patient_id,
        &body.device_id,
        body.ttl_hours,
    )
    .await?;
    Ok(Json(resp))
}

/// `POST /api/assignment-tokens/validate`: check a token without using it.
pub async fn validate_token_handler(
    State(state): State<AppState>,
    body: Result<Json<TokenRequest>, JsonRejection>,
) -> AppResult<Json<TokenInfo>> {
    let Json(body) = body?;
    let record = state.assignments.validate_token(&body.token).await?;
    Ok(Json(assignment::token_info(&record)))
}

/// `POST /api/assignment-tokens/redeem`: a device claims a patient-assignment token.
pub async fn redeem_handler(
    State(state): State<AppState>,
    body: Result<Json<RedeemRequest>, JsonRejection>,
) -> AppResult<Json<DeviceInfo>> {
    let Json(body) = body?;
    let device = state
        .assignments
        .redeem_patient_assignment(&body.token, &body.device_mac)
        .await?;
    Ok(Json(assignment::device_info(&device)))
}

/// `POST /api/assignment-tokens/prescription-info/read`: a device reads a
/// prescription-info token. The token stays valid until it expires.
pub async fn read_prescription_info_handler(
    State(state): State<AppState>,
    body: Result<Json<TokenRequest>, JsonRejection>,
) -> AppResult<Json<TokenInfo>> {
    let Json(body) = body?;
    let record = state.assignments.read_prescription_info(&body.token).await?;
    Ok(Json(assignment::token_info(&record)))
}
