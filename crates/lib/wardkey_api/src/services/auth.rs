//! Card login: resolve the card, then sign a session token.

use wardkey_core::auth::AuthError;
use wardkey_core::models::auth::Principal;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{CardLoginResponse, PrincipalInfo};

pub fn principal_info(principal: &Principal) -> PrincipalInfo {
    PrincipalInfo {
        id: principal.id.to_string(),
        display_name: principal.display_name.clone(),
        role: principal.role.to_string(),
    }
}

/// Map a cascade failure, collapsing denial reasons when configured to.
fn login_error(e: AuthError, expose_reasons: bool) -> AppError {
    match e {
        AuthError::EmptyCardUid => AppError::from(e),
        e if e.is_denial() && !expose_reasons => AppError::unauthorized("Authentication failed"),
        e => AppError::from(e),
    }
}

/// Authenticate a scanned card and issue a session token.
pub async fn card_login(state: &AppState, card_uid: &str) -> AppResult<CardLoginResponse> {
    let principal = state
        .resolver
        .authenticate(card_uid)
        .await
        .map_err(|e| login_error(e, state.config.expose_auth_failure_reasons))?;

    let session = state.issuer.issue(&principal)?;

    Ok(CardLoginResponse {
        principal: principal_info(&principal),
        access_token: session.token,
        token_type: "Bearer".to_string(),
        expires_in: (session.expires_at - session.issued_at).num_seconds(),
        expires_at: session.expires_at.to_rfc3339(),
    })
}
