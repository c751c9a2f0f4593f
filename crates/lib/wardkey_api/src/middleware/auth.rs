//! Authentication middleware: Bearer token extraction and session verification.

use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;
use wardkey_core::models::auth::Principal;

use crate::AppState;
use crate::error::AppError;

/// The verified caller, stored in request extensions.
#[derive(Debug, Clone)]
pub struct AuthenticatedPrincipal(pub Principal);

/// Axum middleware: extracts `Authorization: Bearer <token>`, verifies it,
/// reloads the principal and injects `AuthenticatedPrincipal`.
///
/// The principal is reloaded on every request so that deactivating an
/// account revokes its outstanding session tokens.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::unauthorized("Missing authorization header"))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::unauthorized("Invalid authorization scheme"))?;

    let claims = state.issuer.verify(token)?;

    let principal = state
        .principals
        .find_by_id(claims.sub)
        .await?
        .filter(|p| p.active)
        .ok_or_else(|| {
            debug!(principal_id = %claims.sub, "session token for missing or inactive principal");
            AppError::unauthorized("Invalid or expired token")
        })?;

    request
        .extensions_mut()
        .insert(AuthenticatedPrincipal(principal));

    Ok(next.run(request).await)
}
