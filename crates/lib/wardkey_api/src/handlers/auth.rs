//! Authentication request handlers.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::{Extension, Json};

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedPrincipal;
use crate::models::{CardLoginRequest, CardLoginResponse, PrincipalInfo};
use crate::services::auth;

/// `POST /api/auth/card`: authenticate with a scanned card UID.
pub async fn card_login_handler(
    State(state): State<AppState>,
    body: Result<Json<CardLoginRequest>, JsonRejection>,
) -> AppResult<Json<CardLoginResponse>> {
    let Json(body) = body?;
    let resp = auth::card_login(&state, &body.card_uid).await?;
    Ok(Json(resp))
}

/// `GET /api/auth/me`: the principal behind the bearer token.
pub async fn me_handler(
    Extension(AuthenticatedPrincipal(principal)): Extension<AuthenticatedPrincipal>,
) -> Json<PrincipalInfo> {
    Json(auth::principal_info(&principal))
}
