//! Device request handlers.

use axum::extract::{Path, State};
use axum::{Extension, Json};

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedPrincipal;
use crate::models::DeviceInfo;
use crate::services::assignment;

/// `DELETE /api/devices/{mac}/patient`: unbind the device's patient.
pub async fn release_device_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedPrincipal(caller)): Extension<AuthenticatedPrincipal>,
    Path(mac): Path<String>,
) -> AppResult<Json<DeviceInfo>> {
    let resp = assignment::release_device(&state, &caller, &mac).await?;
    Ok(Json(resp))
}
