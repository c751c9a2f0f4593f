//! # wardkey_api
//!
//! HTTP API library for Wardkey.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use wardkey_core::assignment::qr::PngQrEncoder;
use wardkey_core::assignment::service::AssignmentTokenService;
use wardkey_core::auth::jwt::SessionTokenIssuer;
use wardkey_core::auth::resolver::AuthResolver;
use wardkey_core::clock::{Clock, SystemClock};
use wardkey_core::store::{PrincipalStore, Stores};

use crate::config::ApiConfig;
use crate::handlers::{assignment_tokens, auth, devices, health};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: ApiConfig,
    pub resolver: AuthResolver,
    pub issuer: Arc<SessionTokenIssuer>,
    pub assignments: AssignmentTokenService,
    /// Consulted on every authenticated request.
    pub principals: Arc<dyn PrincipalStore>,
}

impl AppState {
    /// Wire the services over `stores` with the given clock.
    pub fn new(stores: Stores, config: ApiConfig, clock: Arc<dyn Clock>) -> Self {
        let resolver = AuthResolver::new(
            stores.credentials.clone(),
            stores.principals.clone(),
            clock.clone(),
        );
        let issuer = Arc::new(SessionTokenIssuer::new(
            &config.signing_secret,
            config.session_ttl(),
            clock.clone(),
        ));
        let assignments = AssignmentTokenService::new(
            &stores,
            Arc::new(PngQrEncoder::default()),
            config.token_policy,
            clock,
        );
        Self {
            principals: stores.principals,
            config,
            resolver,
            issuer,
            assignments,
        }
    }

    /// Production wiring: Postgres stores and the system clock.
    pub fn from_pool(pool: PgPool, config: ApiConfig) -> Self {
        Self::new(Stores::postgres(pool), config, Arc::new(SystemClock))
    }
}

/// Run embedded database migrations.
///
/// Delegates to `wardkey_core::migrate::migrate()` which owns the migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    wardkey_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes: card scanners and bedside devices.
    let public = Router::new()
        .route(routes::GET_API_HEALTH, get(health::health_handler))
        .route(routes::POST_AUTH_CARD, post(auth::card_login_handler))
        .route(
            routes::POST_ASSIGNMENT_TOKENS_VALIDATE,
            post(assignment_tokens::validate_token_handler),
        )
        .route(
            routes::POST_ASSIGNMENT_TOKENS_REDEEM,
            post(assignment_tokens::redeem_handler),
        )
        .route(
            routes::POST_ASSIGNMENT_TOKENS_PRESCRIPTION_INFO_READ,
            post(assignment_tokens::read_prescription_info_handler),
        );

    // Protected routes: staff with a session token.
    let protected = Router::new()
        .route(routes::GET_AUTH_ME, get(auth::me_handler))
        .route(
            routes::POST_ASSIGNMENT_TOKENS_PATIENT_ASSIGNMENT,
            post(assignment_tokens::issue_patient_assignment_handler),
        )
        .route(
            routes::POST_ASSIGNMENT_TOKENS_PRESCRIPTION_INFO,
            post(assignment_tokens::issue_prescription_info_handler),
        )
        .route(
            routes::DELETE_DEVICES_MAC_PATIENT,
            delete(devices::release_device_handler),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(cors)
        .with_state(state)
}
