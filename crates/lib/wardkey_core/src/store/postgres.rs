//! Postgres-backed store, delegating to the `queries` modules.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    AssignmentTokenStore, CredentialStore, DeviceStore, PatientStore, PrincipalStore, Redemption,
    StoreError,
};
use crate::assignment::queries as assignment_queries;
use crate::auth::queries as auth_queries;
use crate::models::assignment::{AssignmentToken, Device, Patient};
use crate::models::auth::{Credential, Principal};

/// All stores over one connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn find_by_uid(&self, uid: &str) -> Result<Option<Credential>, StoreError> {
        auth_queries::find_credential_by_uid(&self.pool, uid).await
    }

    async fn touch_last_used(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError> {
        auth_queries::touch_credential(&self.pool, id, at).await
    }
}

#[async_trait]
impl PrincipalStore for PgStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Principal>, StoreError> {
        auth_queries::find_principal_by_id(&self.pool, id).await
    }
}

#[async_trait]
impl PatientStore for PgStore {
    async fn find_patient_by_id(&self, id: Uuid) -> Result<Option<Patient>, StoreError> {
        assignment_queries::find_patient_by_id(&self.pool, id).await
    }
}

#[async_trait]
impl DeviceStore for PgStore {
    async fn find_device_by_id(&self, id: Uuid) -> Result<Option<Device>, StoreError> {
        assignment_queries::find_device_by_id(&self.pool, id).await
    }

    async fn find_device_by_mac(&self, mac: &str) -> Result<Option<Device>, StoreError> {
        assignment_queries::find_device_by_mac(&self.pool, mac).await
    }

    async fn update_device(&self, device: &Device) -> Result<(), StoreError> {
        assignment_queries::update_device(&self.pool, device).await
    }
}

#[async_trait]
impl AssignmentTokenStore for PgStore {
    async fn insert_token(&self, token: &AssignmentToken) -> Result<(), StoreError> {
        assignment_queries::insert_token(&self.pool, token).await
    }

    async fn find_token(&self, token: &str) -> Result<Option<AssignmentToken>, StoreError> {
        assignment_queries::find_token(&self.pool, token).await
    }

    async fn consume_and_assign(
        &self,
        token: &str,
        device_id: Uuid,
        patient_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Redemption, StoreError> {
        assignment_queries::consume_and_assign(&self.pool, token, device_id, patient_id, now).await
    }
}
