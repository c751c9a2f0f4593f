//! Storage seams.
//!
//! The credential, principal, patient and device stores belong to the wider
//! hospital system; this crate only needs the narrow lookups below. Two
//! implementations ship: [`postgres::PgStore`] and [`memory::MemoryStore`].

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::assignment::{AssignmentToken, Device, Patient};
use crate::models::auth::{Credential, Principal};

/// Infrastructure errors. Anything here is unexpected.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Outcome of [`AssignmentTokenStore::consume_and_assign`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redemption {
    /// The token is now used and the device carries its patient.
    Claimed,
    /// Already used, expired, not a patient-assignment token, or gone.
    TokenUnavailable,
    /// The device row no longer exists.
    DeviceMissing,
}

/// Physical card records.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_uid(&self, uid: &str) -> Result<Option<Credential>, StoreError>;

    async fn touch_last_used(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError>;
}

/// Authenticatable principals.
#[async_trait]
pub trait PrincipalStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Principal>, StoreError>;
}

#[async_trait]
pub trait PatientStore: Send + Sync {
    async fn find_patient_by_id(&self, id: Uuid) -> Result<Option<Patient>, StoreError>;
}

#[async_trait]
pub trait DeviceStore: Send + Sync {
    async fn find_device_by_id(&self, id: Uuid) -> Result<Option<Device>, StoreError>;

    /// `mac` is already normalised.
    async fn find_device_by_mac(&self, mac: &str) -> Result<Option<Device>, StoreError>;

    async fn update_device(&self, device: &Device) -> Result<(), StoreError>;
}

/// Persistence for assignment tokens.
#[async_trait]
pub trait AssignmentTokenStore: Send + Sync {
    async fn insert_token(&self, token: &AssignmentToken) -> Result<(), StoreError>;

    async fn find_token(&self, token: &str) -> Result<Option<AssignmentToken>, StoreError>;

    /// Atomically mark an unused, unexpired patient-assignment token as used
    /// at `now` and bind `patient_id` to `device_id`.
    ///
    /// Anything but [`Redemption::Claimed`] leaves both rows untouched. Of
    /// any number of concurrent calls for the same token, at most one
    /// returns `Claimed`.
    async fn consume_and_assign(
        &self,
        token: &str,
        device_id: Uuid,
        patient_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Redemption, StoreError>;
}

/// All stores the core needs, as shared trait objects.
#[derive(Clone)]
pub struct Stores {
    pub credentials: Arc<dyn CredentialStore>,
    pub principals: Arc<dyn PrincipalStore>,
    pub patients: Arc<dyn PatientStore>,
    pub devices: Arc<dyn DeviceStore>,
    pub tokens: Arc<dyn AssignmentTokenStore>,
}

impl Stores {
    /// Every store backed by the same Postgres pool.
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self::from_shared(Arc::new(postgres::PgStore::new(pool)))
    }

    /// Every store backed by one in-memory instance.
    pub fn memory(store: Arc<memory::MemoryStore>) -> Self {
        Self::from_shared(store)
    }

    fn from_shared<S>(store: Arc<S>) -> Self
    where
        S: CredentialStore
            + PrincipalStore
            + PatientStore
            + DeviceStore
            + AssignmentTokenStore
            + 'static,
    {
        Self {
            credentials: store.clone(),
            principals: store.clone(),
            patients: store.clone(),
            devices: store.clone(),
            tokens: store,
        }
    }
}
