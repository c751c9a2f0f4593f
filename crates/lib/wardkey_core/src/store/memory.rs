//! In-memory store.
//!
//! One mutex guards every entity, so `consume_and_assign` sees and changes
//! the token and the device as a unit.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{
    AssignmentTokenStore, CredentialStore, DeviceStore, PatientStore, PrincipalStore, Redemption,
    StoreError,
};
use crate::models::assignment::{AssignmentToken, Device, Patient, TokenType};
use crate::models::auth::{Credential, Principal};

#[derive(Debug, Default)]
struct State {
    /// Keyed by card UID.
    credentials: HashMap<String, Credential>,
    principals: HashMap<Uuid, Principal>,
    patients: HashMap<Uuid, Patient>,
    devices: HashMap<Uuid, Device>,
    /// Keyed by token string.
    tokens: HashMap<String, AssignmentToken>,
}

/// Process-local store, for tests and demos.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // Every mutation below completes before the guard drops.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn insert_principal(&self, principal: Principal) {
        self.lock().principals.insert(principal.id, principal);
    }

    pub fn insert_credential(&self, credential: Credential) {
        self.lock()
            .credentials
            .insert(credential.uid.clone(), credential);
    }

    pub fn insert_patient(&self, patient: Patient) {
        self.lock().patients.insert(patient.id, patient);
    }

    pub fn insert_device(&self, device: Device) {
        self.lock().devices.insert(device.id, device);
    }

    pub fn set_principal_active(&self, id: Uuid, active: bool) {
        if let Some(p) = self.lock().principals.get_mut(&id) {
            p.active = active;
        }
    }

    pub fn set_credential_active(&self, uid: &str, active: bool) {
        if let Some(c) = self.lock().credentials.get_mut(uid) {
            c.active = active;
        }
    }

    pub fn credential(&self, uid: &str) -> Option<Credential> {
        self.lock().credentials.get(uid).cloned()
    }

    pub fn device(&self, id: Uuid) -> Option<Device> {
        self.lock().devices.get(&id).cloned()
    }

    pub fn token(&self, token: &str) -> Option<AssignmentToken> {
        self.lock().tokens.get(token).cloned()
    }

    pub fn token_count(&self) -> usize {
        self.lock().tokens.len()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_by_uid(&self, uid: &str) -> Result<Option<Credential>, StoreError> {
        Ok(self.lock().credentials.get(uid).cloned())
    }

    async fn touch_last_used(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut state = self.lock();
        if let Some(c) = state.credentials.values_mut().find(|c| c.id == id) {
            c.last_used_at = Some(at);
        }
        Ok(())
    }
}

#[async_trait]
impl PrincipalStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Principal>, StoreError> {
        Ok(self.lock().principals.get(&id).cloned())
    }
}

#[async_trait]
impl PatientStore for MemoryStore {
    async fn find_patient_by_id(&self, id: Uuid) -> Result<Option<Patient>, StoreError> {
        Ok(self.lock().patients.get(&id).cloned())
    }
}

#[async_trait]
impl DeviceStore for MemoryStore {
    async fn find_device_by_id(&self, id: Uuid) -> Result<Option<Device>, StoreError> {
        Ok(self.lock().devices.get(&id).cloned())
    }

    async fn find_device_by_mac(&self, mac: &str) -> Result<Option<Device>, StoreError> {
        Ok(self
            .lock()
            .devices
            .values()
            .find(|d| d.mac_address == mac)
            .cloned())
    }

    async fn update_device(&self, device: &Device) -> Result<(), StoreError> {
        let mut state = self.lock();
        match state.devices.get_mut(&device.id) {
            Some(existing) => {
                *existing = device.clone();
                Ok(())
            }
            None => Err(StoreError::Corrupt(format!(
                "device {} vanished during update",
                device.id
            ))),
        }
    }
}

#[async_trait]
impl AssignmentTokenStore for MemoryStore {
    async fn insert_token(&self, token: &AssignmentToken) -> Result<(), StoreError> {
        let mut state = self.lock();
        if state.tokens.contains_key(&token.token) {
            return Err(StoreError::Conflict("duplicate assignment token".into()));
        }
        state.tokens.insert(token.token.clone(), token.clone());
        Ok(())
    }

    async fn find_token(&self, token: &str) -> Result<Option<AssignmentToken>, StoreError> {
        Ok(self.lock().tokens.get(token).cloned())
    }

    async fn consume_and_assign(
        &self,
        token: &str,
        device_id: Uuid,
        patient_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Redemption, StoreError> {
        let mut state = self.lock();

        let claimable = state.tokens.get(token).is_some_and(|t| {
            t.token_type == TokenType::PatientAssignment && !t.is_used && now < t.expires_at
        });
        if !claimable {
            return Ok(Redemption::TokenUnavailable);
        }
        if !state.devices.contains_key(&device_id) {
            return Ok(Redemption::DeviceMissing);
        }

        if let Some(t) = state.tokens.get_mut(token) {
            t.is_used = true;
            t.used_at = Some(now);
        }
        if let Some(d) = state.devices.get_mut(&device_id) {
            d.patient_id = Some(patient_id);
        }
        Ok(Redemption::Claimed)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn seeded() -> (MemoryStore, AssignmentToken, Device) {
        let store = MemoryStore::new();
        let now = Utc::now();
        let token = AssignmentToken {
            id: Uuid::new_v4(),
            token: "abc".into(),
            token_type: TokenType::PatientAssignment,
            patient_id: Uuid::new_v4(),
            device_id: None,
            created_at: now,
            expires_at: now + Duration::hours(1),
            is_used: false,
            used_at: None,
        };
        let device = Device {
            id: Uuid::new_v4(),
            mac_address: "AA:BB:CC:DD:EE:FF".into(),
            patient_id: None,
        };
        store.insert_device(device.clone());
        (store, token, device)
    }

    #[tokio::test]
    async fn consume_flips_once() {
        let (store, token, device) = seeded();
        store.insert_token(&token).await.unwrap();
        let now = Utc::now();

        assert_eq!(
            store
                .consume_and_assign("abc", device.id, token.patient_id, now)
                .await
                .unwrap(),
            Redemption::Claimed
        );
        assert_eq!(
            store
                .consume_and_assign("abc", device.id, token.patient_id, now)
                .await
                .unwrap(),
            Redemption::TokenUnavailable
        );

        let stored = store.token("abc").unwrap();
        assert!(stored.is_used);
        assert_eq!(stored.used_at, Some(now));
        assert_eq!(
            store.device(device.id).unwrap().patient_id,
            Some(token.patient_id)
        );
    }

    #[tokio::test]
    async fn consume_refuses_expired_token_without_side_effects() {
        let (store, token, device) = seeded();
        store.insert_token(&token).await.unwrap();

        let outcome = store
            .consume_and_assign("abc", device.id, token.patient_id, token.expires_at)
            .await
            .unwrap();

        assert_eq!(outcome, Redemption::TokenUnavailable);
        assert!(!store.token("abc").unwrap().is_used);
        assert_eq!(store.device(device.id).unwrap().patient_id, None);
    }

    #[tokio::test]
    async fn consume_reports_missing_device_without_using_token() {
        let (store, token, _) = seeded();
        store.insert_token(&token).await.unwrap();

        let outcome = store
            .consume_and_assign("abc", Uuid::new_v4(), token.patient_id, Utc::now())
            .await
            .unwrap();

        assert_eq!(outcome, Redemption::DeviceMissing);
        let stored = store.token("abc").unwrap();
        assert!(!stored.is_used);
        assert_eq!(stored.used_at, None);
    }

    #[tokio::test]
    async fn duplicate_token_insert_conflicts() {
        let (store, token, _) = seeded();
        store.insert_token(&token).await.unwrap();
        assert!(matches!(
            store.insert_token(&token).await,
            Err(StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn find_device_by_mac_matches_exactly() {
        let (store, _, device) = seeded();
        let found = store.find_device_by_mac("AA:BB:CC:DD:EE:FF").await.unwrap();
        assert_eq!(found, Some(device));
        assert!(
            store
                .find_device_by_mac("aa:bb:cc:dd:ee:ff")
                .await
                .unwrap()
                .is_none()
        );
    }
}
