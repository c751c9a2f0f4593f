//! Shared harness: an in-memory hospital with one ward's worth of fixtures.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use chrono::Utc;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;
use wardkey_api::config::ApiConfig;
use wardkey_api::{AppState, router};
use wardkey_core::clock::ManualClock;
use wardkey_core::config::{SigningSecret, TokenPolicy};
use wardkey_core::models::assignment::{Device, Patient};
use wardkey_core::models::auth::{Credential, Principal, Role};
use wardkey_core::store::Stores;
use wardkey_core::store::memory::MemoryStore;

pub const NURSE_CARD: &str = "04:A2:19:7C";
pub const TECH_CARD: &str = "04:B7:33:01";
pub const DEVICE_MAC: &str = "AA:BB:CC:DD:EE:FF";

pub struct Ward {
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub nurse_id: Uuid,
    pub patient_id: Uuid,
    pub device_id: Uuid,
    pub app: Router,
}

pub fn config(expose_auth_failure_reasons: bool) -> ApiConfig {
    ApiConfig {
        bind_addr: "127.0.0.1:0".into(),
        pg_connection_url: "postgres://unused".into(),
        signing_secret: SigningSecret::new("integration-test-secret-0123456789abcdef")
            .expect("valid secret"),
        session_ttl_secs: 3600,
        token_policy: TokenPolicy::default(),
        expose_auth_failure_reasons,
    }
}

pub fn ward() -> Ward {
    ward_with(config(true))
}

pub fn ward_with(config: ApiConfig) -> Ward {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(Utc::now()));

    let nurse_id = Uuid::new_v4();
    let tech_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();
    let device_id = Uuid::new_v4();

    store.insert_principal(Principal {
        id: nurse_id,
        display_name: "Nurse Example".into(),
        role: Role::Nurse,
        active: true,
    });
    store.insert_principal(Principal {
        id: tech_id,
        display_name: "Tech Example".into(),
        role: Role::Technician,
        active: true,
    });
    for (uid, principal_id) in [(NURSE_CARD, nurse_id), (TECH_CARD, tech_id)] {
        store.insert_credential(Credential {
            id: Uuid::new_v4(),
            uid: uid.into(),
            principal_id,
            active: true,
            issued_at: Utc::now(),
            last_used_at: None,
        });
    }
    store.insert_patient(Patient {
        id: patient_id,
        display_name: "P1".into(),
    });
    store.insert_device(Device {
        id: device_id,
        mac_address: DEVICE_MAC.into(),
        patient_id: None,
    });

    let state = AppState::new(Stores::memory(store.clone()), config, clock.clone());
    Ward {
        store,
        clock,
        nurse_id,
        patient_id,
        device_id,
        app: router(state),
    }
}

impl Ward {
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        bearer: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = bearer {
            req = req.header("authorization", format!("Bearer {token}"));
        }
        let req = match body {
            Some(json) => req
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => req.body(Body::empty()),
        }
        .expect("build request");

        let resp = self.app.clone().oneshot(req).await.expect("request");
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("read body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("parse JSON")
        };
        (status, json)
    }

    pub async fn post(&self, uri: &str, bearer: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, bearer, Some(body)).await
    }

    /// Scan a card and return the session token.
    pub async fn login(&self, card_uid: &str) -> String {
        let (status, json) = self
            .post("/api/auth/card", None, serde_json::json!({"cardUid": card_uid}))
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {json}");
        json["accessToken"]
            .as_str()
            .expect("accessToken")
            .to_string()
    }
}
