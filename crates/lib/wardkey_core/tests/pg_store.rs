//! Postgres store integration tests.
//!
//! Run against the database named by `WARDKEY_TEST_DATABASE_URL`; every test
//! seeds its own rows, so a shared database is fine. Without the variable
//! the tests log and return.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;
use wardkey_core::assignment::token::{generate_token, hash_token};
use wardkey_core::auth::queries::provision_credential;
use wardkey_core::models::assignment::{AssignmentToken, TokenType};
use wardkey_core::store::postgres::PgStore;
use wardkey_core::store::{AssignmentTokenStore, DeviceStore, Redemption, StoreError};

async fn connect() -> Option<PgPool> {
    let Ok(url) = std::env::var("WARDKEY_TEST_DATABASE_URL") else {
        eprintln!("WARDKEY_TEST_DATABASE_URL not set; skipping Postgres store test");
        return None;
    };
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .connect(&url)
        .await
        .expect("connect to test database");
    wardkey_core::migrate::migrate(&pool)
        .await
        .expect("run migrations");
    Some(pool)
}

/// Postgres keeps microseconds; whole seconds compare cleanly.
fn now() -> DateTime<Utc> {
    DateTime::from_timestamp(Utc::now().timestamp(), 0).expect("valid timestamp")
}

/// Insert a patient and an unassigned device; returns their IDs.
async fn seed(pool: &PgPool) -> (Uuid, Uuid) {
    let patient_id = Uuid::new_v4();
    sqlx::query("INSERT INTO patients (id, display_name) VALUES ($1, $2)")
        .bind(patient_id)
        .bind("P1")
        .execute(pool)
        .await
        .expect("insert patient");

    let device_id = Uuid::new_v4();
    let mac = Uuid::new_v4().as_bytes()[..6]
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(":");
    sqlx::query("INSERT INTO devices (id, mac_address) VALUES ($1, $2)")
        .bind(device_id)
        .bind(mac)
        .execute(pool)
        .await
        .expect("insert device");

    (patient_id, device_id)
}

fn assignment_token(patient_id: Uuid, issued_at: DateTime<Utc>) -> AssignmentToken {
    AssignmentToken {
        id: Uuid::new_v4(),
        token: generate_token(),
        token_type: TokenType::PatientAssignment,
        patient_id,
        device_id: None,
        created_at: issued_at,
        expires_at: issued_at + Duration::hours(1),
        is_used: false,
        used_at: None,
    }
}

#[tokio::test]
async fn token_is_found_by_plaintext_but_stored_hashed() {
    let Some(pool) = connect().await else { return };
    let store = PgStore::new(pool.clone());
    let (patient_id, _) = seed(&pool).await;
    let token = assignment_token(patient_id, now());
    store.insert_token(&token).await.expect("insert token");

    let found = store
        .find_token(&token.token)
        .await
        .expect("find token")
        .expect("token exists");
    assert_eq!(found.id, token.id);
    assert_eq!(found.token, token.token);
    assert_eq!(found.token_type, TokenType::PatientAssignment);
    assert_eq!(found.expires_at, token.expires_at);
    assert!(!found.is_used);

    let (stored_hash,): (String,) =
        sqlx::query_as("SELECT token_hash FROM assignment_tokens WHERE id = $1")
            .bind(token.id)
            .fetch_one(&pool)
            .await
            .expect("select hash");
    assert_eq!(stored_hash, hash_token(&token.token));
    assert_ne!(stored_hash, token.token);

    assert!(
        store
            .find_token(&generate_token())
            .await
            .expect("find unknown")
            .is_none()
    );
}

#[tokio::test]
async fn duplicate_token_string_conflicts() {
    let Some(pool) = connect().await else { return };
    let store = PgStore::new(pool.clone());
    let (patient_id, _) = seed(&pool).await;
    let token = assignment_token(patient_id, now());
    store.insert_token(&token).await.expect("insert token");

    let again = AssignmentToken {
        id: Uuid::new_v4(),
        ..token.clone()
    };
    assert!(matches!(
        store.insert_token(&again).await,
        Err(StoreError::Conflict(_))
    ));
}

#[tokio::test]
async fn duplicate_card_uid_conflicts() {
    let Some(pool) = connect().await else { return };
    let uid = format!("TEST-{}", Uuid::new_v4());
    provision_credential(&pool, &uid, Uuid::new_v4(), now())
        .await
        .expect("first provision");
    assert!(matches!(
        provision_credential(&pool, &uid, Uuid::new_v4(), now()).await,
        Err(StoreError::Conflict(_))
    ));
}

#[tokio::test]
async fn claim_binds_device_and_is_single_use() {
    let Some(pool) = connect().await else { return };
    let store = PgStore::new(pool.clone());
    let (patient_id, device_id) = seed(&pool).await;
    let issued_at = now();
    let token = assignment_token(patient_id, issued_at);
    store.insert_token(&token).await.expect("insert token");

    let at = issued_at + Duration::minutes(5);
    assert_eq!(
        store
            .consume_and_assign(&token.token, device_id, patient_id, at)
            .await
            .expect("claim"),
        Redemption::Claimed
    );
    assert_eq!(
        store
            .consume_and_assign(&token.token, device_id, patient_id, at)
            .await
            .expect("replay"),
        Redemption::TokenUnavailable
    );

    let stored = store
        .find_token(&token.token)
        .await
        .expect("find token")
        .expect("token exists");
    assert!(stored.is_used);
    assert_eq!(stored.used_at, Some(at));
    let device = store
        .find_device_by_id(device_id)
        .await
        .expect("find device")
        .expect("device exists");
    assert_eq!(device.patient_id, Some(patient_id));
}

#[tokio::test]
async fn claim_is_refused_from_expires_at() {
    let Some(pool) = connect().await else { return };
    let store = PgStore::new(pool.clone());
    let (patient_id, device_id) = seed(&pool).await;
    let token = assignment_token(patient_id, now());
    store.insert_token(&token).await.expect("insert token");

    assert_eq!(
        store
            .consume_and_assign(&token.token, device_id, patient_id, token.expires_at)
            .await
            .expect("claim at expiry"),
        Redemption::TokenUnavailable
    );
    let stored = store
        .find_token(&token.token)
        .await
        .expect("find token")
        .expect("token exists");
    assert!(!stored.is_used);

    assert_eq!(
        store
            .consume_and_assign(
                &token.token,
                device_id,
                patient_id,
                token.expires_at - Duration::seconds(1),
            )
            .await
            .expect("claim just before expiry"),
        Redemption::Claimed
    );
}

#[tokio::test]
async fn missing_device_rolls_back_the_claim() {
    let Some(pool) = connect().await else { return };
    let store = PgStore::new(pool.clone());
    let (patient_id, device_id) = seed(&pool).await;
    let issued_at = now();
    let token = assignment_token(patient_id, issued_at);
    store.insert_token(&token).await.expect("insert token");

    assert_eq!(
        store
            .consume_and_assign(&token.token, Uuid::new_v4(), patient_id, issued_at)
            .await
            .expect("claim for unknown device"),
        Redemption::DeviceMissing
    );
    let stored = store
        .find_token(&token.token)
        .await
        .expect("find token")
        .expect("token exists");
    assert!(!stored.is_used);
    assert_eq!(stored.used_at, None);

    assert_eq!(
        store
            .consume_and_assign(&token.token, device_id, patient_id, issued_at)
            .await
            .expect("claim for real device"),
        Redemption::Claimed
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_claims_have_exactly_one_winner() {
    let Some(pool) = connect().await else { return };
    let store = Arc::new(PgStore::new(pool.clone()));
    let (patient_id, device_id) = seed(&pool).await;
    let issued_at = now();
    let token = assignment_token(patient_id, issued_at);
    store.insert_token(&token).await.expect("insert token");

    let attempts = (0..16).map(|_| {
        let store = store.clone();
        let token = token.token.clone();
        tokio::spawn(async move {
            store
                .consume_and_assign(&token, device_id, patient_id, issued_at)
                .await
        })
    });
    let outcomes: Vec<Redemption> = futures::future::join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.expect("task").expect("claim"))
        .collect();

    let winners = outcomes
        .iter()
        .filter(|o| **o == Redemption::Claimed)
        .count();
    assert_eq!(winners, 1, "{outcomes:?}");
    assert!(
        outcomes
            .iter()
            .all(|o| matches!(o, Redemption::Claimed | Redemption::TokenUnavailable))
    );
}
