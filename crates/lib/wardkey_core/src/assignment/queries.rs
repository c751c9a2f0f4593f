//! Assignment-token, patient and device database queries.
//!
//! Token strings are never stored; rows carry their SHA-256 digest.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::token::hash_token;
use crate::models::assignment::{AssignmentToken, Device, Patient, TokenType};
use crate::store::{Redemption, StoreError};

/// Fetch a patient by ID.
pub async fn find_patient_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Patient>, StoreError> {
    let row = sqlx::query_as::<_, (Uuid, String)>(
        "SELECT id, display_name FROM patients WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|(id, display_name)| Patient { id, display_name }))
}

/// Fetch a device by ID.
pub async fn find_device_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Device>, StoreError> {
    let row = sqlx::query_as::<_, (Uuid, String, Option<Uuid>)>(
        "SELECT id, mac_address, patient_id FROM devices WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|(id, mac_address, patient_id)| Device {
        id,
        mac_address,
        patient_id,
    }))
}

/// Fetch a device by its normalised MAC address.
pub async fn find_device_by_mac(pool: &PgPool, mac: &str) -> Result<Option<Device>, StoreError> {
    let row = sqlx::query_as::<_, (Uuid, String, Option<Uuid>)>(
        "SELECT id, mac_address, patient_id FROM devices WHERE mac_address = $1",
    )
    .bind(mac)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|(id, mac_address, patient_id)| Device {
        id,
        mac_address,
        patient_id,
    }))
}

/// Persist a device's patient binding.
pub async fn update_device(pool: &PgPool, device: &Device) -> Result<(), StoreError> {
    let result =
        sqlx::query("UPDATE devices SET patient_id = $2, updated_at = now() WHERE id = $1")
            .bind(device.id)
            .bind(device.patient_id)
            .execute(pool)
            .await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::Corrupt(format!(
            "device {} vanished during update",
            device.id
        )));
    }
    Ok(())
}

/// Store a newly issued token (by digest).
pub async fn insert_token(pool: &PgPool, token: &AssignmentToken) -> Result<(), StoreError> {
    sqlx::query(
        "INSERT INTO assignment_tokens \
         (id, token_hash, token_type, patient_id, device_id, created_at, expires_at, is_used, used_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(token.id)
    .bind(hash_token(&token.token))
    .bind(token.token_type.as_str())
    .bind(token.patient_id)
    .bind(token.device_id)
    .bind(token.created_at)
    .bind(token.expires_at)
    .bind(token.is_used)
    .bind(token.used_at)
    .execute(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            StoreError::Conflict("duplicate assignment token".into())
        }
        other => StoreError::DbError(other),
    })?;
    Ok(())
}

/// Look up a token by its plaintext string.
pub async fn find_token(pool: &PgPool, token: &str) -> Result<Option<AssignmentToken>, StoreError> {
    let row = sqlx::query_as::<
        _,
        (
            Uuid,
            String,
            Uuid,
            Option<Uuid>,
            DateTime<Utc>,
            DateTime<Utc>,
            bool,
            Option<DateTime<Utc>>,
        ),
    >(
        "SELECT id, token_type, patient_id, device_id, created_at, expires_at, is_used, used_at \
         FROM assignment_tokens WHERE token_hash = $1",
    )
    .bind(hash_token(token))
    .fetch_optional(pool)
    .await?;

    row.map(
        |(id, token_type, patient_id, device_id, created_at, expires_at, is_used, used_at)| {
            let token_type = token_type
                .parse::<TokenType>()
                .map_err(|e| StoreError::Corrupt(format!("assignment token {id}: {e}")))?;
            Ok(AssignmentToken {
                id,
                token: token.to_string(),
                token_type,
                patient_id,
                device_id,
                created_at,
                expires_at,
                is_used,
                used_at,
            })
        },
    )
    .transpose()
}

/// Claim a patient-assignment token and bind the device in one transaction.
///
/// The conditional UPDATE is the serialization point: concurrent callers
/// block on the row lock and re-evaluate `is_used`, so only one sees a row.
pub async fn consume_and_assign(
    pool: &PgPool,
    token: &str,
    device_id: Uuid,
    patient_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Redemption, StoreError> {
    let mut tx = pool.begin().await?;

    let claimed = sqlx::query(
        "UPDATE assignment_tokens SET is_used = TRUE, used_at = $2 \
         WHERE token_hash = $1 \
           AND token_type = 'patient_assignment' \
           AND is_used = FALSE \
           AND expires_at > $2",
    )
    .bind(hash_token(token))
    .bind(now)
    .execute(&mut *tx)
    .await?;

    if claimed.rows_affected() == 0 {
        tx.rollback().await?;
        return Ok(Redemption::TokenUnavailable);
    }

    let assigned =
        sqlx::query("UPDATE devices SET patient_id = $2, updated_at = now() WHERE id = $1")
            .bind(device_id)
            .bind(patient_id)
            .execute(&mut *tx)
            .await?;

    if assigned.rows_affected() == 0 {
        tx.rollback().await?;
        return Ok(Redemption::DeviceMissing);
    }

    tx.commit().await?;
    Ok(Redemption::Claimed)
}
