//! Credential and principal database queries.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::auth::{Credential, Principal, Role};
use crate::store::StoreError;
use crate::uuid::uuidv7;

type CredentialRow = (
    Uuid,
    String,
    Uuid,
    bool,
    DateTime<Utc>,
    Option<DateTime<Utc>>,
);

fn credential_from_row(row: CredentialRow) -> Credential {
    let (id, uid, principal_id, active, issued_at, last_used_at) = row;
    Credential {
        id,
        uid,
        principal_id,
        active,
        issued_at,
        last_used_at,
    }
}

/// Fetch a credential by card UID.
pub async fn find_credential_by_uid(
    pool: &PgPool,
    uid: &str,
) -> Result<Option<Credential>, StoreError> {
    let row = sqlx::query_as::<_, CredentialRow>(
        "SELECT id, uid, principal_id, active, issued_at, last_used_at \
         FROM credentials WHERE uid = $1",
    )
    .bind(uid)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(credential_from_row))
}

/// Record a successful card scan.
pub async fn touch_credential(
    pool: &PgPool,
    id: Uuid,
    at: DateTime<Utc>,
) -> Result<(), StoreError> {
    sqlx::query("UPDATE credentials SET last_used_at = $2 WHERE id = $1")
        .bind(id)
        .bind(at)
        .execute(pool)
        .await?;
    Ok(())
}

/// Issue a new card to a principal. A UID that was ever issued cannot be reused.
pub async fn provision_credential(
    pool: &PgPool,
    uid: &str,
    principal_id: Uuid,
    issued_at: DateTime<Utc>,
) -> Result<Credential, StoreError> {
    let row = sqlx::query_as::<_, CredentialRow>(
        "INSERT INTO credentials (id, uid, principal_id, active, issued_at) \
         VALUES ($1, $2, $3, TRUE, $4) \
         RETURNING id, uid, principal_id, active, issued_at, last_used_at",
    )
    .bind(uuidv7())
    .bind(uid)
    .bind(principal_id)
    .bind(issued_at)
    .fetch_one(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            StoreError::Conflict(format!("card UID '{uid}' has already been issued"))
        }
        other => StoreError::DbError(other),
    })?;
    Ok(credential_from_row(row))
}

/// Deactivate a card. Returns `false` when no card has that UID.
pub async fn deactivate_credential(pool: &PgPool, uid: &str) -> Result<bool, StoreError> {
    let result = sqlx::query("UPDATE credentials SET active = FALSE WHERE uid = $1")
        .bind(uid)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Fetch a principal by ID.
pub async fn find_principal_by_id(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<Principal>, StoreError> {
    let row = sqlx::query_as::<_, (Uuid, String, String, bool)>(
        "SELECT id, display_name, role, active FROM principals WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(|(id, display_name, role, active)| {
        let role = role
            .parse::<Role>()
            .map_err(|e| StoreError::Corrupt(format!("principal {id}: {e}")))?;
        Ok(Principal {
            id,
            display_name,
            role,
            active,
        })
    })
    .transpose()
}

/// Deactivate a principal. Returns `false` when the principal does not exist.
pub async fn deactivate_principal(pool: &PgPool, id: Uuid) -> Result<bool, StoreError> {
    let result = sqlx::query("UPDATE principals SET active = FALSE WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
