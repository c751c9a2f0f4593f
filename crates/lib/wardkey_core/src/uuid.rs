// Helper for generating UUIDv7 (timestamp-sortable UUIDs)
//
// Credentials and assignment tokens get app-side UUIDv7 ids so rows sort by
// issuance time. Principals, patients and devices are provisioned by other
// systems and keep whatever ids they arrive with.

use uuid::Uuid;

/// Generate a new UUIDv7 (timestamp-sortable).
pub fn uuidv7() -> Uuid {
    Uuid::now_v7()
}
