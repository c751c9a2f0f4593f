//! Route paths.

pub const GET_API_HEALTH: &str = "/api/health";

pub const POST_AUTH_CARD: &str = "/api/auth/card";
pub const GET_AUTH_ME: &str = "/api/auth/me";

pub const POST_ASSIGNMENT_TOKENS_PATIENT_ASSIGNMENT: &str =
    "/api/assignment-tokens/patient-assignment";
pub const POST_ASSIGNMENT_TOKENS_PRESCRIPTION_INFO: &str =
    "/api/assignment-tokens/prescription-info";
pub const POST_ASSIGNMENT_TOKENS_VALIDATE: &str = "/api/assignment-tokens/validate";
pub const POST_ASSIGNMENT_TOKENS_REDEEM: &str = "/api/assignment-tokens/redeem";
pub const POST_ASSIGNMENT_TOKENS_PRESCRIPTION_INFO_READ: &str =
    "/api/assignment-tokens/prescription-info/read";

pub const DELETE_DEVICES_MAC_PATIENT: &str = "/api/devices/{mac}/patient";
