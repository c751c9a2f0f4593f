//! Token-string and device-address helpers.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use sha2::{Digest, Sha256};

use super::AssignmentError;

/// Random bytes per token (256 bits of entropy).
const TOKEN_BYTES: usize = 32;

/// Generate an unguessable token string (43 URL-safe characters).
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// SHA-256 hash a token for storage.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Trim a presented token string and reject blanks.
pub fn check_token_str(token: &str) -> Result<&str, AssignmentError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(AssignmentError::InvalidInput(
            "token must not be empty".into(),
        ));
    }
    Ok(token)
}

/// Normalise a MAC address to `AA:BB:CC:DD:EE:FF`.
///
/// Accepts `:` or `-` separators in any case.
pub fn normalize_mac(mac: &str) -> Result<String, AssignmentError> {
    let invalid = || AssignmentError::InvalidInput(format!("invalid MAC address: '{mac}'"));

    let octets: Vec<&str> = mac.trim().split([':', '-']).collect();
    if octets.len() != 6 {
        return Err(invalid());
    }
    let mut normalized = Vec::with_capacity(6);
    for octet in octets {
        if octet.len() != 2 || !octet.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        normalized.push(octet.to_ascii_uppercase());
    }
    Ok(normalized.join(":"))
}
