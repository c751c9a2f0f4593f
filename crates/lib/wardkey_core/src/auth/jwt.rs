//! Session token issuance and verification (HS256 JWT).

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;

use super::{AuthError, InvalidTokenKind};
use crate::clock::Clock;
use crate::config::SigningSecret;
use crate::models::auth::{Principal, SessionClaims, SessionToken};

/// Default session token lifetime: 1 hour.
pub const DEFAULT_SESSION_TTL_SECS: i64 = 60 * 60;

/// Signs and verifies session tokens with the process-wide secret.
#[derive(Clone)]
pub struct SessionTokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl SessionTokenIssuer {
    pub fn new(secret: &SigningSecret, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
            clock,
        }
    }

    /// Sign a token carrying the principal's id and role.
    pub fn issue(&self, principal: &Principal) -> Result<SessionToken, AuthError> {
        let issued_at = truncate_to_secs(self.clock.now());
        let expires_at = issued_at + self.ttl;
        let claims = SessionClaims {
            sub: principal.id,
            role: principal.role,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))?;
        Ok(SessionToken {
            token,
            issued_at,
            expires_at,
        })
    }

    /// Verify signature and structure, then expiry against the injected clock.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked below against our clock, not the library's.
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| {
                let kind = match e.kind() {
                    ErrorKind::InvalidSignature => InvalidTokenKind::BadSignature,
                    ErrorKind::ExpiredSignature => InvalidTokenKind::Expired,
                    _ => InvalidTokenKind::Malformed,
                };
                debug!(%kind, error = %e, "session token rejected");
                AuthError::InvalidToken(kind)
            })?
            .claims;

        if self.clock.now().timestamp() >= claims.exp {
            debug!(principal_id = %claims.sub, "session token rejected: expired");
            return Err(AuthError::InvalidToken(InvalidTokenKind::Expired));
        }
        Ok(claims)
    }
}

/// JWT timestamps are whole seconds.
fn truncate_to_secs(t: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp(t.timestamp(), 0).unwrap_or(t)
}

#[cfg(test)]
mod tests {
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use uuid::Uuid;

    use super::*;
    use crate::clock::ManualClock;
    use crate::config::secret::generate_secret;
    use crate::models::auth::Role;

    fn principal() -> Principal {
        Principal {
            id: Uuid::new_v4(),
            display_name: "Nurse Example".into(),
            role: Role::Nurse,
            active: true,
        }
    }

    fn issuer(clock: Arc<ManualClock>) -> SessionTokenIssuer {
        let secret = SigningSecret::new(generate_secret(64)).unwrap();
        SessionTokenIssuer::new(&secret, Duration::seconds(DEFAULT_SESSION_TTL_SECS), clock)
    }

    #[test]
    fn issue_then_verify_returns_identity() {
        let clock = Arc::new(ManualClock::starting_now());
        let issuer = issuer(clock);
        let p = principal();
        let token = issuer.issue(&p).unwrap();
        assert_eq!(token.expires_at - token.issued_at, Duration::hours(1));

        let claims = issuer.verify(&token.token).unwrap();
        assert_eq!(claims.sub, p.id);
        assert_eq!(claims.role, Role::Nurse);
        assert_eq!(claims.exp, token.expires_at.timestamp());
    }

    #[test]
    fn token_signed_with_other_secret_is_bad_signature() {
        let clock = Arc::new(ManualClock::starting_now());
        let token = issuer(clock.clone()).issue(&principal()).unwrap();
        let err = issuer(clock).verify(&token.token).unwrap_err();
        assert!(matches!(
            err,
            AuthError::InvalidToken(InvalidTokenKind::BadSignature)
        ));
    }

    #[test]
    fn garbage_is_malformed() {
        let issuer = issuer(Arc::new(ManualClock::starting_now()));
        for token in ["", "not-a-jwt", "a.b.c"] {
            assert!(matches!(
                issuer.verify(token),
                Err(AuthError::InvalidToken(InvalidTokenKind::Malformed))
            ));
        }
    }

    #[test]
    fn tampered_payload_fails_signature() {
        let issuer = issuer(Arc::new(ManualClock::starting_now()));
        let token = issuer.issue(&principal()).unwrap().token;
        let parts: Vec<&str> = token.split('.').collect();

        let mut claims: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(parts[1]).unwrap()).unwrap();
        claims["role"] = serde_json::json!("admin");
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap());
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        assert!(matches!(
            issuer.verify(&forged),
            Err(AuthError::InvalidToken(InvalidTokenKind::BadSignature))
        ));
    }

    #[test]
    fn token_expires_exactly_at_exp() {
        let clock = Arc::new(ManualClock::starting_now());
        let issuer = issuer(clock.clone());
        let token = issuer.issue(&principal()).unwrap();

        clock.set(token.expires_at - Duration::seconds(1));
        assert!(issuer.verify(&token.token).is_ok());

        clock.set(token.expires_at);
        assert!(matches!(
            issuer.verify(&token.token),
            Err(AuthError::InvalidToken(InvalidTokenKind::Expired))
        ));
    }
}
