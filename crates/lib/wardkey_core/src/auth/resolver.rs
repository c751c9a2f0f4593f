//! Card UID → principal resolution.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::AuthError;
use crate::clock::Clock;
use crate::models::auth::Principal;
use crate::store::{CredentialStore, PrincipalStore};

/// Walks credential → principal, failing on the first missing or inactive link.
#[derive(Clone)]
pub struct AuthResolver {
    credentials: Arc<dyn CredentialStore>,
    principals: Arc<dyn PrincipalStore>,
    clock: Arc<dyn Clock>,
}

impl AuthResolver {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        principals: Arc<dyn PrincipalStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            credentials,
            principals,
            clock,
        }
    }

    /// Authenticate a scanned card.
    ///
    /// Order: empty UID, unknown card, inactive card, missing owner,
    /// inactive owner. On success the card's last-use time is stamped.
    pub async fn authenticate(&self, card_uid: &str) -> Result<Principal, AuthError> {
        let uid = card_uid.trim();
        if uid.is_empty() {
            return Err(AuthError::EmptyCardUid);
        }

        let Some(credential) = self.credentials.find_by_uid(uid).await? else {
            warn!(card = %redact(uid), "card authentication denied: unknown card");
            return Err(AuthError::CredentialNotFound);
        };

        if !credential.active {
            warn!(credential_id = %credential.id, "card authentication denied: card inactive");
            return Err(AuthError::CredentialInactive);
        }

        let Some(principal) = self.principals.find_by_id(credential.principal_id).await? else {
            warn!(
                credential_id = %credential.id,
                principal_id = %credential.principal_id,
                "card authentication denied: card owner missing"
            );
            return Err(AuthError::OwningPrincipalMissing);
        };

        if !principal.active {
            warn!(principal_id = %principal.id, "card authentication denied: principal inactive");
            return Err(AuthError::PrincipalInactive);
        }

        if let Err(e) = self
            .credentials
            .touch_last_used(credential.id, self.clock.now())
            .await
        {
            warn!(credential_id = %credential.id, error = %e, "failed to record card use");
        }

        info!(principal_id = %principal.id, role = %principal.role, "card authenticated");
        debug!(credential_id = %credential.id, "card resolved");
        Ok(principal)
    }
}

/// Card UIDs are identifiers of physical keys; only a prefix is logged.
fn redact(uid: &str) -> String {
    let prefix: String = uid.chars().take(4).collect();
    format!("{prefix}…")
}
