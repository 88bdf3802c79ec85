//! Revocation ledger
//!
//! A revoked token is recorded under its `jti` until its natural expiry;
//! after that the signature check rejects it anyway, so the entry is allowed
//! to expire with it.

use crate::claims::Claims;
use crate::store::{SharedStore, StoreResult};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// **Key format**: `auth:token:blacklist:{jti}`
pub const REVOCATION_KEY_PREFIX: &str = "auth:token:blacklist:";
const REVOKED_MARKER: &str = "revoked";

pub fn revocation_key(token_id: &str) -> String {
    format!("{}{}", REVOCATION_KEY_PREFIX, token_id)
}

#[derive(Clone)]
pub struct RevocationLedger {
    store: Arc<dyn SharedStore>,
}

impl RevocationLedger {
    pub fn new(store: Arc<dyn SharedStore>) -> Self {
        Self { store }
    }

    /// Record `token_id` as revoked for `ttl`.
    ///
    /// A zero `ttl` means the token is already expired and nothing is
    /// written. Revoking twice only refreshes the entry.
    pub async fn revoke(&self, token_id: &str, ttl: Duration) -> StoreResult<()> {
        if ttl.is_zero() {
            return Ok(());
        }

        self.store
            .set_with_ttl(&revocation_key(token_id), REVOKED_MARKER, ttl)
            .await?;

        info!(jti = %token_id, ttl_secs = ttl.as_secs(), "Token revoked");
        Ok(())
    }

    /// Revoke for the remaining lifetime of `claims`.
    pub async fn revoke_claims(&self, claims: &Claims) -> StoreResult<()> {
        match claims.remaining_lifetime(Utc::now()) {
            Some(ttl) => self.revoke(&claims.jti, ttl).await,
            None => Ok(()),
        }
    }

    pub async fn is_revoked(&self, token_id: &str) -> StoreResult<bool> {
        self.store.exists(&revocation_key(token_id)).await
    }
}
