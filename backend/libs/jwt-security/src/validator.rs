//! Full token validation: stateless verification plus the revocation ledger.
//!
//! One `TokenValidator` is built at startup and shared (behind `Arc`) by
//! every entry point, so HTTP and gRPC apply the same revocation policy.

use crate::claims::Claims;
use crate::config::FailureMode;
use crate::error::{AuthError, Result};
use crate::revocation::RevocationLedger;
use crate::token::TokenVerifier;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct TokenValidator {
    verifier: TokenVerifier,
    ledger: RevocationLedger,
    failure_mode: FailureMode,
}

impl TokenValidator {
    pub fn new(
        verifier: TokenVerifier,
        ledger: RevocationLedger,
        failure_mode: FailureMode,
    ) -> Self {
        Self {
            verifier,
            ledger,
            failure_mode,
        }
    }

    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }

    pub fn ledger(&self) -> &RevocationLedger {
        &self.ledger
    }

    pub fn failure_mode(&self) -> FailureMode {
        self.failure_mode
    }

    /// Verify signature, structure and expiry, then consult the ledger.
    pub async fn validate(&self, token: &str) -> Result<Claims> {
        let claims = self.verifier.verify(token)?;

        match self.ledger.is_revoked(&claims.jti).await {
            Ok(false) => Ok(claims),
            Ok(true) => {
                debug!(jti = %claims.jti, "Rejected revoked token");
                Err(AuthError::RevokedToken)
            }
            Err(e) => match self.failure_mode {
                FailureMode::FailClosed => {
                    warn!(
                        event = "revocation_check_failed",
                        jti = %claims.jti,
                        failure_mode = %self.failure_mode,
                        error = %e,
                        "Revocation ledger unavailable, rejecting token"
                    );
                    Err(AuthError::InvalidToken)
                }
                FailureMode::FailOpen => {
                    warn!(
                        event = "revocation_check_failed",
                        jti = %claims.jti,
                        failure_mode = %self.failure_mode,
                        error = %e,
                        "Revocation ledger unavailable, accepting token"
                    );
                    Ok(claims)
                }
            },
        }
    }
}
