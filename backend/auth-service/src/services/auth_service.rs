/// Login, logout and token validation flows shared by the HTTP and gRPC surfaces
use crate::db::UserRepository;
use crate::error::{Result, ServiceError};
use crate::metrics::{
    inc_login_failures, inc_login_lockouts, inc_login_requests, inc_token_validation_failures,
    inc_tokens_issued, inc_tokens_revoked,
};
use chrono::Utc;
use jwt_security::{
    verify_against_dummy, verify_password, AuthError, Claims, IssuedToken, LoginThrottle, Role,
    ThrottleKey, TokenSigner, TokenValidator,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

/// Successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub issued: IssuedToken,
    pub user_id: Uuid,
    pub role: Role,
}

/// Trimmed, lowercased email with a non-empty local part and domain.
pub fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if valid {
        Ok(email)
    } else {
        Err(ServiceError::Validation("malformed email".to_string()))
    }
}

pub struct TokenAuthService {
    users: Arc<dyn UserRepository>,
    signer: TokenSigner,
    validator: Arc<TokenValidator>,
    throttle: LoginThrottle,
    token_ttl: Duration,
}

impl TokenAuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        signer: TokenSigner,
        validator: Arc<TokenValidator>,
        throttle: LoginThrottle,
        token_ttl: Duration,
    ) -> Self {
        Self {
            users,
            signer,
            validator,
            throttle,
            token_ttl,
        }
    }

    pub fn validator(&self) -> Arc<TokenValidator> {
        self.validator.clone()
    }

    /// Throttle check, credential check, then issuance.
    ///
    /// A locked (identity, origin) pair is refused before the password is
    /// looked at, so a correct password can't be confirmed during lockout.
    pub async fn login(&self, email: &str, password: &str, origin: &str) -> Result<LoginOutcome> {
        inc_login_requests();

        let email = normalize_email(email)?;
        if password.is_empty() {
            return Err(ServiceError::Validation("password required".to_string()));
        }

        let key = ThrottleKey::new(&email, origin);
        if let Err(e) = self.throttle.check(&key).await {
            if matches!(e, AuthError::TooManyAttempts) {
                warn!(event = "login_throttled", email = %email, origin = %origin);
            }
            return Err(e.into());
        }

        let user = self.users.find_by_email(&email).await?;

        let candidate = password.to_owned();
        let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
        let verified = tokio::task::spawn_blocking(move || match stored_hash {
            Some(hash) => verify_password(&candidate, &hash),
            None => verify_against_dummy(&candidate),
        })
        .await
        .map_err(|e| ServiceError::Internal(format!("password verification task failed: {}", e)))?;

        let user = match user {
            Some(user) if verified => user,
            _ => {
                let count = self.throttle.record_failure(&key).await?;
                inc_login_failures();
                if count == self.throttle.policy().max_attempts {
                    inc_login_lockouts();
                }
                warn!(event = "login_failed", email = %email, origin = %origin, attempts = count);
                return Err(AuthError::InvalidCredentials.into());
            }
        };

        self.throttle.reset(&key).await?;

        let issued = self
            .signer
            .issue(&user.id.to_string(), user.role, self.token_ttl)?;
        inc_tokens_issued();

        info!(event = "login_success", user_id = %user.id, jti = %issued.claims.jti);

        Ok(LoginOutcome {
            issued,
            user_id: user.id,
            role: user.role,
        })
    }

    /// Full validation including the revocation ledger.
    pub async fn validate(&self, token: &str) -> std::result::Result<Claims, AuthError> {
        let result = self.validator.validate(token).await;
        if result.is_err() {
            inc_token_validation_failures();
        }
        result
    }

    /// Revoke `token` for its remaining lifetime.
    ///
    /// The signature must check out, but expiry is not enforced: logging
    /// out an expired token is a successful no-op, as is logging out twice.
    pub async fn logout(&self, token: &str) -> Result<()> {
        let claims = self.validator.verifier().decode(token)?;

        if claims.remaining_lifetime(Utc::now()).is_none() {
            info!(event = "logout_expired_token", jti = %claims.jti);
            return Ok(());
        }

        self.validator
            .ledger()
            .revoke_claims(&claims)
            .await
            .map_err(AuthError::from)?;
        inc_tokens_revoked();

        info!(event = "logout", user_id = %claims.sub, jti = %claims.jti);
        Ok(())
    }
}
