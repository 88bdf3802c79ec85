//! HS256 token issuance and stateless verification
//!
//! Only HS256 is ever accepted. The algorithm comes from our side, never from
//! the token header, so `alg: none` and algorithm-substitution tokens fail
//! signature validation.

use crate::claims::{Claims, RawClaims, Role};
use crate::error::{AuthError, Result};
use crate::secret_validation::SigningSecret;
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Tolerated clock skew for an `iat` in the future, in seconds.
pub const MAX_IAT_SKEW_SECS: i64 = 300;

/// A freshly signed token together with the claims inside it.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

impl IssuedToken {
    /// Lifetime in seconds, as reported to clients.
    pub fn expires_in(&self) -> i64 {
        self.claims.exp - self.claims.iat
    }
}

#[derive(Clone)]
pub struct TokenSigner {
    encoding_key: EncodingKey,
}

impl TokenSigner {
    pub fn new(secret: &SigningSecret) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.expose()),
        }
    }

    /// Build claims for `subject` and sign them.
    ///
    /// `iat` is now, `exp` is now + `ttl`, and `jti` is a fresh v4 UUID.
    pub fn issue(&self, subject: &str, role: Role, ttl: Duration) -> Result<IssuedToken> {
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        if ttl_secs <= 0 {
            return Err(AuthError::Configuration(
                "token lifetime must be at least one second".to_string(),
            ));
        }

        let now = Utc::now().timestamp();
        let exp = now.checked_add(ttl_secs).ok_or_else(|| {
            AuthError::Configuration("token lifetime is out of range".to_string())
        })?;
        let claims = Claims {
            sub: subject.to_string(),
            role,
            jti: Uuid::new_v4().to_string(),
            iat: now,
            exp,
        };

        let token = self.sign(&claims)?;
        debug!(sub = %claims.sub, jti = %claims.jti, "Issued access token");

        Ok(IssuedToken { token, claims })
    }

    /// Sign pre-built claims as-is.
    pub fn sign(&self, claims: &Claims) -> Result<String> {
        encode(&Header::new(ALGORITHM), claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("failed to sign token: {}", e)))
    }
}

/// Signature, structure and expiry checks. No I/O.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &SigningSecret) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        // Expiry and presence of claims are checked by hand so an expired
        // token reports ExpiredToken and no leeway is applied.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.required_spec_claims.clear();

        Self {
            decoding_key: DecodingKey::from_secret(secret.expose()),
            validation,
        }
    }

    /// Signature and claim structure, without the expiry check.
    pub fn decode(&self, token: &str) -> Result<Claims> {
        self.decode_at(token, Utc::now())
    }

    /// Full stateless verification: [`decode`](Self::decode) plus expiry.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims> {
        let claims = self.decode_at(token, now)?;

        if claims.is_expired_at(now) {
            debug!(jti = %claims.jti, exp = claims.exp, "Token expired");
            return Err(AuthError::ExpiredToken);
        }

        Ok(claims)
    }

    fn decode_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::InvalidToken);
        }

        let data = decode::<RawClaims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            debug!(error = %e, "Token rejected during decode");
            AuthError::InvalidToken
        })?;

        let claims = Claims::try_from(data.claims)?;

        if claims.iat > now.timestamp() + MAX_IAT_SKEW_SECS {
            debug!(jti = %claims.jti, iat = claims.iat, "Token issued in the future");
            return Err(AuthError::InvalidToken);
        }
        if claims.exp <= claims.iat {
            return Err(AuthError::InvalidToken);
        }

        Ok(claims)
    }
}
