use crate::error::AuthError;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Closed set of roles carried in a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Employee,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Employee => "employee",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthError;

    /// Exact lowercase match; anything else is rejected rather than defaulted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "employee" => Ok(Role::Employee),
            _ => Err(AuthError::InvalidToken),
        }
    }
}

/// Verified token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    pub role: Role,
    /// Token identity, the revocation ledger key
    pub jti: String,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expiry (Unix seconds)
    pub exp: i64,
}

impl Claims {
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Expiry is inclusive of the `exp` second itself.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() > self.exp
    }

    /// Time until the token stops verifying, `None` once it has expired.
    ///
    /// A token verifies through the whole `exp` second, so the lifetime runs
    /// to the start of `exp + 1`, measured to the millisecond.
    pub fn remaining_lifetime(&self, now: DateTime<Utc>) -> Option<Duration> {
        if self.is_expired_at(now) {
            return None;
        }

        let end_ms = self.exp.saturating_add(1).saturating_mul(1000);
        let remaining_ms = end_ms.saturating_sub(now.timestamp_millis());
        if remaining_ms > 0 {
            Some(Duration::from_millis(remaining_ms as u64))
        } else {
            None
        }
    }
}

/// Wire shape used while decoding: every field optional so a missing claim
/// is reported as `InvalidToken` by us rather than as a serde error.
#[derive(Debug, Deserialize)]
pub(crate) struct RawClaims {
    pub sub: Option<String>,
    pub role: Option<String>,
    pub jti: Option<String>,
    pub iat: Option<i64>,
    pub exp: Option<i64>,
}

impl TryFrom<RawClaims> for Claims {
    type Error = AuthError;

    fn try_from(raw: RawClaims) -> Result<Self, Self::Error> {
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        let sub = non_empty(raw.sub).ok_or(AuthError::InvalidToken)?;
        let jti = non_empty(raw.jti).ok_or(AuthError::InvalidToken)?;
        let role = raw.role.ok_or(AuthError::InvalidToken)?.parse()?;
        let exp = raw.exp.ok_or(AuthError::InvalidToken)?;
        let iat = raw.iat.ok_or(AuthError::InvalidToken)?;

        Ok(Claims {
            sub,
            role,
            jti,
            iat,
            exp,
        })
    }
}
