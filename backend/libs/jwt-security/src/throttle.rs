//! Login attempt throttle
//!
//! Failed logins are counted per (identity, origin) pair in the shared store.
//! The window starts at the first failure and is not extended by later ones.
//! Once the count reaches the threshold the pair is locked until the window
//! expires; a successful login resets the counter.

use crate::config::FailureMode;
use crate::error::{AuthError, Result};
use crate::store::{SharedStore, StoreError};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// **Key format**: `auth:login:attempts:{identity}:{origin}`
pub const THROTTLE_KEY_PREFIX: &str = "auth:login:attempts:";
const UNKNOWN_ORIGIN: &str = "unknown";

pub const DEFAULT_MAX_ATTEMPTS: u64 = 5;
pub const DEFAULT_LOCKOUT_WINDOW: Duration = Duration::from_secs(600);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThrottleKey(String);

impl ThrottleKey {
    /// `identity` is normalized (trimmed, lowercased) so "Alice@X.io " and
    /// "alice@x.io" share a counter.
    pub fn new(identity: &str, origin: &str) -> Self {
        let identity = identity.trim().to_lowercase();
        let origin = match origin.trim() {
            "" => UNKNOWN_ORIGIN,
            origin => origin,
        };
        Self(format!("{}{}:{}", THROTTLE_KEY_PREFIX, identity, origin))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ThrottleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ThrottlePolicy {
    pub max_attempts: u64,
    pub window: Duration,
}

impl ThrottlePolicy {
    pub fn new(max_attempts: u64, window: Duration) -> Result<Self> {
        if max_attempts == 0 {
            return Err(AuthError::Configuration(
                "login attempt threshold must be at least 1".to_string(),
            ));
        }
        if window.is_zero() {
            return Err(AuthError::Configuration(
                "login lockout window must be non-zero".to_string(),
            ));
        }
        Ok(Self {
            max_attempts,
            window,
        })
    }
}

impl Default for ThrottlePolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            window: DEFAULT_LOCKOUT_WINDOW,
        }
    }
}

#[derive(Clone)]
pub struct LoginThrottle {
    store: Arc<dyn SharedStore>,
    policy: ThrottlePolicy,
    failure_mode: FailureMode,
}

impl LoginThrottle {
    pub fn new(
        store: Arc<dyn SharedStore>,
        policy: ThrottlePolicy,
        failure_mode: FailureMode,
    ) -> Self {
        Self {
            store,
            policy,
            failure_mode,
        }
    }

    pub fn policy(&self) -> ThrottlePolicy {
        self.policy
    }

    /// Whether `key` has reached the threshold within the current window.
    pub async fn is_locked(&self, key: &ThrottleKey) -> Result<bool> {
        match self.store.get_count(key.as_str()).await {
            Ok(count) => Ok(count >= self.policy.max_attempts),
            Err(e) => self.on_store_error("is_locked", e).map(|_| false),
        }
    }

    /// `TooManyAttempts` when locked.
    pub async fn check(&self, key: &ThrottleKey) -> Result<()> {
        if self.is_locked(key).await? {
            return Err(AuthError::TooManyAttempts);
        }
        Ok(())
    }

    /// Count one failed attempt and return the new count.
    ///
    /// Under fail-open a store error is logged and reported as a count of 0.
    pub async fn record_failure(&self, key: &ThrottleKey) -> Result<u64> {
        match self
            .store
            .incr_with_window(key.as_str(), self.policy.window)
            .await
        {
            Ok(count) => {
                if count == self.policy.max_attempts {
                    warn!(
                        event = "login_lockout",
                        key = %key,
                        window_secs = self.policy.window.as_secs(),
                        "Login attempts exhausted, key locked"
                    );
                }
                Ok(count)
            }
            Err(e) => self.on_store_error("record_failure", e).map(|_| 0),
        }
    }

    pub async fn reset(&self, key: &ThrottleKey) -> Result<()> {
        match self.store.delete(key.as_str()).await {
            Ok(()) => Ok(()),
            Err(e) => self.on_store_error("reset", e),
        }
    }

    fn on_store_error(&self, operation: &'static str, err: StoreError) -> Result<()> {
        warn!(
            event = "throttle_store_error",
            operation,
            failure_mode = %self.failure_mode,
            error = %err,
            "Login throttle store unavailable"
        );
        match self.failure_mode {
            FailureMode::FailOpen => Ok(()),
            FailureMode::FailClosed => Err(err.into()),
        }
    }
}
