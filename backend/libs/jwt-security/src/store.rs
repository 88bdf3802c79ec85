//! Shared key-value store abstraction
//!
//! The revocation ledger and the login throttle both need a store whose
//! state is visible to every service instance. Production uses Redis
//! ([`crate::redis_store::RedisStore`]); tests use
//! [`crate::memory::InMemoryStore`].

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[async_trait]
pub trait SharedStore: Send + Sync {
    /// Write `key` with an expiry. Overwrites any previous value and TTL.
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()>;

    async fn exists(&self, key: &str) -> StoreResult<bool>;

    /// Atomically increment a counter and return the new value.
    ///
    /// The expiry `window` is applied only when the increment created the
    /// key (new value == 1), so the window is fixed from the first hit and
    /// later increments never extend it.
    async fn incr_with_window(&self, key: &str, window: Duration) -> StoreResult<u64>;

    /// Current counter value, 0 when absent.
    async fn get_count(&self, key: &str) -> StoreResult<u64>;

    async fn delete(&self, key: &str) -> StoreResult<()>;
}
