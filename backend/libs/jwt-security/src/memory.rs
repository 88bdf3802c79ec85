//! In-memory [`SharedStore`] for tests and single-process development.
//!
//! Expiry is lazy: an expired entry is dropped the next time it is touched.
//! Time comes from [`tokio::time::Instant`], so tests running with a paused
//! clock can advance past a window without sleeping.
//!
//! [`InMemoryStore::set_available`] simulates a store outage; every
//! operation then fails with [`StoreError::Unavailable`].

use crate::store::{SharedStore, StoreError, StoreResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// Cloning is cheap; clones share the same data.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    data: Arc<Mutex<HashMap<String, Entry>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    /// Remaining lifetime of a live key, `None` if absent or without expiry.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let data = self.lock();
        data.get(key)
            .filter(|entry| entry.is_live(now))
            .and_then(|entry| entry.expires_at)
            .map(|at| at.saturating_duration_since(now))
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("in-memory store marked unavailable".to_string()))
        } else {
            Ok(())
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        // A panic while holding the lock can't leave a half-written entry
        self.data.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Locks the map after evicting `key` if it has expired.
    fn live_map(&self, key: &str) -> MutexGuard<'_, HashMap<String, Entry>> {
        let now = Instant::now();
        let mut data = self.lock();
        if data.get(key).is_some_and(|entry| !entry.is_live(now)) {
            data.remove(key);
        }
        data
    }
}

#[async_trait]
impl SharedStore for InMemoryStore {
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()> {
        self.check_available()?;
        self.lock().insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        self.check_available()?;
        Ok(self.live_map(key).contains_key(key))
    }

    async fn incr_with_window(&self, key: &str, window: Duration) -> StoreResult<u64> {
        self.check_available()?;
        let mut data = self.live_map(key);

        let entry = data.entry(key.to_string()).or_insert_with(|| Entry {
            value: "0".to_string(),
            expires_at: None,
        });

        let count = entry
            .value
            .parse::<u64>()
            .map_err(|_| StoreError::Unavailable(format!("value at {} is not a counter", key)))?
            + 1;
        entry.value = count.to_string();
        if count == 1 {
            entry.expires_at = Some(Instant::now() + window);
        }

        Ok(count)
    }

    async fn get_count(&self, key: &str) -> StoreResult<u64> {
        self.check_available()?;
        let data = self.live_map(key);
        Ok(data
            .get(key)
            .and_then(|entry| entry.value.parse().ok())
            .unwrap_or(0))
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.check_available()?;
        self.lock().remove(key);
        Ok(())
    }
}
