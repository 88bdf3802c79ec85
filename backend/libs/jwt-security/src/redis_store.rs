//! Redis-backed [`SharedStore`]

use crate::store::{SharedStore, StoreError, StoreResult};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};
use redis_utils::{with_timeout, RedisCallError, SharedConnectionManager};
use std::time::Duration;

/// INCR and set the window expiry in one round trip. Running both commands
/// inside a script closes the gap where a crash between INCR and EXPIRE would
/// leave a counter with no expiry.
const INCR_WITH_WINDOW_SCRIPT: &str = r#"
local count = redis.call('INCR', KEYS[1])
if count == 1 then
    redis.call('PEXPIRE', KEYS[1], ARGV[1])
end
return count
"#;

pub struct RedisStore {
    manager: SharedConnectionManager,
    timeout: Duration,
    incr_script: Script,
}

impl RedisStore {
    pub fn new(manager: SharedConnectionManager, timeout: Duration) -> Self {
        Self {
            manager,
            timeout,
            incr_script: Script::new(INCR_WITH_WINDOW_SCRIPT),
        }
    }

    async fn connection(&self) -> ConnectionManager {
        // ConnectionManager is a cheap handle; don't hold the lock across a round trip
        self.manager.lock().await.clone()
    }
}

impl From<RedisCallError> for StoreError {
    fn from(err: RedisCallError) -> Self {
        match err {
            RedisCallError::Timeout(limit) => StoreError::Timeout(limit),
            RedisCallError::Command(e) => StoreError::Unavailable(e.to_string()),
        }
    }
}

/// Redis EX takes whole seconds; round up so a key never outlives less than asked.
fn ttl_seconds(ttl: Duration) -> u64 {
    let secs = ttl.as_secs();
    if ttl.subsec_nanos() > 0 || secs == 0 {
        secs + 1
    } else {
        secs
    }
}

#[async_trait]
impl SharedStore for RedisStore {
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()> {
        let mut conn = self.connection().await;
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value).arg("EX").arg(ttl_seconds(ttl));

        let _: () = with_timeout(self.timeout, cmd.query_async(&mut conn)).await?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        let mut conn = self.connection().await;
        let exists: bool = with_timeout(self.timeout, conn.exists(key)).await?;
        Ok(exists)
    }

    async fn incr_with_window(&self, key: &str, window: Duration) -> StoreResult<u64> {
        let mut conn = self.connection().await;
        let window_ms = window.as_millis().max(1) as u64;
        let mut invocation = self.incr_script.key(key);
        invocation.arg(window_ms);

        let count: u64 = with_timeout(self.timeout, invocation.invoke_async(&mut conn)).await?;
        Ok(count)
    }

    async fn get_count(&self, key: &str) -> StoreResult<u64> {
        let mut conn = self.connection().await;
        let count: Option<u64> = with_timeout(self.timeout, conn.get(key)).await?;
        Ok(count.unwrap_or(0))
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let mut conn = self.connection().await;
        let _: () = with_timeout(self.timeout, conn.del(key)).await?;
        Ok(())
    }
}
