//! Shared Redis plumbing for the auth stack.
//!
//! Every service that touches the revocation ledger or the login throttle
//! goes through the same [`RedisPool`] so that all instances observe the same
//! keys, and every command is bounded by [`with_timeout`] so a slow Redis can
//! never stall a request indefinitely.

use anyhow::{Context, Result};
use redis::aio::ConnectionManager;
use redis::{Client, IntoConnectionInfo, RedisError};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::info;

/// Shared Redis connection manager guarded by a Tokio mutex.
pub type SharedConnectionManager = Arc<Mutex<ConnectionManager>>;

/// Default upper bound for a single Redis round trip.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_millis(250);

/// Error returned by [`with_timeout`].
#[derive(Debug, thiserror::Error)]
pub enum RedisCallError {
    #[error("redis command timed out after {0:?}")]
    Timeout(Duration),
    #[error("redis command failed: {0}")]
    Command(#[from] RedisError),
}

/// Redis connection pool shared by the ledger and throttle stores.
pub struct RedisPool {
    manager: SharedConnectionManager,
}

impl RedisPool {
    /// Connect to `redis_url`, failing if the first connection is not
    /// established within `connect_timeout`.
    pub async fn connect(redis_url: &str, connect_timeout: Duration) -> Result<Self> {
        let info = redis_url
            .into_connection_info()
            .context("failed to parse REDIS_URL connection string")?;
        let client = Client::open(info).context("failed to construct Redis client")?;

        let manager = tokio::time::timeout(connect_timeout, ConnectionManager::new(client))
            .await
            .context("timed out connecting to Redis")?
            .context("failed to initialize Redis connection manager")?;

        info!(timeout_ms = connect_timeout.as_millis() as u64, "Redis connection manager ready");

        Ok(Self {
            manager: Arc::new(Mutex::new(manager)),
        })
    }

    pub fn manager(&self) -> SharedConnectionManager {
        self.manager.clone()
    }
}

/// Run a single Redis command future with an upper time bound.
///
/// Nothing is retried: a timeout or command error is handed back to the
/// caller, which decides whether to fail open or closed.
pub async fn with_timeout<F, T>(limit: Duration, command: F) -> Result<T, RedisCallError>
where
    F: Future<Output = Result<T, RedisError>>,
{
    match tokio::time::timeout(limit, command).await {
        Ok(result) => result.map_err(RedisCallError::from),
        Err(_) => Err(RedisCallError::Timeout(limit)),
    }
}
