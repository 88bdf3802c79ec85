//! Configuration management for Auth Service
//!
//! Loaded once at startup from environment variables (plus a `.env` file in
//! debug builds) and never mutated afterwards.

use anyhow::{Context, Result};
use jwt_security::{FailureMode, SigningSecret};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Application settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub redis: RedisSettings,
    pub auth: AuthSettings,
}

impl Settings {
    pub fn load() -> Result<Self> {
        if cfg!(debug_assertions) && dotenvy::dotenv().is_ok() {
            info!("Loaded .env file for development");
        }

        Ok(Settings {
            server: ServerSettings::from_env()?,
            database: DatabaseSettings::from_env()?,
            redis: RedisSettings::from_env()?,
            auth: AuthSettings::from_env()?,
        })
    }
}

fn parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {}", name)),
        Err(_) => Ok(default),
    }
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub http_port: u16,
    pub grpc_port: u16,
    /// Marks the access-token cookie `Secure`
    pub https_enabled: bool,
    /// Only enable behind a proxy that overwrites `X-Forwarded-For`
    pub trust_forwarded_headers: bool,
}

impl ServerSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: parse_or("HTTP_PORT", 8080)?,
            grpc_port: parse_or("GRPC_PORT", 50051)?,
            https_enabled: parse_or("HTTPS_ENABLED", false)?,
            trust_forwarded_headers: parse_or("TRUST_FORWARDED_HEADERS", false)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 10)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RedisSettings {
    pub url: String,
}

impl RedisSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            url: env::var("REDIS_URL").context("REDIS_URL must be set")?,
        })
    }
}

/// Upper bound for `JWT_TTL` (30 days)
pub const MAX_TOKEN_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Token, throttle and shared-store behaviour
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub signing_secret: SigningSecret,
    pub token_ttl: Duration,
    pub max_login_attempts: u64,
    pub lockout_window: Duration,
    pub revocation_failure_mode: FailureMode,
    pub throttle_failure_mode: FailureMode,
    pub store_timeout: Duration,
}

impl AuthSettings {
    fn from_env() -> Result<Self> {
        let secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        let signing_secret = SigningSecret::new(secret.as_bytes())
            .context("JWT_SECRET rejected")?;

        let token_ttl = Duration::from_secs(parse_or("JWT_TTL", 3600u64)?);
        if token_ttl.is_zero() {
            anyhow::bail!("JWT_TTL must be greater than zero");
        }
        if token_ttl > MAX_TOKEN_TTL {
            anyhow::bail!(
                "JWT_TTL must be at most {} seconds",
                MAX_TOKEN_TTL.as_secs()
            );
        }

        let max_login_attempts: u64 = parse_or("LOGIN_MAX_ATTEMPTS", 5)?;
        if max_login_attempts == 0 {
            anyhow::bail!("LOGIN_MAX_ATTEMPTS must be greater than zero");
        }

        let lockout_window = Duration::from_secs(parse_or("LOGIN_LOCKOUT_SECONDS", 600u64)?);
        if lockout_window.is_zero() {
            anyhow::bail!("LOGIN_LOCKOUT_SECONDS must be greater than zero");
        }

        Ok(Self {
            signing_secret,
            token_ttl,
            max_login_attempts,
            lockout_window,
            revocation_failure_mode: parse_or(
                "REVOCATION_FAILURE_MODE",
                FailureMode::FailClosed,
            )?,
            throttle_failure_mode: parse_or("THROTTLE_FAILURE_MODE", FailureMode::FailOpen)?,
            store_timeout: Duration::from_millis(parse_or("STORE_TIMEOUT_MS", 250u64)?),
        })
    }
}
