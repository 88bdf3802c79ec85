//! Token authentication core
//!
//! **Security Features**:
//! - HS256 access tokens with a validated, zeroized shared secret
//! - JWT ID (jti) on every token for revocation
//! - Revocation ledger in the shared store, entries live as long as the token
//! - Login throttle per (identity, origin) with a fixed window
//! - Argon2id password verification with timing equalization
//!
//! Stateless checks ([`TokenVerifier`]) need no network round trip. The
//! [`TokenValidator`] adds the ledger lookup and the configured
//! [`FailureMode`] for when the store can't answer.

pub mod claims;
pub mod config;
pub mod error;
pub mod extract;
pub mod memory;
pub mod password;
pub mod redis_store;
pub mod revocation;
pub mod secret_validation;
pub mod store;
pub mod throttle;
pub mod token;
pub mod validator;

pub use claims::{Claims, Role};
pub use config::FailureMode;
pub use error::{AuthError, Result};
pub use extract::{bearer_token, token_from_request_parts, ACCESS_TOKEN_COOKIE};
pub use memory::InMemoryStore;
pub use password::{hash_password, verify_against_dummy, verify_password};
pub use redis_store::RedisStore;
pub use revocation::RevocationLedger;
pub use secret_validation::{
    generate_secure_secret, validate_secret_strength, SecretStrength, SigningSecret,
};
pub use store::{SharedStore, StoreError};
pub use throttle::{LoginThrottle, ThrottleKey, ThrottlePolicy};
pub use token::{IssuedToken, TokenSigner, TokenVerifier};
pub use validator::TokenValidator;
