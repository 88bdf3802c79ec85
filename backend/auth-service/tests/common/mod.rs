//! Shared fixtures: an in-memory credential store and a service wired to an
//! in-memory shared store.
#![allow(dead_code)]

use async_trait::async_trait;
use auth_service::{db::UserRecord, db::UserRepository, AppState, Result, TokenAuthService};
use jwt_security::{
    hash_password, FailureMode, InMemoryStore, LoginThrottle, RevocationLedger, Role,
    SigningSecret, ThrottlePolicy, TokenSigner, TokenValidator, TokenVerifier,
};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub const SECRET: &str = "Qm7vT2xWp9LrK4sZn8YbHc3JdF6gAe5U";

pub const ALICE_EMAIL: &str = "alice@example.com";
pub const ALICE_PASSWORD: &str = "Correct-Horse-42";
pub const BOB_EMAIL: &str = "bob@example.com";
pub const BOB_PASSWORD: &str = "Battery-Staple-7";

pub static ALICE_ID: Lazy<Uuid> = Lazy::new(Uuid::new_v4);
pub static BOB_ID: Lazy<Uuid> = Lazy::new(Uuid::new_v4);

static ALICE_HASH: Lazy<String> = Lazy::new(|| hash_password(ALICE_PASSWORD).unwrap());
static BOB_HASH: Lazy<String> = Lazy::new(|| hash_password(BOB_PASSWORD).unwrap());

/// Counts lookups so tests can tell whether a login reached the credential
/// check at all.
pub struct InMemoryUsers {
    users: HashMap<String, UserRecord>,
    lookups: AtomicUsize,
}

impl InMemoryUsers {
    pub fn seeded() -> Self {
        let mut users = HashMap::new();
        users.insert(
            ALICE_EMAIL.to_string(),
            UserRecord {
                id: *ALICE_ID,
                email: ALICE_EMAIL.to_string(),
                role: Role::Employee,
                password_hash: ALICE_HASH.clone(),
            },
        );
        users.insert(
            BOB_EMAIL.to_string(),
            UserRecord {
                id: *BOB_ID,
                email: BOB_EMAIL.to_string(),
                role: Role::Admin,
                password_hash: BOB_HASH.clone(),
            },
        );
        Self {
            users,
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.users.get(email).cloned())
    }
}

pub struct TestContext {
    pub users: Arc<InMemoryUsers>,
    pub store: Arc<InMemoryStore>,
    pub validator: Arc<TokenValidator>,
    pub state: AppState,
}

pub fn context() -> TestContext {
    context_with_modes(FailureMode::FailClosed, FailureMode::FailOpen)
}

pub fn context_with_modes(revocation: FailureMode, throttle: FailureMode) -> TestContext {
    let secret = SigningSecret::new(SECRET).unwrap();
    let store = Arc::new(InMemoryStore::new());

    let validator = Arc::new(TokenValidator::new(
        TokenVerifier::new(&secret),
        RevocationLedger::new(store.clone()),
        revocation,
    ));
    let throttle = LoginThrottle::new(
        store.clone(),
        ThrottlePolicy::new(5, Duration::from_secs(600)).unwrap(),
        throttle,
    );

    let users = Arc::new(InMemoryUsers::seeded());
    let service = TokenAuthService::new(
        users.clone(),
        TokenSigner::new(&secret),
        validator.clone(),
        throttle,
        Duration::from_secs(3600),
    );

    TestContext {
        users,
        store,
        validator,
        state: AppState::new(Arc::new(service), false).with_trusted_forwarding(true),
    }
}
