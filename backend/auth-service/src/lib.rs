// Auth Service Library

pub mod config;
pub mod db;
pub mod error;
pub mod grpc;
pub mod handlers;
pub mod metrics;
pub mod openapi;
pub mod services;

pub use error::{Result, ServiceError};
pub use services::TokenAuthService;

/// Generated from proto/auth_service.proto
pub mod proto {
    tonic::include_proto!("tasksys.auth.v1");
}

use std::sync::Arc;

/// Shared by the HTTP handlers and the gRPC service
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<TokenAuthService>,
    /// Marks the access-token cookie `Secure`
    pub https_enabled: bool,
    /// Take the throttle origin from forwarding headers instead of the peer
    pub trust_forwarded_headers: bool,
}

impl AppState {
    pub fn new(auth: Arc<TokenAuthService>, https_enabled: bool) -> Self {
        Self {
            auth,
            https_enabled,
            trust_forwarded_headers: false,
        }
    }

    pub fn with_trusted_forwarding(mut self, trust: bool) -> Self {
        self.trust_forwarded_headers = trust;
        self
    }
}
