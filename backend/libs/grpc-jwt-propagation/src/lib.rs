//! JWT Credential Propagation for gRPC Microservices
//!
//! ## Core Components
//!
//! - **JwtClientInterceptor**: injects the bearer token into outgoing gRPC metadata
//! - **GrpcAuthenticator**: validates the incoming metadata token with the shared
//!   `TokenValidator`, revocation included
//! - **JwtClaimsExt**: request extension trait for reading claims and checking roles
//!
//! ## Security Guarantees
//!
//! - HS256 only, same validator as the HTTP middleware
//! - No token = `Status::unauthenticated("missing_token")`
//! - Invalid, expired or revoked token = `Status::unauthenticated(<category>)`
//! - Wrong role or subject = `Status::permission_denied`

mod client;
mod extensions;
mod server;

pub use client::JwtClientInterceptor;
pub use extensions::JwtClaimsExt;
pub use server::{auth_error_to_status, metadata_token, GrpcAuthenticator};

// Re-export tonic Status for convenience
pub use tonic::Status;
