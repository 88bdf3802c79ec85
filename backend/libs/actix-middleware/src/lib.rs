//! # Actix Middleware Library
//!
//! Token authentication for actix-web services.
//!
//! ## Modules
//! - `jwt_auth`: JWT authentication middleware and the `AuthenticatedUser` extractor

pub mod jwt_auth;

pub use jwt_auth::{AuthRejection, AuthenticatedUser, JwtAuthMiddleware};
