pub mod auth_service;

pub use auth_service::{normalize_email, LoginOutcome, TokenAuthService};
