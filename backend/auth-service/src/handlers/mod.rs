/// HTTP request handlers (REST API)
pub mod auth;

pub use auth::{
    client_origin, configure, health, login, logout, LoginRequest, LoginResponse, LogoutResponse,
};
