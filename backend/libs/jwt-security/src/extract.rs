//! Token extraction shared by the HTTP middleware, HTTP handlers and the gRPC
//! authenticator.

use crate::error::AuthError;

/// Cookie carrying the access token for browser clients.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

const BEARER_SCHEME: &str = "bearer";

/// Token from an `Authorization` value. The scheme is case-insensitive.
pub fn bearer_token(header: &str) -> Option<&str> {
    let header = header.trim();
    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return None;
    }

    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Header first, then the cookie.
pub fn token_from_request_parts<'a>(
    authorization: Option<&'a str>,
    cookie: Option<&'a str>,
) -> Result<&'a str, AuthError> {
    if let Some(token) = authorization.and_then(bearer_token) {
        return Ok(token);
    }

    cookie
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingToken)
}
