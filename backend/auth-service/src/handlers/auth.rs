/// Authentication handlers
use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::{http::header, web, HttpRequest, HttpResponse};
use jwt_security::{token_from_request_parts, Role, ACCESS_TOKEN_COOKIE};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{error::ErrorResponse, error::ServiceError, AppState};

/// Login request body
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response with the access token
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    /// Seconds until the token expires
    pub expires_in: i64,
    pub user_id: Uuid,
    #[schema(value_type = String, example = "employee")]
    pub role: Role,
}

/// Logout response
#[derive(Debug, Serialize, ToSchema)]
pub struct LogoutResponse {
    pub message: String,
}

/// Client address used in the throttle key, without the port.
///
/// Forwarding headers are read only when `trust_forwarded` is set; otherwise
/// the socket peer is used. "unknown" when nothing is available.
pub fn client_origin(req: &HttpRequest, trust_forwarded: bool) -> String {
    if !trust_forwarded {
        return req
            .peer_addr()
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string());
    }

    let info = req.connection_info();
    match info.realip_remote_addr() {
        Some(addr) => addr
            .parse::<SocketAddr>()
            .map(|socket| socket.ip().to_string())
            .unwrap_or_else(|_| addr.to_string()),
        None => "unknown".to_string(),
    }
}

fn access_token_cookie(token: String, max_age_secs: i64, secure: bool) -> Cookie<'static> {
    Cookie::build(ACCESS_TOKEN_COOKIE, token)
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::seconds(max_age_secs))
        .finish()
}

/// Login endpoint handler
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "User logged in", body = LoginResponse),
        (status = 400, description = "Malformed request", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 429, description = "Too many failed attempts", body = ErrorResponse),
        (status = 503, description = "Shared store unavailable", body = ErrorResponse)
    )
)]
pub async fn login(
    state: web::Data<AppState>,
    req: HttpRequest,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, ServiceError> {
    let origin = client_origin(&req, state.trust_forwarded_headers);
    let outcome = state
        .auth
        .login(&payload.email, &payload.password, &origin)
        .await?;

    let expires_in = outcome.issued.expires_in();
    let cookie = access_token_cookie(
        outcome.issued.token.clone(),
        expires_in,
        state.https_enabled,
    );

    Ok(HttpResponse::Ok().cookie(cookie).json(LoginResponse {
        access_token: outcome.issued.token,
        token_type: "Bearer".to_string(),
        expires_in,
        user_id: outcome.user_id,
        role: outcome.role,
    }))
}

/// Logout endpoint handler
///
/// Revokes the presented token (header or cookie) and clears the cookie.
#[utoipa::path(
    delete,
    path = "/api/v1/auth/logout",
    tag = "Auth",
    responses(
        (status = 200, description = "User logged out", body = LogoutResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 503, description = "Shared store unavailable", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn logout(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, ServiceError> {
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    let cookie = req.cookie(ACCESS_TOKEN_COOKIE);
    let token = token_from_request_parts(authorization, cookie.as_ref().map(|c| c.value()))?;

    state.auth.logout(token).await?;

    let mut removal = access_token_cookie(String::new(), 0, state.https_enabled);
    removal.make_removal();

    Ok(HttpResponse::Ok().cookie(removal).json(LogoutResponse {
        message: "logged_out".to_string(),
    }))
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, description = "Service is up", body = String))
)]
pub async fn health() -> &'static str {
    "OK"
}

/// Register the REST routes on an actix `App`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/metrics", web::get().to(crate::metrics::metrics_handler))
        .route("/api/v1/openapi.json", web::get().to(crate::openapi::openapi_json))
        .service(
            web::scope("/api/v1/auth")
                .route("/login", web::post().to(login))
                .route("/logout", web::delete().to(logout)),
        );
}
