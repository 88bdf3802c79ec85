/// gRPC service implementation for Auth Service
///
/// Same flows as the REST handlers; every failure leaves as a status whose
/// message is the error category and nothing more.
use grpc_jwt_propagation::{auth_error_to_status, metadata_token};
use tonic::metadata::MetadataMap;
use tonic::{Request, Response, Status};
use tracing::{debug, warn};

use crate::{
    proto::{
        auth_service_server::AuthService, LoginRequest, LoginResponse, LogoutRequest,
        LogoutResponse, ValidateTokenRequest, ValidateTokenResponse,
    },
    AppState,
};

const FORWARDED_FOR: &str = "x-forwarded-for";

/// gRPC AuthService implementation
pub struct AuthGrpcService {
    state: AppState,
}

impl AuthGrpcService {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

/// Peer IP, or the first `x-forwarded-for` hop when forwarding headers are
/// trusted; "unknown" when neither is available.
fn request_origin<T>(request: &Request<T>, trust_forwarded: bool) -> String {
    let forwarded = if trust_forwarded {
        forwarded_for(request.metadata())
    } else {
        None
    };

    forwarded
        .or_else(|| request.remote_addr().map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

fn forwarded_for(metadata: &MetadataMap) -> Option<String> {
    metadata
        .get(FORWARDED_FOR)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|hop| !hop.is_empty())
        .map(str::to_string)
}

#[tonic::async_trait]
impl AuthService for AuthGrpcService {
    async fn login(
        &self,
        request: Request<LoginRequest>,
    ) -> Result<Response<LoginResponse>, Status> {
        let origin = request_origin(&request, self.state.trust_forwarded_headers);
        let req = request.into_inner();

        let outcome = self
            .state
            .auth
            .login(&req.email, &req.password, &origin)
            .await?;

        Ok(Response::new(LoginResponse {
            expires_in: outcome.issued.expires_in(),
            access_token: outcome.issued.token,
            user_id: outcome.user_id.to_string(),
            role: outcome.role.as_str().to_string(),
        }))
    }

    /// Rejections come back as `valid = false` with the category in `error`;
    /// only non-authentication failures surface as a status.
    async fn validate_token(
        &self,
        request: Request<ValidateTokenRequest>,
    ) -> Result<Response<ValidateTokenResponse>, Status> {
        let req = request.into_inner();

        if req.token.trim().is_empty() {
            return Ok(Response::new(ValidateTokenResponse {
                valid: false,
                error: "missing_token".to_string(),
                ..Default::default()
            }));
        }

        match self.state.auth.validate(req.token.trim()).await {
            Ok(claims) => {
                debug!(event = "token_valid", user_id = %claims.sub, jti = %claims.jti);
                Ok(Response::new(ValidateTokenResponse {
                    valid: true,
                    user_id: claims.sub,
                    role: claims.role.as_str().to_string(),
                    error: String::new(),
                }))
            }
            Err(e) if e.is_authentication_failure() => {
                debug!(event = "token_rejected", reason = e.category());
                Ok(Response::new(ValidateTokenResponse {
                    valid: false,
                    error: e.category().to_string(),
                    ..Default::default()
                }))
            }
            Err(e) => {
                warn!(event = "token_validation_error", error = %e);
                Err(auth_error_to_status(&e))
            }
        }
    }

    async fn logout(
        &self,
        request: Request<LogoutRequest>,
    ) -> Result<Response<LogoutResponse>, Status> {
        let from_metadata = metadata_token(request.metadata())
            .ok()
            .map(str::to_string);
        let req = request.into_inner();

        let token = if req.token.trim().is_empty() {
            from_metadata.ok_or_else(|| Status::unauthenticated("missing_token"))?
        } else {
            req.token.trim().to_string()
        };

        self.state.auth.logout(&token).await?;
        Ok(Response::new(LogoutResponse {}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_origin_uses_first_forwarded_hop() {
        let mut request = Request::new(());
        request
            .metadata_mut()
            .insert(FORWARDED_FOR, "203.0.113.7, 10.0.0.1".parse().unwrap());
        assert_eq!(request_origin(&request, true), "203.0.113.7");
        assert_eq!(request_origin(&request, false), "unknown");
    }

    #[test]
    fn test_request_origin_unknown() {
        let request = Request::new(());
        assert_eq!(request_origin(&request, true), "unknown");
    }
}
