//! Server-side token authentication
//!
//! tonic interceptors are synchronous and can't reach the revocation ledger,
//! so handlers call [`GrpcAuthenticator::authenticate`] instead. It applies the
//! same [`TokenValidator`] as the HTTP middleware.

use crate::client::AUTHORIZATION;
use jwt_security::{token_from_request_parts, AuthError, Claims, TokenValidator};
use std::sync::Arc;
use tonic::metadata::MetadataMap;
use tonic::{Request, Status};
use tracing::{debug, warn};

/// Map an [`AuthError`] to a gRPC status carrying only the category string.
pub fn auth_error_to_status(err: &AuthError) -> Status {
    let category = err.category();
    match err {
        AuthError::TooManyAttempts => Status::resource_exhausted(category),
        AuthError::StoreUnavailable(_) => Status::unavailable(category),
        e if e.is_authentication_failure() => Status::unauthenticated(category),
        _ => Status::internal(category),
    }
}

/// Bearer token from the `authorization` metadata entry.
pub fn metadata_token(metadata: &MetadataMap) -> Result<&str, AuthError> {
    let header = metadata
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    token_from_request_parts(header, None)
}

#[derive(Clone)]
pub struct GrpcAuthenticator {
    validator: Arc<TokenValidator>,
}

impl GrpcAuthenticator {
    pub fn new(validator: Arc<TokenValidator>) -> Self {
        Self { validator }
    }

    /// Validate the metadata token, including the revocation check, and
    /// store the claims in the request extensions for [`crate::JwtClaimsExt`].
    pub async fn authenticate<T>(&self, request: &mut Request<T>) -> Result<Claims, Status> {
        let claims = self.validate_metadata(request.metadata()).await?;
        request.extensions_mut().insert(claims.clone());
        Ok(claims)
    }

    pub async fn validate_metadata(&self, metadata: &MetadataMap) -> Result<Claims, Status> {
        let token = metadata_token(metadata).map_err(|e| auth_error_to_status(&e))?;

        match self.validator.validate(token).await {
            Ok(claims) => {
                debug!(sub = %claims.sub, jti = %claims.jti, "gRPC token validated");
                Ok(claims)
            }
            Err(e) => {
                warn!(
                    event = "token_rejected",
                    reason = e.category(),
                    "gRPC token validation failed"
                );
                Err(auth_error_to_status(&e))
            }
        }
    }
}
