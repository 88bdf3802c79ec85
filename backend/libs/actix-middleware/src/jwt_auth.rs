use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::StatusCode,
    Error, HttpMessage, HttpResponse, ResponseError,
};
use chrono::{DateTime, Utc};
use futures::future::{ready, Ready};
use jwt_security::{
    token_from_request_parts, AuthError, Claims, Role, TokenValidator, ACCESS_TOKEN_COOKIE,
};
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;

/// Identity of a request that passed [`JwtAuthMiddleware`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub role: Role,
    pub token_id: String,
    pub expires_at: DateTime<Utc>,
}

impl From<Claims> for AuthenticatedUser {
    fn from(claims: Claims) -> Self {
        let expires_at = claims.expires_at();
        Self {
            user_id: claims.sub,
            role: claims.role,
            token_id: claims.jti,
            expires_at,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    status: u16,
}

/// Rejection returned by the middleware and the extractor.
///
/// Only the error category reaches the client.
#[derive(Debug)]
pub struct AuthRejection(pub AuthError);

impl fmt::Display for AuthRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.category())
    }
}

impl ResponseError for AuthRejection {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            AuthError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::TooManyAttempts => StatusCode::TOO_MANY_REQUESTS,
            e if e.is_authentication_failure() => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        HttpResponse::build(status).json(ErrorBody {
            error: self.0.category(),
            status: status.as_u16(),
        })
    }
}

/// JWT Authentication Middleware
///
/// Reads the bearer token (or the `access_token` cookie), validates it with
/// the shared [`TokenValidator`] including the revocation check, and inserts
/// [`AuthenticatedUser`] into the request extensions.
#[derive(Clone)]
pub struct JwtAuthMiddleware {
    validator: Arc<TokenValidator>,
}

impl JwtAuthMiddleware {
    pub fn new(validator: Arc<TokenValidator>) -> Self {
        Self { validator }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = JwtAuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddlewareService {
            service: Rc::new(service),
            validator: self.validator.clone(),
        }))
    }
}

pub struct JwtAuthMiddlewareService<S> {
    service: Rc<S>,
    validator: Arc<TokenValidator>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let validator = self.validator.clone();

        Box::pin(async move {
            let token = {
                let header = req
                    .headers()
                    .get(actix_web::http::header::AUTHORIZATION)
                    .and_then(|h| h.to_str().ok());
                let cookie = req.cookie(ACCESS_TOKEN_COOKIE);
                token_from_request_parts(header, cookie.as_ref().map(|c| c.value()))
                    .map(str::to_owned)
                    .map_err(AuthRejection)?
            };

            let claims = validator.validate(&token).await.map_err(|e| {
                tracing::warn!(
                    event = "token_rejected",
                    reason = e.category(),
                    path = %req.path(),
                    "JWT validation failed"
                );
                AuthRejection(e)
            })?;

            req.extensions_mut().insert(AuthenticatedUser::from(claims));

            service.call(req).await
        })
    }
}

impl actix_web::FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        _payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        match req.extensions().get::<AuthenticatedUser>() {
            Some(user) => ready(Ok(user.clone())),
            None => ready(Err(AuthRejection(AuthError::MissingToken).into())),
        }
    }
}
