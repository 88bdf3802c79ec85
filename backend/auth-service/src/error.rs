use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use jwt_security::AuthError;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, ServiceError>;

/// Error body shared by every HTTP endpoint
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error category, e.g. `invalid_credentials`
    pub error: String,
    pub status: u16,
}

impl ServiceError {
    /// Wire-safe category; internal detail stays in the logs.
    pub fn category(&self) -> &'static str {
        match self {
            ServiceError::Auth(e) => e.category(),
            ServiceError::Validation(_) => "invalid_request",
            ServiceError::Database(_) | ServiceError::Internal(_) => "internal_error",
        }
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        ServiceError::Database(err.to_string())
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Auth(e) => match e {
                AuthError::TooManyAttempts => StatusCode::TOO_MANY_REQUESTS,
                AuthError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                e if e.is_authentication_failure() => StatusCode::UNAUTHORIZED,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Database(_) | ServiceError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        HttpResponse::build(status).json(ErrorResponse {
            error: self.category().to_string(),
            status: status.as_u16(),
        })
    }
}

impl From<ServiceError> for tonic::Status {
    fn from(err: ServiceError) -> Self {
        match &err {
            ServiceError::Auth(e) => grpc_jwt_propagation::auth_error_to_status(e),
            ServiceError::Validation(_) => tonic::Status::invalid_argument("invalid_request"),
            ServiceError::Database(_) | ServiceError::Internal(_) => {
                tracing::error!(error = %err, "RPC failed");
                tonic::Status::internal("internal_error")
            }
        }
    }
}
