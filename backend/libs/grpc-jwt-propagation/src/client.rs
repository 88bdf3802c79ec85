//! Client-side JWT Interceptor
//!
//! Injects the bearer token into outgoing gRPC requests via metadata.

use tonic::metadata::{AsciiMetadataValue, MetadataMap};
use tonic::service::Interceptor;
use tonic::{Request, Status};

pub(crate) const AUTHORIZATION: &str = "authorization";

/// Client-side interceptor that adds `authorization: Bearer {token}` to every
/// outgoing request.
///
/// ## Usage
///
/// ```rust,no_run
/// use grpc_jwt_propagation::JwtClientInterceptor;
/// use tonic::transport::Channel;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let interceptor = JwtClientInterceptor::new("eyJhbGc...")?;
///
/// let channel = Channel::from_static("http://[::1]:50051")
///     .connect()
///     .await?;
///
/// // let mut client = SomeServiceClient::with_interceptor(channel, interceptor);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct JwtClientInterceptor {
    /// Pre-formatted "Bearer {token}", parsed once
    auth_header: AsciiMetadataValue,
}

impl JwtClientInterceptor {
    /// Fails with `Status::invalid_argument` if the token is not valid
    /// metadata ASCII. A real compact JWS never is.
    pub fn new(jwt_token: impl Into<String>) -> Result<Self, Status> {
        let token_value = format!("Bearer {}", jwt_token.into());

        let auth_header = AsciiMetadataValue::try_from(token_value)
            .map_err(|_| Status::invalid_argument("token contains invalid characters"))?;

        Ok(Self { auth_header })
    }

    /// Forward an already-parsed authorization value (gateway case).
    pub fn from_header(auth_header: AsciiMetadataValue) -> Self {
        Self { auth_header }
    }

    pub fn extract_from_metadata(metadata: &MetadataMap) -> Result<&AsciiMetadataValue, Status> {
        metadata
            .get(AUTHORIZATION)
            .ok_or_else(|| Status::unauthenticated("missing_token"))
    }
}

impl Interceptor for JwtClientInterceptor {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        request
            .metadata_mut()
            .insert(AUTHORIZATION, self.auth_header.clone());

        Ok(request)
    }
}
