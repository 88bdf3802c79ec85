//! Request Extension Trait for JWT Claims Access
//!
//! Reads the claims that [`crate::GrpcAuthenticator::authenticate`] stored in
//! the request extensions.

use jwt_security::{Claims, Role};
use tonic::{Request, Status};

/// Extension trait for accessing validated claims from gRPC requests
///
/// ## Usage
///
/// ```rust,no_run
/// use grpc_jwt_propagation::JwtClaimsExt;
/// use jwt_security::Role;
/// use tonic::{Request, Response, Status};
///
/// async fn delete_task(request: Request<()>) -> Result<Response<()>, Status> {
///     request.require_role(Role::Admin)?;
///     Ok(Response::new(()))
/// }
/// ```
pub trait JwtClaimsExt {
    /// `Status::unauthenticated` if the request was never authenticated.
    fn jwt_claims(&self) -> Result<&Claims, Status>;

    /// The authenticated subject must equal `subject`.
    fn require_subject(&self, subject: &str) -> Result<&Claims, Status>;

    fn require_role(&self, role: Role) -> Result<&Claims, Status>;
}

impl<T> JwtClaimsExt for Request<T> {
    fn jwt_claims(&self) -> Result<&Claims, Status> {
        self.extensions()
            .get::<Claims>()
            .ok_or_else(|| Status::unauthenticated("missing_token"))
    }

    fn require_subject(&self, subject: &str) -> Result<&Claims, Status> {
        let claims = self.jwt_claims()?;

        if claims.sub != subject {
            return Err(Status::permission_denied(
                "You do not have permission to access this resource",
            ));
        }

        Ok(claims)
    }

    fn require_role(&self, role: Role) -> Result<&Claims, Status> {
        let claims = self.jwt_claims()?;

        if claims.role != role {
            return Err(Status::permission_denied(format!("{} role required", role)));
        }

        Ok(claims)
    }
}
