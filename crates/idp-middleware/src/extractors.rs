//! # Request Context Extractors
//!
//! Typed access to what [`authentication_middleware`] stored in the request
//! extensions. Each extractor rejects with 401 when the value is absent, which
//! means the route was not behind the authentication gate or the gate did not
//! let the request through.
//!
//! [`authentication_middleware`]: crate::auth::authentication_middleware

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use idp_client::{IdpSession, User};

use crate::error::GateError;

/// The local principal resolved for the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal<P>(pub P);

/// The IDP session opened for this request.
#[derive(Debug, Clone)]
pub struct RequestSession(pub IdpSession);

/// The IDP user returned by token validation.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedUser(pub User);

fn from_extensions<T: Clone + Send + Sync + 'static>(
    parts: &Parts,
    what: &str,
) -> Result<T, GateError> {
    parts
        .extensions
        .get::<T>()
        .cloned()
        .ok_or_else(|| GateError::Unauthorized(format!("no {what} in request context")))
}

#[axum::async_trait]
impl<S, P> FromRequestParts<S> for Principal<P>
where
    S: Send + Sync,
    P: Clone + Send + Sync + 'static,
{
    type Rejection = GateError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        from_extensions::<Principal<P>>(parts, "authenticated principal")
    }
}

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RequestSession {
    type Rejection = GateError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        from_extensions::<IdpSession>(parts, "IDP session").map(Self)
    }
}

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AuthenticatedUser {
    type Rejection = GateError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        from_extensions::<User>(parts, "IDP user").map(Self)
    }
}
