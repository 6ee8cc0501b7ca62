//! # idp-middleware -- Axum Gates for the IDP Integration Layer
//!
//! Two gates a host puts in front of its routes:
//!
//! - **[`AuthenticationGate`]**: validates the caller's bearer token with the
//!   IDP and resolves a local principal. Rejections are 401.
//! - **[`ScopeGate`]**: inspects the token's `scopes` claim locally, in "any"
//!   or "all" mode. Rejections are 403.
//!
//! Both are registered with `axum::middleware::from_fn_with_state` and reply
//! with the JSON envelope in [`error`]. Handlers behind the authentication
//! gate read the request context through [`extractors`].
//!
//! ## Crate Policy
//!
//! - Gates never trust a token they could not decode or validate: every error
//!   path rejects.
//! - Specific rejection reasons are only surfaced when a gate is built with
//!   diagnostics on.

pub mod auth;
pub mod bearer;
pub mod demo;
pub mod error;
pub mod extractors;
pub mod scope;

pub use auth::{
    authentication_middleware, Authenticated, AuthenticationGate, PrincipalDirectory,
    PrincipalResolver,
};
pub use bearer::bearer_token;
pub use error::GateError;
pub use extractors::{AuthenticatedUser, Principal, RequestSession};
pub use scope::{scope_middleware, ScopeGate};
