//! # Authentication Gate
//!
//! Authenticates inbound requests by asking the IDP to validate the caller's
//! bearer token, then maps the returned IDP user onto a local principal.
//!
//! ```text
//! Start ─▶ TokenExtracted ─▶ RemoteValidated ─▶ IdentityResolved ─▶ Authenticated
//!   │            │                  │
//!   └────────────┴──────────────────┴──▶ Rejected (401)
//! ```
//!
//! Every failure is fail-closed. With diagnostics on, the rejection carries the
//! specific reason (including the IDP error text verbatim); with diagnostics
//! off every rejection reads "Failed to authenticate user.".
//!
//! ## Request Context
//!
//! [`authentication_middleware`] opens one [`IdpSession`] per request and, on
//! success, stores it in the request extensions together with the validated
//! IDP [`User`] and the resolved [`Principal`]. Handlers pull them out with the
//! extractors in [`crate::extractors`], so follow-up IDP calls reuse the
//! request's server-token scope.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use idp_client::{IdpClient, IdpSession, User};
use parking_lot::RwLock;

use crate::bearer::bearer_token;
use crate::error::GateError;
use crate::extractors::Principal;

/// Reason returned for every rejection when diagnostics are off.
pub const GENERIC_UNAUTHENTICATED: &str = "Failed to authenticate user.";

/// Diagnostic reason: the request has no bearer token.
pub const NO_TOKEN: &str = "No auth token provided";

/// Diagnostic reason: the IDP user has no local counterpart.
pub const UNKNOWN_USER: &str = "Could not find the specified user.";

// ── Principal resolution ────────────────────────────────────────────────────

/// Maps an IDP user id to the host application's own notion of a user.
#[async_trait]
pub trait PrincipalResolver: Send + Sync + 'static {
    /// The host's user type, stored in request extensions on success.
    type Principal: Clone + Send + Sync + 'static;

    /// `None` when the id is unknown locally.
    async fn resolve(&self, user_id: &str) -> Option<Self::Principal>;
}

/// In-memory principal store keyed by IDP user id.
#[derive(Debug)]
pub struct PrincipalDirectory<P> {
    principals: RwLock<HashMap<String, P>>,
}

impl<P> Default for PrincipalDirectory<P> {
    fn default() -> Self {
        Self {
            principals: RwLock::new(HashMap::new()),
        }
    }
}

impl<P> PrincipalDirectory<P> {
    /// An empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `principal` under `user_id`, returning any previous entry.
    pub fn insert(&self, user_id: impl Into<String>, principal: P) -> Option<P> {
        self.principals.write().insert(user_id.into(), principal)
    }

    /// Forget `user_id`, returning its principal if one was registered.
    pub fn remove(&self, user_id: &str) -> Option<P> {
        self.principals.write().remove(user_id)
    }

    /// Number of registered principals.
    pub fn len(&self) -> usize {
        self.principals.read().len()
    }

    /// Whether no principal is registered.
    pub fn is_empty(&self) -> bool {
        self.principals.read().is_empty()
    }
}

#[async_trait]
impl<P: Clone + Send + Sync + 'static> PrincipalResolver for PrincipalDirectory<P> {
    type Principal = P;

    async fn resolve(&self, user_id: &str) -> Option<P> {
        self.principals.read().get(user_id).cloned()
    }
}

// ── Gate ────────────────────────────────────────────────────────────────────

/// Outcome of a successful authentication.
#[derive(Debug, Clone)]
pub struct Authenticated<P> {
    /// The user the IDP returned for the token.
    pub user: User,
    /// The local principal for that user.
    pub principal: P,
}

/// Remote bearer-token authentication with local principal resolution.
pub struct AuthenticationGate<R> {
    client: IdpClient,
    resolver: Arc<R>,
    diagnostics: bool,
}

impl<R> Clone for AuthenticationGate<R> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            resolver: Arc::clone(&self.resolver),
            diagnostics: self.diagnostics,
        }
    }
}

impl<R> std::fmt::Debug for AuthenticationGate<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticationGate")
            .field("client", &self.client)
            .field("diagnostics", &self.diagnostics)
            .finish_non_exhaustive()
    }
}

impl<R: PrincipalResolver> AuthenticationGate<R> {
    /// Gate with diagnostics off.
    pub fn new(client: IdpClient, resolver: R) -> Self {
        Self::with_shared_resolver(client, Arc::new(resolver))
    }

    /// Build a gate around a resolver the host also uses elsewhere.
    pub fn with_shared_resolver(client: IdpClient, resolver: Arc<R>) -> Self {
        Self {
            client,
            resolver,
            diagnostics: false,
        }
    }

    /// Surface specific rejection reasons instead of the generic one.
    pub fn with_diagnostics(mut self, diagnostics: bool) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Client used to open one session per request.
    pub fn client(&self) -> &IdpClient {
        &self.client
    }

    /// Run the state machine for one request.
    ///
    /// Token validation goes through `session`, so the server token it
    /// obtains is reused by later calls in the same request.
    pub async fn authenticate(
        &self,
        session: &IdpSession,
        headers: &HeaderMap,
    ) -> Result<Authenticated<R::Principal>, GateError> {
        let Some(token) = bearer_token(headers) else {
            tracing::warn!(stage = "token_extraction", "authentication rejected: no bearer token");
            return Err(self.reject(NO_TOKEN));
        };

        let user = match session.validate_user_token(token, None).await {
            Ok(user) => user,
            Err(err) => {
                tracing::warn!(
                    stage = "remote_validation",
                    error = %err,
                    status = ?err.status(),
                    "authentication rejected: IDP did not validate token"
                );
                return Err(self.reject(err.to_string()));
            }
        };

        let user_id = user.id.clone().filter(|id| !id.is_empty());
        let principal = match user_id.as_deref() {
            Some(id) => self.resolver.resolve(id).await,
            None => None,
        };
        let Some(principal) = principal else {
            tracing::warn!(
                stage = "identity_resolution",
                user_id = ?user_id,
                "authentication rejected: no local principal"
            );
            return Err(self.reject(UNKNOWN_USER));
        };

        tracing::debug!(user_id = ?user_id, "request authenticated");
        Ok(Authenticated { user, principal })
    }

    fn reject(&self, reason: impl Into<String>) -> GateError {
        if self.diagnostics {
            GateError::Unauthorized(reason.into())
        } else {
            GateError::Unauthorized(GENERIC_UNAUTHENTICATED.to_string())
        }
    }
}

/// Axum middleware applying an [`AuthenticationGate`].
///
/// ```ignore
/// let gate = Arc::new(AuthenticationGate::new(client, directory));
/// router.route_layer(axum::middleware::from_fn_with_state(
///     gate,
///     authentication_middleware::<PrincipalDirectory<LocalUser>>,
/// ))
/// ```
pub async fn authentication_middleware<R: PrincipalResolver>(
    State(gate): State<Arc<AuthenticationGate<R>>>,
    mut request: Request,
    next: Next,
) -> Response {
    let session = gate.client().session();
    let outcome = gate.authenticate(&session, request.headers()).await;
    match outcome {
        Ok(Authenticated { user, principal }) => {
            let extensions = request.extensions_mut();
            extensions.insert(session);
            extensions.insert(user);
            extensions.insert(Principal(principal));
            next.run(request).await
        }
        Err(rejection) => rejection.into_response(),
    }
}
