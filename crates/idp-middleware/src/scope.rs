//! # Scope Gate
//!
//! Local, network-free authorization: the caller's bearer token is decoded
//! without signature verification and its `scopes` claim is matched against a
//! [`ScopeRequirement`].
//!
//! ```text
//! bearer token? ── no ──▶ 403 "No auth token provided"
//!      │ yes
//! decode ── error ─▶ 403
//!      │
//! scopes claim ── missing / not strings ─▶ 403
//!      │
//! Any: ≥1 required scope granted   All: every required scope granted
//!      │ satisfied                      otherwise ─▶ 403
//!    next
//! ```
//!
//! Rejection reasons name the required scopes only when diagnostics are on;
//! otherwise a generic reason is returned. Signature and expiry checks are the
//! job of the authentication gate (remote validation), not this one.
//!
//! Register with `from_fn_with_state`:
//!
//! ```ignore
//! let gate = Arc::new(ScopeGate::all(["organizations:read"])?);
//! router.layer(axum::middleware::from_fn_with_state(gate, scope_middleware))
//! ```

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use idp_core::{ScopeConfigError, ScopeDenied, ScopeRequirement};

use crate::bearer::bearer_token;
use crate::error::GateError;

/// Reason returned when diagnostics are off.
pub const GENERIC_FORBIDDEN: &str = "You are not authorized to access this resource.";

/// Reason returned when the request carries no bearer token.
pub const NO_TOKEN: &str = "No auth token provided";

/// A scope requirement bound to a route.
#[derive(Debug, Clone)]
pub struct ScopeGate {
    requirement: ScopeRequirement,
    diagnostics: bool,
}

impl ScopeGate {
    /// Gate for an already validated requirement, diagnostics off.
    pub fn new(requirement: ScopeRequirement) -> Self {
        Self {
            requirement,
            diagnostics: false,
        }
    }

    /// Pass when at least one of `scopes` is granted.
    pub fn any<I, S>(scopes: I) -> Result<Self, ScopeConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScopeRequirement::any(scopes).map(Self::new)
    }

    /// Pass only when every one of `scopes` is granted.
    pub fn all<I, S>(scopes: I) -> Result<Self, ScopeConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScopeRequirement::all(scopes).map(Self::new)
    }

    /// Include the required scopes and the failure cause in rejections.
    pub fn with_diagnostics(mut self, diagnostics: bool) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// The scopes this gate checks.
    pub fn requirement(&self) -> &ScopeRequirement {
        &self.requirement
    }

    /// Decide whether a request with these headers may proceed.
    pub fn authorize(&self, headers: &HeaderMap) -> Result<(), GateError> {
        let Some(token) = bearer_token(headers) else {
            tracing::warn!(stage = "token_extraction", "scope gate rejected request: no bearer token");
            return Err(GateError::Forbidden(NO_TOKEN.to_string()));
        };

        let decoded = match idp_core::decode(token) {
            Ok(decoded) => decoded,
            Err(err) => {
                tracing::warn!(stage = "decode", error = %err, "scope gate rejected request");
                return Err(self.reject(Some(err.to_string())));
            }
        };

        match self.requirement.evaluate(&decoded) {
            Ok(()) => Ok(()),
            Err(ScopeDenied::Insufficient) => {
                tracing::warn!(
                    stage = "scope_match",
                    mode = %self.requirement.mode(),
                    required = ?self.requirement.scopes(),
                    "scope gate rejected request: required scopes not granted"
                );
                Err(self.reject(None))
            }
            Err(denied) => {
                tracing::warn!(stage = "scope_claim", reason = %denied, "scope gate rejected request");
                Err(self.reject(Some(denied.to_string())))
            }
        }
    }

    fn reject(&self, cause: Option<String>) -> GateError {
        if !self.diagnostics {
            return GateError::Forbidden(GENERIC_FORBIDDEN.to_string());
        }
        let reason = match cause {
            Some(cause) => format!("{} ({cause})", self.requirement.describe()),
            None => self.requirement.describe(),
        };
        GateError::Forbidden(reason)
    }
}

/// Axum middleware applying a [`ScopeGate`].
pub async fn scope_middleware(
    State(gate): State<Arc<ScopeGate>>,
    request: Request,
    next: Next,
) -> Response {
    match gate.authorize(request.headers()) {
        Ok(()) => next.run(request).await,
        Err(rejection) => rejection.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderValue};
    use serde_json::{json, Map, Value};

    fn token_with(payload: Value) -> String {
        let header = json!({"alg": "HS256", "typ": "JWT"});
        let as_map = |v: Value| -> Map<String, Value> {
            match v {
                Value::Object(map) => map,
                _ => unreachable!(),
            }
        };
        format!("{}.signature", idp_core::encode(&as_map(header), &as_map(payload)))
    }

    fn headers_with(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    #[test]
    fn any_passes_with_one_overlapping_scope() {
        let gate = ScopeGate::any(["a", "b"]).unwrap();
        let token = token_with(json!({"scopes": ["b", "c"]}));
        assert!(gate.authorize(&headers_with(&token)).is_ok());
    }

    #[test]
    fn all_fails_when_one_scope_is_missing() {
        let gate = ScopeGate::all(["a", "b"]).unwrap().with_diagnostics(true);
        let token = token_with(json!({"scopes": ["b", "c"]}));
        assert_eq!(
            gate.authorize(&headers_with(&token)),
            Err(GateError::Forbidden(
                "All of the following scopes are required: a, b".into()
            ))
        );

        let full = token_with(json!({"scopes": ["a", "b", "c"]}));
        assert!(gate.authorize(&headers_with(&full)).is_ok());
    }

    #[test]
    fn any_mismatch_lists_required_scopes_with_diagnostics() {
        let gate = ScopeGate::any(["a", "b"]).unwrap().with_diagnostics(true);
        let token = token_with(json!({"scopes": ["c"]}));
        assert_eq!(
            gate.authorize(&headers_with(&token)),
            Err(GateError::Forbidden(
                "One of the following scopes is required: a, b".into()
            ))
        );
    }

    #[test]
    fn reasons_are_generic_without_diagnostics() {
        let gate = ScopeGate::any(["a"]).unwrap();
        for token in [
            token_with(json!({"scopes": ["c"]})),
            token_with(json!({"sub": "1"})),
            token_with(json!({"scopes": "a"})),
            "not-a-token".to_string(),
        ] {
            assert_eq!(
                gate.authorize(&headers_with(&token)),
                Err(GateError::Forbidden(GENERIC_FORBIDDEN.into()))
            );
        }
    }

    #[test]
    fn missing_token_reason_is_always_explicit() {
        for diagnostics in [false, true] {
            let gate = ScopeGate::all(["a"]).unwrap().with_diagnostics(diagnostics);
            assert_eq!(
                gate.authorize(&HeaderMap::new()),
                Err(GateError::Forbidden(NO_TOKEN.into()))
            );
        }
    }

    #[test]
    fn decode_failures_name_the_cause_with_diagnostics() {
        let gate = ScopeGate::any(["a"]).unwrap().with_diagnostics(true);
        let Err(GateError::Forbidden(reason)) = gate.authorize(&headers_with("only-one-segment"))
        else {
            panic!("expected rejection");
        };
        assert!(reason.starts_with("One of the following scopes is required: a ("));
        assert!(reason.contains("malformed token"));
    }

    #[test]
    fn empty_requirement_cannot_be_built() {
        assert_eq!(
            ScopeGate::any(Vec::<String>::new()).unwrap_err(),
            ScopeConfigError::Empty
        );
    }
}
