//! # Demo Service
//!
//! A small router showing how a host wires the gates:
//!
//! | Route | Gates |
//! |-------|-------|
//! | `GET /health/liveness` | none |
//! | `GET /v1/me` | authentication |
//! | `GET /v1/organizations?page={n}` | authentication, then scope `organizations:read` |
//!
//! Local principals come from a [`PrincipalDirectory`] of [`LocalUser`]s.

use std::sync::Arc;

use axum::extract::Query;
use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use idp_client::{IdpClient, IdpError, Organization, PaginatedList};
use idp_core::ScopeConfigError;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::auth::{authentication_middleware, AuthenticationGate, PrincipalDirectory};
use crate::error::ErrorBody;
use crate::extractors::{AuthenticatedUser, Principal, RequestSession};
use crate::scope::{scope_middleware, ScopeGate};

/// Scope required by `GET /v1/organizations`.
pub const ORGANIZATIONS_READ: &str = "organizations:read";

/// A user known to the demo service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalUser {
    pub id: String,
}

/// Build the demo router.
pub fn app(
    client: IdpClient,
    directory: PrincipalDirectory<LocalUser>,
    diagnostics: bool,
) -> Result<Router, ScopeConfigError> {
    let auth_gate = Arc::new(AuthenticationGate::new(client, directory).with_diagnostics(diagnostics));
    let organizations_gate =
        Arc::new(ScopeGate::any([ORGANIZATIONS_READ])?.with_diagnostics(diagnostics));

    let organizations = Router::new()
        .route("/v1/organizations", get(list_organizations))
        .route_layer(from_fn_with_state(organizations_gate, scope_middleware));

    let api = Router::new()
        .route("/v1/me", get(me))
        .merge(organizations)
        .route_layer(from_fn_with_state(
            auth_gate,
            authentication_middleware::<PrincipalDirectory<LocalUser>>,
        ))
        .layer(TraceLayer::new_for_http());

    let health = Router::new().route("/health/liveness", get(liveness));

    Ok(Router::new().merge(health).merge(api))
}

async fn liveness() -> &'static str {
    "ok"
}

#[derive(Debug, Serialize)]
struct MeResponse {
    principal: LocalUser,
    idp_user: idp_client::User,
}

async fn me(
    Principal(principal): Principal<LocalUser>,
    AuthenticatedUser(idp_user): AuthenticatedUser,
) -> Json<MeResponse> {
    Json(MeResponse {
        principal,
        idp_user,
    })
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    page: Option<u32>,
}

async fn list_organizations(
    RequestSession(session): RequestSession,
    Query(query): Query<PageQuery>,
) -> Result<Json<PaginatedList<Organization>>, UpstreamError> {
    let page = session.list_organizations(query.page.unwrap_or(1)).await?;
    Ok(Json(page))
}

/// An IDP call made by a handler failed.
#[derive(Debug)]
struct UpstreamError(IdpError);

impl From<IdpError> for UpstreamError {
    fn from(err: IdpError) -> Self {
        Self(err)
    }
}

impl IntoResponse for UpstreamError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "IDP call from handler failed");
        (
            StatusCode::BAD_GATEWAY,
            Json(ErrorBody::new("UPSTREAM_ERROR", "The identity provider request failed")),
        )
            .into_response()
    }
}
