//! # idp-client -- Typed Rust client for the Identity Provider
//!
//! Gives a host service typed access to its IDP:
//! - **Server token** via the client-credentials exchange at `v1/oauth/token`
//! - **Organizations** via `api/v1/organization(s)`
//! - **Users** via `api/v1/user(s)`, including token validation, dev tokens
//!   and impersonation
//!
//! ## Scopes
//!
//! [`IdpClient`] holds configuration and the transport and is shared for the
//! whole process. Calls are made through an [`IdpSession`], opened once per
//! inbound request with [`IdpClient::session`]. A session owns the scope
//! caches: the server token is exchanged at most once per session, and
//! organizations and users fetched in it are served from memory afterwards.
//!
//! ## Errors
//!
//! Every operation returns [`IdpError`]. Missing configuration and blank
//! identifiers fail before any network call. Nothing is retried.
//!
//! ## Path Convention
//!
//! All paths are relative to [`IdpConfig::base_url`]:
//! `{base_url}/api/v1/{resource}`, except the token exchange at
//! `{base_url}/v1/oauth/token`.

pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod organizations;
pub mod session;
pub mod transport;
pub mod users;

pub use cache::ScopeCache;
pub use config::{ConfigError, IdpConfig};
pub use error::IdpError;
pub use models::{AccessToken, Identified, Organization, PaginatedList, User};
pub use session::IdpSession;
pub use transport::{HttpTransport, Transport, TransportRequest, TransportResponse};

use std::sync::Arc;
use std::time::Duration;

/// Process-wide IDP client. Cheap to clone.
#[derive(Debug, Clone)]
pub struct IdpClient {
    config: Arc<IdpConfig>,
    transport: Arc<dyn Transport>,
}

impl IdpClient {
    /// Create a client backed by [`HttpTransport`] with the configured timeout.
    pub fn new(config: IdpConfig) -> Result<Self, IdpError> {
        let transport = HttpTransport::new(Duration::from_secs(config.timeout_secs)).map_err(
            |e| IdpError::Transport {
                endpoint: "client_init".into(),
                source: Box::new(e),
            },
        )?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a client that sends through `transport`.
    pub fn with_transport(config: IdpConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config: Arc::new(config),
            transport,
        }
    }

    /// Configuration this client was built with.
    pub fn config(&self) -> &IdpConfig {
        &self.config
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// Open a new scope with empty caches.
    pub fn session(&self) -> IdpSession {
        IdpSession::new(self.clone())
    }
}
