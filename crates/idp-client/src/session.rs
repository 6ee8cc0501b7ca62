//! Scoped sessions.
//!
//! An [`IdpSession`] is the unit of cache lifetime: it owns one
//! [`ScopeCache`] (server token slot plus lookup caches) and every operation
//! made through it, or through any clone of it, shares that cache. Open a new
//! session per inbound request via [`IdpClient::session`] so no cached token or
//! resource ever leaks across requests.
//!
//! Every call follows the same shape: build an [`IdpRequest`], attach an
//! `Authorization` header, send it through the client's transport, turn
//! transport failures into [`IdpError::Transport`] and non-2xx statuses into
//! [`IdpError::RemoteStatus`], then decode the body.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use url::Url;

use crate::cache::ScopeCache;
use crate::error::{messages_from_body, IdpError};
use crate::models::AccessToken;
use crate::transport::{TransportRequest, TransportResponse};
use crate::IdpClient;

/// Path of the client-credentials exchange, relative to the base URL.
const TOKEN_PATH: &str = "v1/oauth/token";

/// An outbound IDP call before it is bound to a base URL and credentials.
#[derive(Debug)]
pub(crate) struct IdpRequest {
    method: Method,
    segments: Vec<String>,
    body: Option<Value>,
    query: Vec<(String, String)>,
}

impl IdpRequest {
    pub(crate) fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            segments: path
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            body: None,
            query: Vec::new(),
        }
    }

    /// Append one path segment. The value is percent-encoded when the URL is
    /// built, so a `/` inside an identifier stays inside its segment. Dot
    /// segments are dropped by URL building; callers reject them up front.
    pub(crate) fn segment(mut self, value: &str) -> Self {
        self.segments.push(value.to_string());
        self
    }

    pub(crate) fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub(crate) fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, IdpError> {
        let value = serde_json::to_value(body).map_err(|source| IdpError::Serialization {
            endpoint: self.endpoint(),
            source,
        })?;
        self.body = Some(value);
        Ok(self)
    }

    /// Label used in logs and errors, e.g. `GET /api/v1/user/USR-1`.
    pub(crate) fn endpoint(&self) -> String {
        format!("{} /{}", self.method, self.segments.join("/"))
    }

    fn url(&self, base: &Url) -> Result<Url, IdpError> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|()| IdpError::Transport {
                endpoint: self.endpoint(),
                source: "IDP base URL cannot carry a path".into(),
            })?
            .pop_if_empty()
            .extend(&self.segments);
        Ok(url)
    }
}

/// `Authorization` value for a caller-supplied token.
pub(crate) fn bearer(token: &str) -> String {
    format!("Bearer {}", token.trim())
}

/// Handle for one cache scope. Cheap to clone; clones share the scope.
#[derive(Debug, Clone)]
pub struct IdpSession {
    client: IdpClient,
    cache: Arc<ScopeCache>,
}

impl IdpSession {
    pub(crate) fn new(client: IdpClient) -> Self {
        Self {
            client,
            cache: Arc::new(ScopeCache::default()),
        }
    }

    /// The client this session was opened from.
    pub fn client(&self) -> &IdpClient {
        &self.client
    }

    /// The caches owned by this scope.
    pub fn cache(&self) -> &ScopeCache {
        &self.cache
    }

    /// Service-to-service access token for this scope.
    ///
    /// The first call performs a client-credentials exchange and stores the
    /// result; every later call in the same scope returns that token without
    /// checking `expires_in`. A fresh session starts with an empty slot.
    pub async fn server_token(&self) -> Result<AccessToken, IdpError> {
        if let Some(token) = self.cache.server_token() {
            tracing::debug!("server token served from scope cache");
            return Ok(token);
        }

        let config = self.client.config();
        config.base_url()?;
        let request = IdpRequest::new(Method::POST, TOKEN_PATH).json(&json!({
            "grant_type": "client_credentials",
            "client_id": config.client_id()?,
            "client_secret": config.client_secret()?,
            "scope": "*",
        }))?;

        let token: AccessToken = self.send(request, None).await?;
        tracing::debug!(
            expires_in = token.expires_in(),
            "server token acquired via client-credentials exchange"
        );
        Ok(self.cache.store_server_token(token))
    }

    /// Send authorized by this scope's server token and decode the body.
    pub(crate) async fn send_as_server<T: DeserializeOwned>(
        &self,
        request: IdpRequest,
    ) -> Result<T, IdpError> {
        let token = self.server_token().await?;
        self.send(request, Some(&token.header_value())).await
    }

    /// Send authorized by this scope's server token, ignoring any body.
    pub(crate) async fn send_as_server_without_body(
        &self,
        request: IdpRequest,
    ) -> Result<(), IdpError> {
        let token = self.server_token().await?;
        self.dispatch(request, Some(&token.header_value()))
            .await
            .map(|_| ())
    }

    /// Send with an explicit `Authorization` value (or none) and decode.
    pub(crate) async fn send<T: DeserializeOwned>(
        &self,
        request: IdpRequest,
        authorization: Option<&str>,
    ) -> Result<T, IdpError> {
        let (endpoint, response) = self.dispatch(request, authorization).await?;
        serde_json::from_slice(&response.body)
            .map_err(|source| IdpError::Deserialization { endpoint, source })
    }

    async fn dispatch(
        &self,
        request: IdpRequest,
        authorization: Option<&str>,
    ) -> Result<(String, TransportResponse), IdpError> {
        let endpoint = request.endpoint();
        let url = request.url(self.client.config().base_url()?)?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(value) = authorization {
            let mut value = HeaderValue::from_str(value).map_err(|_| {
                IdpError::invalid_argument(
                    "authorization",
                    "token made of visible ASCII characters",
                    "[REDACTED]",
                )
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let IdpRequest {
            method, body, query, ..
        } = request;
        let outbound = TransportRequest {
            method,
            url,
            headers,
            body,
            query,
        };

        let response = self
            .client
            .transport()
            .send(outbound)
            .await
            .map_err(|source| {
                tracing::warn!(endpoint = %endpoint, error = %source, "IDP request did not complete");
                IdpError::Transport {
                    endpoint: endpoint.clone(),
                    source,
                }
            })?;

        tracing::debug!(endpoint = %endpoint, status = response.status, "IDP request completed");

        if !response.is_success() {
            let messages = messages_from_body(&response.body);
            tracing::warn!(
                endpoint = %endpoint,
                status = response.status,
                messages = ?messages,
                "IDP rejected request"
            );
            return Err(IdpError::RemoteStatus {
                endpoint,
                status: response.status,
                messages,
            });
        }

        Ok((endpoint, response))
    }
}
