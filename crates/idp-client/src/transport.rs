//! Resource transport: the seam between the IDP client and HTTP.
//!
//! The client builds a fully resolved [`TransportRequest`] (absolute URL,
//! headers, optional JSON body, query pairs) and hands it to a [`Transport`].
//! A transport either returns the status and raw body, or fails with the
//! underlying cause. Status interpretation stays in the client.
//!
//! [`HttpTransport`] is the production implementation over `reqwest`. Tests
//! and hosts with their own HTTP stack can supply another implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Method;
use serde_json::Value;
use url::Url;

use crate::error::BoxError;

/// A single outbound call.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Value>,
    pub query: Vec<(String, String)>,
}

/// What came back from a completed call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    /// Raw response body; empty when the server sent none.
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// `true` for any 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends requests to the IDP.
///
/// Implementations must be `Send + Sync` so one transport can be shared by
/// every session behind an `Arc`.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Perform the call. `Err` means the call did not complete; any HTTP
    /// status, including 4xx/5xx, is an `Ok`.
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, BoxError>;
}

/// `reqwest`-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport with its own connection pool and request timeout.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    /// Wrap an existing `reqwest` client (shares its pool and settings).
    pub fn from_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, BoxError> {
        let mut builder = self
            .http
            .request(request.method, request.url)
            .headers(request.headers);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await?.to_vec();

        Ok(TransportResponse { status, body })
    }
}
