//! IDP client configuration.
//!
//! Every setting is optional at construction time so a host can start without
//! IDP credentials. A missing value only becomes an error when an operation
//! needs it, and then it is reported as [`IdpError::MissingConfiguration`]
//! naming the option, before any network call is made.

use url::Url;
use zeroize::Zeroizing;

use crate::error::IdpError;

/// Default request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for talking to the IDP service.
///
/// Custom `Debug` implementation redacts the `client_secret` field
/// to prevent credential leakage in log output.
#[derive(Clone)]
pub struct IdpConfig {
    /// Base URL of the IDP service, e.g. `https://idp.example.com`.
    pub base_url: Option<Url>,
    /// OAuth client id used for the client-credentials exchange.
    pub client_id: Option<String>,
    /// OAuth client secret used for the client-credentials exchange.
    pub client_secret: Option<Zeroizing<String>>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for IdpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdpConfig")
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for IdpConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            client_id: None,
            client_secret: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl IdpConfig {
    /// Fully populated configuration with the default timeout.
    pub fn new(base_url: Url, client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url),
            client_id: Some(client_id.into()),
            client_secret: Some(Zeroizing::new(client_secret.into())),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `IDP_BASE_URL`
    /// - `IDP_CLIENT_ID`
    /// - `IDP_CLIENT_SECRET`
    /// - `IDP_TIMEOUT_SECS` (default: 30)
    ///
    /// Absent or empty variables leave the option unset. Only a value that is
    /// present but unusable is an error here.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env), reading through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let base_url = match get("IDP_BASE_URL") {
            Some(raw) => Some(parse_base_url("IDP_BASE_URL", &raw)?),
            None => None,
        };

        let timeout_secs = match get("IDP_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidTimeout(raw.clone()))?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            base_url,
            client_id: get("IDP_CLIENT_ID"),
            client_secret: get("IDP_CLIENT_SECRET").map(Zeroizing::new),
            timeout_secs,
        })
    }

    /// The base URL, or `MissingConfiguration("base_url")`.
    pub fn base_url(&self) -> Result<&Url, IdpError> {
        self.base_url
            .as_ref()
            .ok_or(IdpError::MissingConfiguration { option: "base_url" })
    }

    /// The client id, or `MissingConfiguration("client_id")`.
    pub fn client_id(&self) -> Result<&str, IdpError> {
        self.client_id
            .as_deref()
            .filter(|v| !v.is_empty())
            .ok_or(IdpError::MissingConfiguration { option: "client_id" })
    }

    /// The client secret, or `MissingConfiguration("client_secret")`.
    pub fn client_secret(&self) -> Result<&str, IdpError> {
        self.client_secret
            .as_ref()
            .map(|s| s.as_str())
            .filter(|v| !v.is_empty())
            .ok_or(IdpError::MissingConfiguration {
                option: "client_secret",
            })
    }
}

fn parse_base_url(var: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidUrl(
            var.to_string(),
            "URL cannot be used as a base".to_string(),
        ));
    }
    Ok(url)
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("invalid IDP_TIMEOUT_SECS value: {0:?}")]
    InvalidTimeout(String),
}
