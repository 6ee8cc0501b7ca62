//! # idp-demo -- Binary Entry Point
//!
//! Serves the demo router from [`idp_middleware::demo`].
//!
//! Environment:
//! - `IDP_BASE_URL`, `IDP_CLIENT_ID`, `IDP_CLIENT_SECRET`, `IDP_TIMEOUT_SECS`
//! - `IDP_DIAGNOSTICS` (`true`/`1` to surface rejection reasons)
//! - `IDP_DEMO_USERS` (comma-separated IDP user ids known locally)
//! - `PORT` (default 8080), `LOG_FORMAT` (`json` for JSON logs), `RUST_LOG`

use idp_client::{IdpClient, IdpConfig};
use idp_middleware::demo::LocalUser;
use idp_middleware::PrincipalDirectory;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let diagnostics = std::env::var("IDP_DIAGNOSTICS")
        .is_ok_and(|v| matches!(v.trim(), "1" | "true" | "TRUE" | "True"));

    let config = IdpConfig::from_env().map_err(|e| {
        tracing::error!("IDP configuration is invalid: {e}");
        e
    })?;
    if config.base_url.is_none() {
        tracing::warn!("IDP_BASE_URL not set; authenticated routes will reject every request");
    }
    let client = IdpClient::new(config)?;

    let directory = PrincipalDirectory::new();
    for id in std::env::var("IDP_DEMO_USERS")
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
    {
        directory.insert(id, LocalUser { id: id.to_string() });
    }
    tracing::info!(users = directory.len(), diagnostics, "local principal directory loaded");

    let app = idp_middleware::demo::app(client, directory, diagnostics)?;

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("IDP demo listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
