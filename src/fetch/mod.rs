//! Injected HTTP transport: a small [`HttpClient`] capability with direct
//! and proxied implementations, selected once at startup.

mod client;
mod direct;
mod proxied;
mod url_param;

pub use client::HttpClient;
pub use direct::DirectClient;
pub use proxied::ProxiedClient;
pub use url_param::UrlParam;

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::StatusCode;
use tracing::{info, warn};

/// Builds the transport the feed clients share.
///
/// When an egress proxy is configured all traffic is routed through it (the
/// upstream authority allowlists caller IPs); without one the engine falls
/// back to a direct connection, which keeps development and degraded
/// environments working at the cost of possibly being refused upstream.
pub fn build_transport(
    proxy_url: Option<&str>,
    timeout: Duration,
) -> reqwest::Result<Arc<dyn HttpClient>> {
    match proxy_url {
        Some(url) => {
            let transport = ProxiedClient::new(url, timeout)?;
            info!("Feed traffic routed through egress proxy");
            Ok(Arc::new(transport))
        }
        None => {
            warn!("No egress proxy configured; using direct connection");
            Ok(Arc::new(DirectClient::new(timeout)?))
        }
    }
}

/// Issues a GET and returns the status with the raw body bytes.
///
/// The body is surfaced untouched because downstream evidentiary records
/// keep the original payload, not a re-encoding of it.
pub async fn get_raw<C: HttpClient + ?Sized>(
    client: &C,
    url: reqwest::Url,
) -> reqwest::Result<(StatusCode, Bytes)> {
    let req = reqwest::Request::new(reqwest::Method::GET, url);
    let resp = client.execute(req).await?;
    let status = resp.status();
    let body = resp.bytes().await?;
    Ok((status, body))
}
