//! Government Stop-Monitoring feed client.

use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::fetch::{self, HttpClient, UrlParam};
use crate::siri::{StopVisit, parse_feed_xml};

/// Outcome of one Stop-Monitoring query.
///
/// Transport failures are data, not exceptions: `success` goes false,
/// `error` says why, and whatever raw body arrived stays in `raw_xml`. The
/// raw XML is retained on success too, because the evidentiary chain of
/// custody needs the original bytes, not just the parsed visits.
#[derive(Debug, Clone, Serialize)]
pub struct FeedResponse {
    pub success: bool,
    pub stop_code: String,
    pub query_timestamp: DateTime<Utc>,
    pub response_time_ms: u64,
    pub stop_visits: Vec<StopVisit>,
    pub raw_xml: String,
    pub error: Option<String>,
}

impl FeedResponse {
    fn failure(
        stop_code: &str,
        query_timestamp: DateTime<Utc>,
        response_time_ms: u64,
        raw_xml: String,
        error: String,
    ) -> Self {
        Self {
            success: false,
            stop_code: stop_code.to_string(),
            query_timestamp,
            response_time_ms,
            stop_visits: Vec::new(),
            raw_xml,
            error: Some(error),
        }
    }
}

/// Abstraction over the real-time arrivals source, mockable in tests.
#[async_trait]
pub trait StopMonitoringApi: Send + Sync {
    async fn query_stop_monitoring(
        &self,
        stop_code: &str,
        line_ref: Option<&str>,
    ) -> FeedResponse;
}

/// Queries the authority's SIRI-SM endpoint through the injected transport.
///
/// The shared secret is appended by the [`UrlParam`] wrapper at execute
/// time, so the URLs this client builds and logs never contain it.
pub struct SiriSmClient<C> {
    base_url: String,
    transport: UrlParam<C>,
}

impl<C: HttpClient> SiriSmClient<C> {
    pub fn new(cfg: &EngineConfig, transport: C) -> Self {
        Self {
            base_url: cfg.siri_base_url.clone(),
            transport: UrlParam::new(transport, "Key", cfg.siri_api_key.clone()),
        }
    }
}

fn build_query_url(
    base_url: &str,
    stop_code: &str,
    line_ref: Option<&str>,
) -> Result<reqwest::Url, String> {
    let mut url: reqwest::Url = base_url.parse().map_err(|e| format!("invalid base url: {e}"))?;
    url.query_pairs_mut().append_pair("MonitoringRef", stop_code);
    if let Some(line) = line_ref {
        url.query_pairs_mut().append_pair("LineRef", line);
    }
    Ok(url)
}

#[async_trait]
impl<C: HttpClient> StopMonitoringApi for SiriSmClient<C> {
    #[tracing::instrument(skip(self))]
    async fn query_stop_monitoring(
        &self,
        stop_code: &str,
        line_ref: Option<&str>,
    ) -> FeedResponse {
        let query_timestamp = Utc::now();
        let url = match build_query_url(&self.base_url, stop_code, line_ref) {
            Ok(url) => url,
            Err(reason) => {
                warn!(stop_code, error = %reason, "Stop-monitoring query not sent");
                return FeedResponse::failure(stop_code, query_timestamp, 0, String::new(), reason);
            }
        };

        let started = Instant::now();
        match fetch::get_raw(&self.transport, url).await {
            Ok((status, body)) => {
                let response_time_ms = started.elapsed().as_millis() as u64;
                // Error pages can echo the request URL, credential included;
                // what gets stored must not.
                let raw_xml = self.transport.redact(&String::from_utf8_lossy(&body));

                if !status.is_success() {
                    warn!(%status, stop_code, response_time_ms, "Stop-monitoring returned an error status");
                    return FeedResponse::failure(
                        stop_code,
                        query_timestamp,
                        response_time_ms,
                        raw_xml,
                        format!("HTTP {status}"),
                    );
                }

                let stop_visits = parse_feed_xml(&raw_xml, stop_code);
                debug!(
                    visits = stop_visits.len(),
                    response_time_ms, "Stop-monitoring delivery parsed"
                );
                FeedResponse {
                    success: true,
                    stop_code: stop_code.to_string(),
                    query_timestamp,
                    response_time_ms,
                    stop_visits,
                    raw_xml,
                    error: None,
                }
            }
            Err(e) => {
                let response_time_ms = started.elapsed().as_millis() as u64;
                // The request URL carries the credential; strip it before
                // the error becomes part of any record.
                let sanitized = e.without_url();
                let reason = if sanitized.is_timeout() {
                    format!("timeout after {response_time_ms}ms")
                } else {
                    sanitized.to_string()
                };
                warn!(stop_code, error = %reason, "Stop-monitoring query failed");
                FeedResponse::failure(stop_code, query_timestamp, response_time_ms, String::new(), reason)
            }
        }
    }
}
