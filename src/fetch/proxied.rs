use std::time::Duration;

use async_trait::async_trait;

use super::client::HttpClient;

/// Routes every request through the fixed egress proxy.
///
/// The transit authority allowlists caller IPs, so production traffic must
/// leave through the proxy address it knows about.
pub struct ProxiedClient(reqwest::Client);

impl ProxiedClient {
    pub fn new(proxy_url: &str, timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .proxy(reqwest::Proxy::all(proxy_url)?)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self(client))
    }
}

#[async_trait]
impl HttpClient for ProxiedClient {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.0.execute(req).await
    }
}
