use std::time::Duration;

use async_trait::async_trait;

use super::client::HttpClient;

/// Plain connection with a bounded total wait per request.
pub struct DirectClient(reqwest::Client);

impl DirectClient {
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self(client))
    }
}

#[async_trait]
impl HttpClient for DirectClient {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.0.execute(req).await
    }
}
