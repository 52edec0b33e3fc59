use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Request, Response};

/// Transport capability for the feed clients.
///
/// Implementations decide how a request reaches the network (direct,
/// through the egress proxy, with a credential appended); callers build the
/// request and never learn which path was taken.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}

#[async_trait]
impl<C: HttpClient + ?Sized> HttpClient for Arc<C> {
    async fn execute(&self, req: Request) -> reqwest::Result<Response> {
        (**self).execute(req).await
    }
}
