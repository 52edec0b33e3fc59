use async_trait::async_trait;

use super::client::HttpClient;

/// An [`HttpClient`] wrapper that appends a credential as a URL query
/// parameter at execute time.
///
/// The Stop-Monitoring endpoint authenticates with a shared secret in the
/// `Key` parameter. Keeping the append here means no other component ever
/// holds or formats a URL containing the secret, so request URLs elsewhere
/// are safe to log verbatim.
pub struct UrlParam<C> {
    inner: C,
    param_name: String,
    key: String,
    /// The form-urlencoded rendering of `key`, as `append_pair` writes it
    /// on the wire. Echoed URLs carry this form, not the raw one.
    key_encoded: String,
}

impl<C> UrlParam<C> {
    pub fn new(inner: C, param_name: impl Into<String>, key: impl Into<String>) -> Self {
        let key = key.into();
        let key_encoded = url::form_urlencoded::byte_serialize(key.as_bytes()).collect();
        Self {
            inner,
            param_name: param_name.into(),
            key,
            key_encoded,
        }
    }

    /// Scrubs the credential out of a payload that is about to be persisted.
    ///
    /// Upstream error pages sometimes echo the request URL, key included;
    /// stored raw responses must not carry the secret in either its raw or
    /// its wire-encoded form.
    pub fn redact(&self, text: &str) -> String {
        let mut out = text.to_string();
        for form in [self.key.as_str(), self.key_encoded.as_str()] {
            if !form.is_empty() && out.contains(form) {
                out = out.replace(form, "[REDACTED]");
            }
        }
        out
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for UrlParam<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        req.url_mut()
            .query_pairs_mut()
            .append_pair(&self.param_name, &self.key);
        self.inner.execute(req).await
    }
}
