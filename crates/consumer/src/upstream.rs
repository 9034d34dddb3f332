//! Upstream dispatch seam
//!
//! The consumer executes replayed requests through the [`Upstream`] trait
//! so tests can script responses. [`HttpUpstream`] is the production
//! implementation on the shared HTTP client.

use async_trait::async_trait;
use thiserror::Error;

use esgate_flow::GatewayRequest;

/// Errors from one upstream dispatch
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Connect/transport failure; the request may not have been received
    #[error("upstream unavailable: {0}")]
    Unavailable(String),

    /// The replayed request cannot be expressed as an HTTP request
    #[error("invalid replay request: {0}")]
    InvalidRequest(String),
}

/// Response of one upstream dispatch
#[derive(Debug, Clone, Default)]
pub struct UpstreamResponse {
    /// Status code
    pub status: u16,
    /// Header pairs
    pub headers: Vec<(String, String)>,
    /// Response body
    pub body: Vec<u8>,
}

impl UpstreamResponse {
    /// First value of a header, case-insensitive
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Remove all values of a header
    pub fn remove_header(&mut self, name: &str) {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
    }
}

/// Executes replayed requests against an upstream host
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Dispatch the request and collect the full response
    async fn execute(
        &self,
        request: &GatewayRequest,
    ) -> std::result::Result<UpstreamResponse, UpstreamError>;
}

/// Shared HTTP client implementation
///
/// The client owns its connection pool; certificate verification is
/// disabled because replay targets are addressed by node IP inside the
/// cluster network.
pub struct HttpUpstream {
    client: reqwest::Client,
}

impl HttpUpstream {
    /// Build the shared client
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(1000)
            .danger_accept_invalid_certs(true)
            .build()
            .expect("construct http client");
        Self { client }
    }
}

impl Default for HttpUpstream {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn execute(
        &self,
        request: &GatewayRequest,
    ) -> std::result::Result<UpstreamResponse, UpstreamError> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|e| UpstreamError::InvalidRequest(e.to_string()))?;

        if request.scheme().is_none() {
            return Err(UpstreamError::InvalidRequest(format!(
                "replay URI '{}' has no scheme/host",
                request.uri
            )));
        }

        let mut builder = self
            .client
            .request(method, &request.uri)
            .body(request.body.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| UpstreamError::Unavailable(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(n, v)| {
                (
                    n.as_str().to_string(),
                    String::from_utf8_lossy(v.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::Unavailable(e.to_string()))?
            .to_vec();

        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }
}
