//! The I/O seam: turn an `HttpRequest` into an `HttpResponse`.
//!
//! A transport returns every response the server produced, whatever the
//! status. The only error it reports is [`ApiError::Connectivity`], for
//! requests that never got a structured response back. What counts as that
//! depends on the HTTP library, so `UreqTransport` makes the call explicitly:
//! DNS failure, refused connection, TLS failure, timeouts and unreadable
//! bodies all land there.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).execute(request).await
    }
}

/// Blocking `ureq` agent driven from the tokio blocking pool.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        // Status codes are data here; the client interprets them.
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent }
    }

    fn execute_blocking(agent: &ureq::Agent, req: HttpRequest) -> Result<HttpResponse, ApiError> {
        let url = req.path.as_str();
        let result = match req.method {
            HttpMethod::Get => with_headers(agent.get(url), &req.headers).call(),
            HttpMethod::Delete => with_headers(agent.delete(url), &req.headers).call(),
            HttpMethod::Post => send(with_headers(agent.post(url), &req.headers), req.body.as_deref()),
            HttpMethod::Put => send(with_headers(agent.put(url), &req.headers), req.body.as_deref()),
            HttpMethod::Patch => {
                send(with_headers(agent.patch(url), &req.headers), req.body.as_deref())
            }
        };

        let mut response = result.map_err(|e| {
            warn!(method = req.method.as_str(), url, error = %e, "request did not reach the server");
            ApiError::connectivity(e.to_string())
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| ApiError::connectivity(format!("failed to read response body: {e}")))?;

        debug!(method = req.method.as_str(), url, status, "response received");
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

#[async_trait]
impl Transport for UreqTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let agent = self.agent.clone();
        tokio::task::spawn_blocking(move || Self::execute_blocking(&agent, request))
            .await
            .map_err(|e| ApiError::connectivity(format!("transport task failed: {e}")))?
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn send(
    builder: ureq::RequestBuilder<ureq::typestate::WithBody>,
    body: Option<&str>,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match body {
        Some(body) => builder.send(body.as_bytes()),
        None => builder.send_empty(),
    }
}
