//! Executing requests against the store.
//!
//! # Design
//! `Transport` is the only seam that performs I/O. `UreqTransport` runs each
//! request as one blocking round trip on a pooled `ureq::Agent`, which is safe
//! to share between threads, and reads the whole body with no size cap. Network failures come back as
//! `Error::Transport` holding the original `ureq::Error`; nothing is retried.
//!
//! Status interpretation lives in `send`, not in the transport: any status
//! `>= 299` is a failure and its body goes through the error decoder. A 2xx
//! body is never inspected here.

use std::time::Duration;

use tracing::{debug, trace};

use crate::decode::decode_server_error;
use crate::error::Result;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes a plain-data request and returns the full response.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

/// Blocking HTTP transport on top of a shared `ureq::Agent`.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    /// Wrap an existing agent. The agent must be built with
    /// `http_status_as_error(false)` so error bodies reach the decoder.
    pub fn new(agent: ureq::Agent) -> Self {
        Self { agent }
    }

    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::with_timeout(None)
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let url = request.url.as_str();
        let headers = &request.headers;

        let mut response = match request.method {
            HttpMethod::Get => with_headers(self.agent.get(url), headers).call(),
            HttpMethod::Delete => with_headers(self.agent.delete(url), headers).call(),
            HttpMethod::Post => with_headers(self.agent.post(url), headers).send(&request.body[..]),
            HttpMethod::Put => with_headers(self.agent.put(url), headers).send(&request.body[..]),
        }?;

        let status = response.status().as_u16();
        // ureq caps reads at 10 MiB by default; search and bulk replies can exceed that.
        let body = response.body_mut().with_config().limit(u64::MAX).read_to_vec()?;
        Ok(HttpResponse { status, body })
    }
}

fn with_headers<B>(mut builder: ureq::RequestBuilder<B>, headers: &[(String, String)]) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

/// Execute `request` and return the payload of a successful response.
pub fn send<T: Transport + ?Sized>(transport: &T, request: &HttpRequest) -> Result<Vec<u8>> {
    debug!(
        method = request.method.as_str(),
        url = %request.url,
        bytes = request.body.len(),
        "sending request"
    );
    let response = transport.execute(request)?;
    trace!(status = response.status, bytes = response.body.len(), "received response");
    check_status(response)
}

/// Statuses of 299 and above are failures, whatever the body looks like.
fn check_status(response: HttpResponse) -> Result<Vec<u8>> {
    if response.status >= 299 {
        return Err(decode_server_error(&response.body));
    }
    Ok(response.body)
}
