//! Client configuration.
//!
//! `Options` only resolves defaults: which base URL to use and which agent
//! carries the requests. The resolved base URL gets the path template
//! appended so every operation can address `/index/type/id/suffix`.

use std::time::Duration;

use crate::error::{Error, Result};
use crate::transport::UreqTransport;

pub const DEFAULT_URL: &str = "http://127.0.0.1:9200";

/// Optional path segments appended to the base URL, in address order.
pub const PATH_TEMPLATE: &str = "{/index,type,id,suffix}";

#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Base URL of the store. `None` or empty means `DEFAULT_URL`.
    pub url: Option<String>,
    /// Agent to send requests with. Must have `http_status_as_error(false)`.
    pub agent: Option<ureq::Agent>,
    /// Global per-request timeout for the default agent. Ignored when `agent`
    /// is set.
    pub timeout: Option<Duration>,
}

impl Options {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn agent(mut self, agent: ureq::Agent) -> Self {
        self.agent = Some(agent);
        self
    }

    /// Validated base URL with `PATH_TEMPLATE` appended.
    pub fn template(&self) -> Result<String> {
        let url = match self.url.as_deref() {
            None | Some("") => DEFAULT_URL,
            Some(url) => url,
        };

        let uri: ureq::http::Uri = url
            .parse()
            .map_err(|err| Error::InvalidUrl(format!("{url}: {err}")))?;
        if uri.scheme().is_none() || uri.authority().is_none() {
            return Err(Error::InvalidUrl(format!("{url}: expected an absolute URL")));
        }
        if uri.query().is_some() {
            return Err(Error::InvalidUrl(format!("{url}: query strings are not allowed")));
        }

        Ok(format!("{}{PATH_TEMPLATE}", url.trim_end_matches('/')))
    }

    pub fn transport(&self) -> UreqTransport {
        match &self.agent {
            Some(agent) => UreqTransport::new(agent.clone()),
            None => UreqTransport::with_timeout(self.timeout),
        }
    }
}
