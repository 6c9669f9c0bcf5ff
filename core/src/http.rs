//! HTTP request and response types, plus the request codec.
//!
//! # Design
//! Requests and responses are plain data. `Rest` builds an `HttpRequest`,
//! hands it to a `Transport`, and decodes the returned bytes; the codec here
//! never touches the network, so request shapes can be asserted directly in
//! tests.
//!
//! Every request carries `content-type: application/json`, bodyless ones
//! included. A missing body is an empty payload, never a JSON `null`.

pub const CONTENT_TYPE: (&str, &str) = ("content-type", "application/json");

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// Single-document request. `None` encodes to an empty payload.
    pub fn json(method: HttpMethod, url: String, body: Option<Vec<u8>>) -> Self {
        Self {
            method,
            url,
            headers: json_headers(),
            body: body.unwrap_or_default(),
        }
    }

    /// Newline-delimited bulk request: every line is written in order and
    /// terminated with `\n`. Pairing action and source lines is the caller's
    /// job.
    pub fn bulk<I>(method: HttpMethod, url: String, lines: I) -> Self
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        let mut body = Vec::new();
        for line in lines {
            body.extend_from_slice(&line);
            body.push(b'\n');
        }
        Self {
            method,
            url,
            headers: json_headers(),
            body,
        }
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

fn json_headers() -> Vec<(String, String)> {
    vec![(CONTENT_TYPE.0.to_string(), CONTENT_TYPE.1.to_string())]
}
