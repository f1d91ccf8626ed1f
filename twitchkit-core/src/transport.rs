//! HTTP transport seam.
//!
//! Everything that talks to the network goes through [`HttpTransport`], so
//! the dispatcher and the token endpoint can be exercised against a scripted
//! transport in tests. [`ReqwestTransport`] is the production implementation.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

/// HTTP methods used by Helix endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Sent as `application/json`.
    Json(serde_json::Value),

    /// Sent as `application/x-www-form-urlencoded`.
    Form(Vec<(String, String)>),
}

/// A fully built request, ready to hand to a transport.
#[derive(Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Value of the first header matching `name`, case-insensitively.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

// Header values carry tokens and form bodies carry client secrets.
impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<&str> = self.headers.iter().map(|(n, _)| n.as_str()).collect();
        let body = match &self.body {
            None => "none",
            Some(RequestBody::Json(_)) => "json",
            Some(RequestBody::Form(_)) => "form",
        };
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("headers", &headers)
            .field("body", &body)
            .finish()
    }
}

/// A fully read response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A failure below the HTTP layer.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Could not establish a connection.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The request or response did not complete in time.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The connection broke while sending or reading.
    #[error("I/O failure: {0}")]
    Io(String),

    /// The request could not be built. Never retried.
    #[error("invalid request: {0}")]
    Build(String),
}

impl TransportError {
    /// Whether retrying the same request could succeed.
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::Build(_))
    }
}

/// Sends a request and returns the complete response.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// [`HttpTransport`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport. `timeout` bounds each attempt end to end.
    pub fn new(timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::Build(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else if err.is_builder() {
        TransportError::Build(err.to_string())
    } else {
        TransportError::Io(err.to_string())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method.into(), request.url.clone());

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder = match request.body {
            Some(RequestBody::Json(value)) => builder.json(&value),
            Some(RequestBody::Form(fields)) => builder.form(&fields),
            None => builder,
        };

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();

        // Reading the whole body releases the connection back to the pool.
        let body = response.bytes().await.map_err(map_reqwest_error)?;

        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_header_values() {
        let request = HttpRequest::new(
            HttpMethod::Get,
            Url::parse("https://api.twitch.tv/helix/users").unwrap(),
        )
        .header("Authorization", "Bearer very-secret")
        .header("Client-Id", "abc");

        let rendered = format!("{:?}", request);
        assert!(rendered.contains("Authorization"));
        assert!(!rendered.contains("very-secret"));
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let request = HttpRequest::new(
            HttpMethod::Get,
            Url::parse("https://api.twitch.tv/helix/users").unwrap(),
        )
        .header("Client-Id", "abc");

        assert_eq!(request.header_value("client-id"), Some("abc"));
        assert_eq!(request.header_value("authorization"), None);
    }

    #[test]
    fn build_errors_are_not_transient() {
        assert!(TransportError::Timeout("t".into()).is_transient());
        assert!(TransportError::Connect("c".into()).is_transient());
        assert!(!TransportError::Build("b".into()).is_transient());
    }

    #[tokio::test]
    async fn unreachable_host_is_a_connect_error() {
        let transport = ReqwestTransport::new(Some(Duration::from_secs(2))).unwrap();
        let request = HttpRequest::new(
            HttpMethod::Get,
            Url::parse("http://127.0.0.1:1/helix").unwrap(),
        );

        let err = transport.execute(request).await.unwrap_err();
        assert!(err.is_transient());
    }
}
