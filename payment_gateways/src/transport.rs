//! The HTTP seam between gateway adapters and the network.
//!
//! Adapters build [`HttpRequest`]s and hand them to an [`HttpTransport`]. The production transport is
//! [`ReqwestTransport`]; tests substitute a mock.
use std::{fmt::Display, time::Duration};

use log::*;
use serde_json::Value;
use thiserror::Error;

use crate::GatewayError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
    Delete,
}

impl Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
            Self::Patch => write!(f, "PATCH"),
            Self::Delete => write!(f, "DELETE"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    /// The full value of the `Authorization` header.
    pub authorization: String,
    pub body: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new<B: Into<Vec<u8>>>(status: u16, body: B) -> Self {
        Self { status, body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("The request timed out. {0}")]
    Timeout(String),
    #[error("The request could not be sent. {0}")]
    Connection(String),
}

impl From<TransportError> for GatewayError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Timeout(s) => GatewayError::OutcomeUnknown(s),
            TransportError::Connection(s) => GatewayError::CreateRequestFailed(s),
        }
    }
}

#[allow(async_fn_in_trait)]
pub trait HttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// [`HttpTransport`] backed by a `reqwest` client with a fixed per-request timeout.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Initialization(e.to_string()))?;
        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        trace!("💳️ {} {}", request.method, request.url);
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };
        let mut builder = self
            .client
            .request(method, &request.url)
            .header(reqwest::header::AUTHORIZATION, request.authorization)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        let response = builder.send().await.map_err(classify)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(classify)?;
        trace!("💳️ {} {} -> {status}", request.method, request.url);
        Ok(HttpResponse { status, body: body.to_vec() })
    }
}

fn classify(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        warn!("💳️ Gateway request timed out: {e}");
        TransportError::Timeout(e.to_string())
    } else {
        warn!("💳️ Gateway request failed: {e}");
        TransportError::Connection(e.to_string())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn timeouts_leave_the_outcome_open() {
        let e: GatewayError = TransportError::Timeout("30s".into()).into();
        assert!(e.is_outcome_unknown());
        let e: GatewayError = TransportError::Connection("refused".into()).into();
        assert!(matches!(e, GatewayError::CreateRequestFailed(_)));
    }

    #[test]
    fn success_range() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(302, "").is_success());
        assert!(!HttpResponse::new(404, "").is_success());
    }
}
