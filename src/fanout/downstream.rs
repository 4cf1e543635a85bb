//! Downstream transport.
//!
//! # Responsibilities
//! - Send one item body to the downstream service
//! - Accumulate the response body until end of stream
//! - Classify non-2xx statuses and transport faults as failures

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{uri::InvalidUri, Method, Request, Uri};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;

use crate::config::{DownstreamConfig, TimeoutConfig};
use crate::fanout::outcome::CallOutcome;

/// Errors from a single downstream exchange.
#[derive(Debug, Error)]
pub enum DownstreamError {
    #[error("invalid downstream request: {0}")]
    Request(#[from] axum::http::Error),

    #[error("transport error: {0}")]
    Transport(#[from] hyper_util::client::legacy::Error),

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("downstream returned status {status}")]
    Status { status: u16, body: String },
}

impl From<DownstreamError> for CallOutcome {
    fn from(err: DownstreamError) -> Self {
        match err {
            DownstreamError::Status { status, body } => CallOutcome::Failure {
                status: Some(status),
                message: body,
            },
            other => CallOutcome::Failure {
                status: None,
                message: other.to_string(),
            },
        }
    }
}

/// The one service every batch item is sent to.
#[async_trait]
pub trait Downstream: Send + Sync + 'static {
    /// POST `body` and return the full response body on a 2xx status.
    async fn call(&self, body: Vec<u8>) -> Result<String, DownstreamError>;
}

/// HTTP/1.1 downstream backed by a pooled hyper client.
#[derive(Debug, Clone)]
pub struct HttpDownstream {
    client: Client<HttpConnector, Body>,
    uri: Uri,
    max_response_bytes: usize,
}

impl HttpDownstream {
    pub fn from_config(
        downstream: &DownstreamConfig,
        timeouts: &TimeoutConfig,
    ) -> Result<Self, InvalidUri> {
        let uri: Uri = downstream.url.parse()?;

        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(timeouts.connect()));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        Ok(Self {
            client,
            uri,
            max_response_bytes: downstream.max_response_bytes,
        })
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }
}

#[async_trait]
impl Downstream for HttpDownstream {
    async fn call(&self, body: Vec<u8>) -> Result<String, DownstreamError> {
        let request = Request::builder()
            .method(Method::POST)
            .uri(self.uri.clone())
            .body(Body::from(body))?;

        let response = self.client.request(request).await?;
        let status = response.status();

        let bytes = axum::body::to_bytes(Body::new(response.into_body()), self.max_response_bytes)
            .await
            .map_err(|e| DownstreamError::Body(e.to_string()))?;
        let text = String::from_utf8_lossy(&bytes).into_owned();

        if status.is_success() {
            Ok(text)
        } else {
            Err(DownstreamError::Status {
                status: status.as_u16(),
                body: text,
            })
        }
    }
}
