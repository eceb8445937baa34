//! Transports execute an `HttpRequest` and hand back a fully read
//! `HttpResponse`.
//!
//! The default transport wraps one process-wide `reqwest::Client`, so every
//! client built without an explicit transport shares its connection pool.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use thiserror::Error;

use crate::error::BoxError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Failure while executing a request.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be built (bad URL, invalid header value).
    #[error(transparent)]
    Build(BoxError),

    /// The request could not be sent or no response arrived.
    #[error(transparent)]
    Send(BoxError),

    /// Headers arrived but draining the body failed.
    #[error("{source}")]
    Body {
        status: u16,
        #[source]
        source: BoxError,
    },
}

/// Executes one HTTP round trip. Implementations must be safe to share
/// between concurrent requests.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Production transport backed by reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(inner: reqwest::Client) -> Self {
        Self { inner }
    }

    /// Transport over the process-wide default reqwest client.
    pub fn shared() -> Self {
        static SHARED: OnceLock<reqwest::Client> = OnceLock::new();
        Self::new(SHARED.get_or_init(reqwest::Client::new).clone())
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::shared()
    }
}

impl From<ReqwestTransport> for Arc<dyn Transport> {
    fn from(transport: ReqwestTransport) -> Self {
        Arc::new(transport)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        };
        let mut builder = self.inner.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        let built = builder
            .build()
            .map_err(|e| TransportError::Build(Box::new(e)))?;

        let response = self
            .inner
            .execute(built)
            .await
            .map_err(|e| TransportError::Send(Box::new(e)))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    String::from_utf8_lossy(v.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.bytes().await.map_err(|e| TransportError::Body {
            status,
            source: Box::new(e),
        })?;

        Ok(HttpResponse {
            url: request.url,
            status,
            headers,
            body: body.to_vec(),
        })
    }
}
