use reqwest::header::HeaderMap;
use reqwest::Client as HttpClient;
use std::time::Duration;

use crate::Result;

/// A fully built write request.
#[derive(Debug, Clone)]
pub struct WriteRequest {
    pub url: String,
    pub headers: HeaderMap,
    pub body: String,
}

/// Raw response of a write request, whatever its status.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends write requests. Connection pooling, TLS and timeouts live behind this trait.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: WriteRequest) -> Result<TransportResponse>;
}

/// Default transport backed by `reqwest`
pub struct HttpTransport {
    client: HttpClient,
}

impl HttpTransport {
    pub fn new(timeout: Duration, insecure_skip_verify: bool) -> Result<Self> {
        let client = HttpClient::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(insecure_skip_verify)
            .build()?;

        Ok(Self { client })
    }

    /// Use an already configured client
    pub fn from_client(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: WriteRequest) -> Result<TransportResponse> {
        let response = self
            .client
            .post(&request.url)
            .headers(request.headers)
            .body(request.body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}
