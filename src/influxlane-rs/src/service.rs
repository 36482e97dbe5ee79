use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::Url;
use std::sync::Arc;
use tracing::{debug, warn};

use influxlane_core::{ClientConfig, DestinationKey, RetryOptions};

use crate::transport::{Transport, WriteRequest};
use crate::{ApiError, Result, WriteError};

const WRITE_PATH: &str = "/api/v2/write";

/// Base URL and headers of the write endpoint, validated once per client.
#[derive(Debug, Clone)]
pub(crate) struct WriteEndpoint {
    url: Url,
    headers: HeaderMap,
}

impl WriteEndpoint {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base = format!("{}{}", config.url.trim_end_matches('/'), WRITE_PATH);
        let url = Url::parse(&base)
            .map_err(|e| WriteError::InvalidConfig(format!("url '{}': {}", config.url, e)))?;

        let mut authorization = HeaderValue::from_str(&config.authorization())
            .map_err(|_| WriteError::InvalidConfig("token contains invalid characters".into()))?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization);
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("influxlane-rs/", env!("CARGO_PKG_VERSION"))),
        );

        Ok(Self { url, headers })
    }

    /// `<base>/api/v2/write?org=..&bucket=..&precision=..`
    pub fn url_for(&self, destination: &DestinationKey) -> String {
        let mut url = self.url.clone();
        url.query_pairs_mut()
            .append_pair("org", &destination.org)
            .append_pair("bucket", &destination.bucket)
            .append_pair("precision", destination.precision.as_str());
        url.to_string()
    }

    pub fn request(&self, destination: &DestinationKey, body: String) -> WriteRequest {
        WriteRequest {
            url: self.url_for(destination),
            headers: self.headers.clone(),
            body,
        }
    }
}

/// Delivers bodies to the endpoint, mapping responses and applying the retry policy.
pub(crate) struct WriteService {
    endpoint: Arc<WriteEndpoint>,
    transport: Arc<dyn Transport>,
    retry: RetryOptions,
}

impl WriteService {
    pub fn new(
        endpoint: Arc<WriteEndpoint>,
        transport: Arc<dyn Transport>,
        retry: RetryOptions,
    ) -> Self {
        Self {
            endpoint,
            transport,
            retry,
        }
    }

    /// Send one body. An empty body sends nothing.
    pub async fn write(&self, destination: &DestinationKey, body: String) -> Result<()> {
        if body.is_empty() {
            return Ok(());
        }

        let request = self.endpoint.request(destination, body);
        let mut attempt = 0;
        loop {
            match self.send_once(destination, request.clone()).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < self.retry.max_retries && e.is_retryable() => {
                    let delay = match &e {
                        WriteError::Api(api) => api.retry_after(),
                        _ => None,
                    }
                    .unwrap_or_else(|| self.retry.backoff(attempt))
                    .min(self.retry.max_retry_delay());

                    attempt += 1;
                    warn!(
                        destination = %destination,
                        attempt,
                        max_retries = self.retry.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "Write failed, retrying: {}",
                        e
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_once(&self, destination: &DestinationKey, request: WriteRequest) -> Result<()> {
        debug!(
            destination = %destination,
            lines = request.body.lines().count(),
            bytes = request.body.len(),
            "Sending write request"
        );

        let response = self.transport.send(request).await?;

        if !response.is_success() {
            return Err(WriteError::Api(ApiError {
                status: response.status,
                headers: response.headers,
                body: response.body,
            }));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTransport;
    use influxlane_core::WritePrecision;
    use std::time::Duration;

    fn config() -> ClientConfig {
        ClientConfig::new("http://localhost:9999", "my-token", "my-org", "my-bucket")
    }

    fn destination() -> DestinationKey {
        DestinationKey::new("my-org", "my-bucket", WritePrecision::Ns)
    }

    fn service(transport: &MockTransport, retry: RetryOptions) -> WriteService {
        let endpoint = Arc::new(WriteEndpoint::new(&config()).unwrap());
        WriteService::new(endpoint, Arc::new(transport.clone()), retry)
    }

    fn fast_retry(max_retries: u32) -> RetryOptions {
        RetryOptions::new(max_retries, Duration::from_millis(1))
    }

    #[test]
    fn test_url_for_destination() {
        let endpoint = WriteEndpoint::new(&config()).unwrap();
        assert_eq!(
            endpoint.url_for(&destination()),
            "http://localhost:9999/api/v2/write?org=my-org&bucket=my-bucket&precision=ns"
        );

        let odd = DestinationKey::new("my org", "a&b", WritePrecision::S);
        assert_eq!(
            endpoint.url_for(&odd),
            "http://localhost:9999/api/v2/write?org=my+org&bucket=a%26b&precision=s"
        );
    }

    #[test]
    fn test_url_trailing_slash() {
        let mut config = config();
        config.url = "http://localhost:9999/".to_string();
        let endpoint = WriteEndpoint::new(&config).unwrap();
        assert!(endpoint
            .url_for(&destination())
            .starts_with("http://localhost:9999/api/v2/write?"));
    }

    #[test]
    fn test_invalid_url_rejected() {
        let mut config = config();
        config.url = "not a url".to_string();
        assert!(matches!(
            WriteEndpoint::new(&config),
            Err(WriteError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_body_sends_nothing() {
        let transport = MockTransport::new();
        service(&transport, RetryOptions::default())
            .write(&destination(), String::new())
            .await
            .unwrap();
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_no_retry_by_default() {
        let transport = MockTransport::new();
        transport.respond_with_status(503, "");

        let result = service(&transport, RetryOptions::default())
            .write(&destination(), "m v=1i".to_string())
            .await;

        assert!(matches!(result, Err(WriteError::Api(ref e)) if e.status == 503));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_retry_until_success() {
        let transport = MockTransport::new();
        transport.respond_with_status(503, "");
        transport.respond_with_error("connection reset");
        transport.respond_with_status(204, "");

        service(&transport, fast_retry(3))
            .write(&destination(), "m v=1i".to_string())
            .await
            .unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 3);
        assert!(requests.iter().all(|r| r.body == "m v=1i"));
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_retries() {
        let transport = MockTransport::new();
        transport.respond_with_status(429, "");
        transport.respond_with_status(429, "");
        transport.respond_with_status(429, "");

        let result = service(&transport, fast_retry(1))
            .write(&destination(), "m v=1i".to_string())
            .await;

        assert!(matches!(result, Err(WriteError::Api(ref e)) if e.status == 429));
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let transport = MockTransport::new();
        transport.respond_with_status(400, r#"{"code":"invalid","message":"bad"}"#);

        let result = service(&transport, fast_retry(3))
            .write(&destination(), "m v=1i".to_string())
            .await;

        assert!(matches!(result, Err(WriteError::Api(ref e)) if e.status == 400));
        assert_eq!(transport.requests().len(), 1);
    }
}
