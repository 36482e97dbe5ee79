use std::sync::Arc;
use tracing::info;

use influxlane_core::{ClientConfig, WriteMode, WriteOptions};

use crate::service::{WriteEndpoint, WriteService};
use crate::transport::{HttpTransport, Transport};
use crate::worker::ErrorCallback;
use crate::write_api::WriteApi;
use crate::Result;

/// InfluxDB write client
pub struct Client {
    config: Arc<ClientConfig>,
    endpoint: Arc<WriteEndpoint>,
    transport: Arc<dyn Transport>,
}

impl Client {
    /// Create a client using the default `reqwest` transport
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(config.timeout(), config.insecure_skip_verify)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a client that sends through a custom transport
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        let endpoint = WriteEndpoint::new(&config)?;

        info!(
            url = %config.url,
            org = %config.org,
            bucket = %config.bucket,
            precision = %config.precision,
            "InfluxDB client created"
        );

        Ok(Self {
            config: Arc::new(config),
            endpoint: Arc::new(endpoint),
            transport,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Create a write API. Batching failures are only logged.
    ///
    /// Batching mode spawns its worker on the current Tokio runtime.
    pub fn create_write_api(&self, options: WriteOptions) -> WriteApi {
        self.build_write_api(options, None)
    }

    /// Create a write API that also reports batching failures to `on_error`
    pub fn create_write_api_with_error_callback(
        &self,
        options: WriteOptions,
        on_error: ErrorCallback,
    ) -> WriteApi {
        self.build_write_api(options, Some(on_error))
    }

    fn build_write_api(&self, options: WriteOptions, on_error: Option<ErrorCallback>) -> WriteApi {
        let service = Arc::new(WriteService::new(
            self.endpoint.clone(),
            self.transport.clone(),
            options.retry.clone(),
        ));

        if options.write_mode == WriteMode::Batching {
            info!(
                batch_size = options.batch_size,
                flush_interval_ms = options.flush_interval_ms,
                max_retries = options.retry.max_retries,
                "Creating batching write API"
            );
        }

        WriteApi::new(self.config.clone(), options, service, on_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTransport;
    use crate::WriteError;

    #[test]
    fn test_invalid_url_fails_fast() {
        let config = ClientConfig::new("localhost without scheme", "t", "o", "b");
        assert!(matches!(
            Client::with_transport(config, Arc::new(MockTransport::new())),
            Err(WriteError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_invalid_token_fails_fast() {
        let config = ClientConfig::new("http://localhost:8086", "bad\ntoken", "o", "b");
        assert!(matches!(
            Client::new(config),
            Err(WriteError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_synchronous_api_needs_no_runtime() {
        let client = Client::with_transport(
            ClientConfig::new("http://localhost:8086", "t", "o", "b"),
            Arc::new(MockTransport::new()),
        )
        .unwrap();

        let write_api = client.create_write_api(WriteOptions::default());
        assert_eq!(write_api.options().write_mode, WriteMode::Synchronous);
        assert_eq!(client.config().org, "o");
    }
}
