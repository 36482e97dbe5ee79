use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::precision::WritePrecision;

/// Connection settings and write defaults shared by every write API of a client.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    pub url: String,
    pub token: String,
    /// Authorization scheme: "Token" (default) or e.g. "Bearer"
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub org: String,
    pub bucket: String,
    #[serde(default)]
    pub precision: WritePrecision,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub insecure_skip_verify: bool,
}

fn default_token_type() -> String {
    "Token".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl ClientConfig {
    pub fn new(
        url: impl Into<String>,
        token: impl Into<String>,
        org: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
            org: org.into(),
            bucket: bucket.into(),
            ..Self::default()
        }
    }

    pub fn load(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: ClientConfig = serde_json::from_str(&contents)?;
        Ok(config)
    }

    pub fn with_token_type(mut self, token_type: impl Into<String>) -> Self {
        self.token_type = token_type.into();
        self
    }

    pub fn with_precision(mut self, precision: WritePrecision) -> Self {
        self.precision = precision;
        self
    }

    /// Value of the `Authorization` header
    pub fn authorization(&self) -> String {
        format!("{} {}", self.token_type, self.token)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8086".to_string(),
            token: String::new(),
            token_type: default_token_type(),
            org: String::new(),
            bucket: String::new(),
            precision: WritePrecision::default(),
            timeout_ms: default_timeout_ms(),
            insecure_skip_verify: false,
        }
    }
}

/// How a write API delivers data.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// One request per write call, errors returned to the caller
    #[default]
    Synchronous,
    /// Queue and flush in the background by size or interval
    Batching,
}

/// Options fixed at write API creation.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WriteOptions {
    #[serde(default)]
    pub write_mode: WriteMode,

    /// Lines per destination that trigger an immediate flush
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Time between background flushes
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,

    #[serde(default)]
    pub retry: RetryOptions,
}

fn default_batch_size() -> usize {
    10
}

fn default_flush_interval_ms() -> u64 {
    1000
}

impl WriteOptions {
    pub fn synchronous() -> Self {
        Self::default()
    }

    pub fn batching(batch_size: usize, flush_interval: Duration) -> Self {
        Self {
            write_mode: WriteMode::Batching,
            batch_size,
            flush_interval_ms: flush_interval.as_millis() as u64,
            retry: RetryOptions::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryOptions) -> Self {
        self.retry = retry;
        self
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            write_mode: WriteMode::default(),
            batch_size: default_batch_size(),
            flush_interval_ms: default_flush_interval_ms(),
            retry: RetryOptions::default(),
        }
    }
}

/// Retry policy for failed requests. Disabled unless `max_retries` is set.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryOptions {
    #[serde(default)]
    pub max_retries: u32,

    /// Delay before the first retry
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,

    /// Upper bound for any single delay
    #[serde(default = "default_max_retry_delay_ms")]
    pub max_retry_delay_ms: u64,

    #[serde(default = "default_exponential_base")]
    pub exponential_base: u32,
}

fn default_retry_interval_ms() -> u64 {
    5_000
}

fn default_max_retry_delay_ms() -> u64 {
    125_000
}

fn default_exponential_base() -> u32 {
    2
}

impl RetryOptions {
    pub fn new(max_retries: u32, retry_interval: Duration) -> Self {
        Self {
            max_retries,
            retry_interval_ms: retry_interval.as_millis() as u64,
            ..Self::default()
        }
    }

    /// Backoff before retry number `attempt` (0-based), ignoring server hints.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = u64::from(self.exponential_base.max(1)).saturating_pow(attempt);
        let delay = self.retry_interval_ms.saturating_mul(factor);
        Duration::from_millis(delay.min(self.max_retry_delay_ms))
    }

    pub fn max_retry_delay(&self) -> Duration {
        Duration::from_millis(self.max_retry_delay_ms)
    }
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_retries: 0,
            retry_interval_ms: default_retry_interval_ms(),
            max_retry_delay_ms: default_max_retry_delay_ms(),
            exponential_base: default_exponential_base(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_defaults_from_json() {
        let config: ClientConfig = serde_json::from_str(
            r#"{"url": "http://localhost:9999", "token": "my-token", "org": "my-org", "bucket": "my-bucket"}"#,
        )
        .unwrap();

        assert_eq!(config.token_type, "Token");
        assert_eq!(config.precision, WritePrecision::Ns);
        assert_eq!(config.authorization(), "Token my-token");
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert!(!config.insecure_skip_verify);
    }

    #[test]
    fn test_client_config_bearer() {
        let config = ClientConfig::new("http://localhost:9999", "jwt", "o", "b")
            .with_token_type("Bearer")
            .with_precision(WritePrecision::S);
        assert_eq!(config.authorization(), "Bearer jwt");
        assert_eq!(config.precision, WritePrecision::S);
    }

    #[test]
    fn test_write_options_from_json() {
        let options: WriteOptions =
            serde_json::from_str(r#"{"write_mode": "batching", "batch_size": 3}"#).unwrap();
        assert_eq!(options.write_mode, WriteMode::Batching);
        assert_eq!(options.batch_size, 3);
        assert_eq!(options.flush_interval(), Duration::from_millis(1000));
        assert_eq!(options.retry.max_retries, 0);

        let defaults = WriteOptions::default();
        assert_eq!(defaults.write_mode, WriteMode::Synchronous);
        assert_eq!(defaults.batch_size, 10);
    }

    #[test]
    fn test_retry_backoff_is_capped() {
        let retry = RetryOptions {
            max_retries: 5,
            retry_interval_ms: 100,
            max_retry_delay_ms: 1_000,
            exponential_base: 2,
        };
        assert_eq!(retry.backoff(0), Duration::from_millis(100));
        assert_eq!(retry.backoff(1), Duration::from_millis(200));
        assert_eq!(retry.backoff(3), Duration::from_millis(800));
        assert_eq!(retry.backoff(4), Duration::from_millis(1_000));
        assert_eq!(retry.backoff(60), Duration::from_millis(1_000));
    }
}
