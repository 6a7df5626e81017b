use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tracing::{debug, warn};

use ventilator_common::{BridgeError, RetryConfig};

/// One GET against the device. Implementations decide nothing about
/// retries; that lives in [`RetryingClient`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<String, BridgeError>;
}

pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(attempt_timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(attempt_timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<String, BridgeError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| BridgeError::Transport(err.to_string()))?
            .error_for_status()
            .map_err(|err| BridgeError::Transport(err.to_string()))?;

        response
            .text()
            .await
            .map_err(|err| BridgeError::Transport(err.to_string()))
    }
}

/// Bounded sequential retry around a single transport call, with a fixed
/// delay between failed attempts. The delay suspends only this request.
pub struct RetryingClient {
    transport: Arc<dyn Transport>,
    max_attempts: u32,
    retry_delay: Duration,
}

impl RetryingClient {
    pub fn new(transport: Arc<dyn Transport>, retry: &RetryConfig) -> Self {
        Self {
            transport,
            max_attempts: retry.max_attempts.max(1),
            retry_delay: Duration::from_millis(retry.retry_delay_ms),
        }
    }

    pub async fn fetch(&self, url: &str) -> Result<String, BridgeError> {
        let mut last_error = String::new();
        for attempt in 1..=self.max_attempts {
            debug!(
                "request attempt {attempt}/{} to {url}",
                self.max_attempts
            );
            match self.transport.get(url).await {
                Ok(body) => return Ok(body),
                Err(err) => {
                    last_error = err.to_string();
                    if attempt < self.max_attempts {
                        warn!(
                            "retrying request ({attempt}/{}) due to: {last_error}",
                            self.max_attempts
                        );
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }

        warn!("retry failed: {last_error}");
        Err(BridgeError::RetriesExhausted {
            attempts: self.max_attempts,
            last_error,
        })
    }
}
