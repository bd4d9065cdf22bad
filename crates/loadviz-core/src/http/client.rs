use std::time::{Duration, Instant};

use crate::error::LoadvizError;
use crate::http::response::ProbeResponse;

const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

/// Wrapper around a reqwest Client with builder-pattern configuration.
pub struct HttpClient {
    inner: reqwest::Client,
}

/// Builder for [`HttpClient`].
pub struct HttpClientBuilder {
    timeout: Duration,
    user_agent: String,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: format!("loadviz/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = ua.into();
        self
    }

    pub fn build(self) -> Result<HttpClient, LoadvizError> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            // Probes run one at a time.
            .pool_max_idle_per_host(1)
            .pool_idle_timeout(POOL_IDLE_TIMEOUT)
            .user_agent(self.user_agent)
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(HttpClient { inner: client })
    }
}

impl HttpClient {
    /// Returns a builder for customising the client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::new()
    }

    /// Send a GET and time it until the body has been fully received.
    ///
    /// Any transport failure (connect, timeout, body read) is returned as an
    /// error; HTTP error statuses are not.
    pub async fn get(&self, url: &str) -> Result<ProbeResponse, LoadvizError> {
        let start = Instant::now();
        let response = self.inner.get(url).send().await?;
        let status = response.status().as_u16();
        response.bytes().await?;
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        Ok(ProbeResponse {
            status,
            elapsed_ms,
        })
    }
}
