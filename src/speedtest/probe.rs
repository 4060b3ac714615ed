use super::error::{Result, SpeedTestError};
use super::{download, ping, upload};
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;

pub const DEFAULT_SERVER: &str = "https://speed.cloudflare.com";

/// Shortest elapsed time used in a rate conversion.
const MIN_ELAPSED_SECS: f64 = 1e-6;

/// One throughput probe: how much moved and how long it took.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transfer {
    pub bytes: u64,
    pub seconds: f64,
}

impl Transfer {
    pub fn bits_per_second(&self) -> f64 {
        (self.bytes as f64 / self.seconds.max(MIN_ELAPSED_SECS)) * 8.0
    }
}

/// Round trips against the measurement endpoint.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Network latency in seconds, net of server processing time.
    async fn latency(&self) -> Result<f64>;

    async fn download(&self, bytes: u64) -> Result<Transfer>;

    async fn upload(&self, bytes: u64) -> Result<Transfer>;
}

#[derive(Debug, Clone)]
pub struct Endpoints {
    pub down: String,
    pub up: String,
}

impl Endpoints {
    pub fn new(server: &str) -> Self {
        let server = server.trim_end_matches('/');
        Self {
            down: format!("{}/__down", server),
            up: format!("{}/__up", server),
        }
    }
}

/// `Probe` over HTTP, sharing one connection pool across every request.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client,
    endpoints: Endpoints,
}

impl HttpProbe {
    pub fn new(server: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self::with_client(builder.build()?, server))
    }

    pub fn with_client(client: Client, server: &str) -> Self {
        Self {
            client,
            endpoints: Endpoints::new(server),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn latency(&self) -> Result<f64> {
        ping::latency_probe(&self.client, &self.endpoints.down).await
    }

    async fn download(&self, bytes: u64) -> Result<Transfer> {
        download::download_probe(&self.client, &self.endpoints.down, bytes).await
    }

    async fn upload(&self, bytes: u64) -> Result<Transfer> {
        upload::upload_probe(&self.client, &self.endpoints.up, bytes).await
    }
}

pub(crate) fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(SpeedTestError::Status {
            url: response.url().to_string(),
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_per_second() {
        let transfer = Transfer {
            bytes: 10_000_000,
            seconds: 1.0,
        };
        assert_eq!(transfer.bits_per_second(), 80_000_000.0);
    }

    #[test]
    fn test_bits_per_second_with_zero_elapsed_is_finite() {
        let transfer = Transfer {
            bytes: 1_000,
            seconds: 0.0,
        };
        assert!(transfer.bits_per_second().is_finite());
    }

    #[test]
    fn test_endpoints_strip_trailing_slash() {
        let endpoints = Endpoints::new("http://127.0.0.1:1234/");
        assert_eq!(endpoints.down, "http://127.0.0.1:1234/__down");
        assert_eq!(endpoints.up, "http://127.0.0.1:1234/__up");
    }
}
