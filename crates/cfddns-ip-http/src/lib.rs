// # HTTP IP Source
//
// This crate provides the echo-service IP source for the cfddns agent.
//
// ## Architecture
//
// Each address family has its own echo URL (e.g. ipv4.icanhazip.com and
// ipv6.icanhazip.com). A family-specific hostname only resolves over that
// family, so a host without IPv6 connectivity simply fails the IPv6 probe.
//
// The response body is returned trimmed and otherwise untouched; whatever
// the echo service answers is what gets written to DNS.

use cfddns_core::config::IpFamily;
use cfddns_core::traits::IpSource;
use cfddns_core::{Error, Result};

use std::time::Duration;

/// Default IPv4 echo service
pub const DEFAULT_IPV4_URL: &str = "https://ipv4.icanhazip.com/";

/// Default IPv6 echo service
pub const DEFAULT_IPV6_URL: &str = "https://ipv6.icanhazip.com/";

/// Default HTTP timeout for a single probe (10 seconds)
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Echo-service IP source
#[derive(Debug, Clone)]
pub struct EchoIpSource {
    /// URL answering with the caller's IPv4 address
    ipv4_url: String,

    /// URL answering with the caller's IPv6 address
    ipv6_url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl EchoIpSource {
    /// Create a new echo IP source
    ///
    /// # Parameters
    ///
    /// - `ipv4_url`: URL to fetch the IPv4 address from
    /// - `ipv6_url`: URL to fetch the IPv6 address from
    /// - `timeout`: Per-request timeout
    pub fn new(ipv4_url: impl Into<String>, ipv6_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::ip_source(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            ipv4_url: ipv4_url.into(),
            ipv6_url: ipv6_url.into(),
            client,
        })
    }

    /// Create a source using the public icanhazip endpoints
    pub fn with_defaults() -> Result<Self> {
        Self::new(DEFAULT_IPV4_URL, DEFAULT_IPV6_URL, DEFAULT_HTTP_TIMEOUT)
    }

    fn url_for(&self, family: IpFamily) -> &str {
        match family {
            IpFamily::V4 => &self.ipv4_url,
            IpFamily::V6 => &self.ipv6_url,
        }
    }

    /// Fetch the address text from an echo service
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::ip_source(format!("Request to {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(Error::ip_source(format!(
                "HTTP error from {}: {}",
                url,
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::ip_source(format!("Failed to read response: {}", e)))?;

        let address = body.trim();
        if address.is_empty() {
            return Err(Error::ip_source(format!("Empty response from {}", url)));
        }

        Ok(address.to_string())
    }
}

#[async_trait::async_trait]
impl IpSource for EchoIpSource {
    async fn current(&self, family: IpFamily) -> Result<String> {
        let url = self.url_for(family);
        tracing::debug!("Probing public {} address via {}", family, url);

        let address = self.fetch(url).await?;
        tracing::debug!("Public {} address is {}", family, address);
        Ok(address)
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}
