// Shared transport configuration for building reqwest::Client instances.
//
// The original client inherited the platform transport's default timeouts;
// here the timeout is explicit configuration.

use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use thiserror::Error;
use url::Url;

/// Default API endpoint root.
pub const DEFAULT_ENDPOINT: &str = "https://www.amicale-insat.fr/api/";

/// Versioned client identifier sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("amicale-rs/", env!("CARGO_PKG_VERSION"));

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
#[error("failed to build HTTP client: {0}")]
pub struct TransportError(pub String);

/// Transport settings shared by every API call.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// API endpoint root; request paths are joined onto it.
    pub base_url: Url,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_ENDPOINT).expect("default endpoint URL is valid"),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl TransportConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            ..Self::default()
        }
    }

    /// Build a `reqwest::Client` from this config.
    ///
    /// `Accept: application/json` rides along as a default header;
    /// `Content-Type` is set per-request by the JSON body encoder.
    pub fn build_client(&self) -> Result<reqwest::Client, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .default_headers(headers)
            .build()
            .map_err(|e| TransportError(e.to_string()))
    }
}
