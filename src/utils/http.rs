//! HTTP client utilities.

use reqwest::{Client, RequestBuilder};
use std::time::Duration;

use crate::config::HttpConfig;
use crate::sources::SourceError;

/// Shared HTTP client; one connection pool for all sources
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a client from the configured user agent and timeouts
    pub fn new(config: &HttpConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| SourceError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Start a GET request
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.client.get(url)
    }
}

/// Join key/value pairs into a percent-encoded query string
pub fn encode_query<K, V>(params: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k.as_ref(), urlencoding::encode(v.as_ref())))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_query() {
        let query = encode_query(&[("term", "deep learning[Title]"), ("retmax", "5")]);
        assert_eq!(query, "term=deep%20learning%5BTitle%5D&retmax=5");
    }

    #[test]
    fn test_client_from_config() {
        assert!(HttpClient::new(&HttpConfig::default()).is_ok());
    }
}
