//! HTTP client setup and middleware configuration.
//!
//! One client is built per run and shared by every fetch task. It carries the
//! whole network configuration of the run: connection pool size, the single
//! outbound proxy and default headers. Requests are traced through
//! `reqwest-tracing`.
//!
//! The client never retries on its own. A failed request is a mirror failure
//! and the mirror loop decides what happens next, so each mirror is hit at
//! most once per item.
//!
//! # Examples
//!
//! ```rust
//! use meta4fetch::http::{create_http_client, HttpClientConfig};
//! use reqwest::header::{HeaderMap, USER_AGENT};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut headers = HeaderMap::new();
//! headers.insert(USER_AGENT, "tile-sync/1.0".parse()?);
//!
//! let config = HttpClientConfig {
//!     pool_size: 4,
//!     proxy: None,
//!     headers: Some(headers),
//! };
//!
//! let client = create_http_client(config)?;
//! # Ok(())
//! # }
//! ```

use reqwest::{header::HeaderMap, Proxy};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_tracing::TracingMiddleware;

/// Configuration for HTTP client setup.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Maximum idle connections kept per host.
    pub pool_size: usize,
    /// Proxy for every request. `None` means direct connections.
    pub proxy: Option<Proxy>,
    /// Default headers to include with all requests.
    pub headers: Option<HeaderMap>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            pool_size: 8,
            proxy: None,
            headers: None,
        }
    }
}

/// Creates an HTTP client with middleware configuration.
///
/// The proxy in `config` is the only one used: proxies from the environment
/// are resolved once by the caller, not per request.
pub fn create_http_client(
    config: HttpClientConfig,
) -> Result<ClientWithMiddleware, reqwest::Error> {
    let mut inner_client_builder = reqwest::Client::builder()
        .pool_max_idle_per_host(config.pool_size)
        .no_proxy();

    if let Some(proxy) = config.proxy {
        inner_client_builder = inner_client_builder.proxy(proxy);
    }

    if let Some(headers) = config.headers {
        inner_client_builder = inner_client_builder.default_headers(headers);
    }

    let inner_client = inner_client_builder.build()?;

    let client = ClientBuilder::new(inner_client)
        // Trace HTTP requests. See the tracing crate to make use of these traces.
        .with(TracingMiddleware::default())
        .build();

    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderValue, USER_AGENT};

    #[test]
    fn test_default_config() {
        let config = HttpClientConfig::default();
        assert_eq!(config.pool_size, 8);
        assert!(config.proxy.is_none());
        assert!(config.headers.is_none());
    }

    #[test]
    fn test_create_http_client_with_proxy_and_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("test-agent"));

        let config = HttpClientConfig {
            pool_size: 2,
            proxy: Some(Proxy::all("http://proxy.test:3128").unwrap()),
            headers: Some(headers),
        };

        assert!(create_http_client(config).is_ok());
    }
}
