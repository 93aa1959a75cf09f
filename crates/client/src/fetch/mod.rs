//! HTTP fetch pipeline for the offline cache worker.
//!
//! ### Status Handling
//! - Every HTTP status is handed back to the worker as a response; deciding
//!   what is cacheable is the worker's job.
//! - Only transport failures (DNS, connect, reset, timeout) are errors.
//!
//! ### Cache Busting
//! - `FetchMode::NoStore` sends `Cache-Control: no-store` and `Pragma: no-cache`
//!   so proxies and CDNs neither serve nor keep a stale copy.
//!
//! ### Limits
//! - Max redirects: 5
//! - Max body bytes: 5MB (configurable)

pub mod url;

use reqwest::Url;
use reqwest::{Client, header};
use shellcache_core::{AppConfig, Error, FetchMode, Network, Request, Response};
use std::time::{Duration, Instant};

pub use self::url::{UrlError, check_target};

/// Configuration for the HTTP network.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// User agent string (default: "shellcache/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,

    /// Honour HTTP(S)_PROXY from the environment (default: true)
    pub use_system_proxy: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            user_agent: "shellcache/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
            use_system_proxy: true,
        }
    }
}

impl From<&AppConfig> for NetworkConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            ..Default::default()
        }
    }
}

/// The real network, backed by reqwest.
pub struct HttpNetwork {
    http: Client,
    config: NetworkConfig,
}

impl HttpNetwork {
    /// Create a new network client with the given configuration.
    pub fn new(config: NetworkConfig) -> Result<Self, Error> {
        let mut builder = Client::builder();
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }

        let http = builder
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    fn build_request(&self, url: &Url, request: &Request, mode: FetchMode) -> reqwest::RequestBuilder {
        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes()).unwrap_or(reqwest::Method::GET);
        let mut builder = self.http.request(method, url.as_str());

        if let Some(accept) = &request.accept {
            builder = builder.header(header::ACCEPT, accept);
        }

        if mode == FetchMode::NoStore {
            builder = builder
                .header(header::CACHE_CONTROL, "no-store")
                .header(header::PRAGMA, "no-cache");
        }

        builder
    }
}

#[async_trait::async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, url: &Url, request: &Request, mode: FetchMode) -> Result<Response, Error> {
        let start = Instant::now();
        check_target(url).map_err(|e| Error::InvalidUrl(e.to_string()))?;

        let response = self
            .build_request(url, request, mode)
            .send()
            .await
            .map_err(|e| Error::Network(format!("network error: {}", e)))?;

        let status = response.status();

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!(
                "{} bytes exceeds {}",
                len, self.config.max_bytes
            )));
        }

        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
            .collect();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("failed to read response: {}", e)))?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!(
                "{} bytes exceeds {}",
                bytes.len(),
                self.config.max_bytes
            )));
        }

        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(
            url = %url,
            status = status.as_u16(),
            no_store = mode == FetchMode::NoStore,
            bytes = bytes.len(),
            fetch_ms,
            "fetched"
        );

        Ok(Response::new(status.as_u16(), headers, bytes))
    }
}
