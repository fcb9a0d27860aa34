//! Network utilities for talking to the Pinterest resource endpoints.
//!
//! This module provides:
//!
//! - **HTTP Client**: one process-wide, lazily configured `reqwest` client
//!   with connection pooling and compression
//! - **Request headers**: the small set of headers that make a request look
//!   like the site's own same-origin XHR
//! - **JSON helpers**: dot-path extraction in [`json`]
//!
//! There is deliberately no retry or timeout logic here; a failed request
//! surfaces immediately and a hung one stalls its caller.
//!
//! # Examples
//!
//! ```rust,no_run
//! use pinfetch::config::Config;
//! use pinfetch::net::HttpClient;
//!
//! # async fn example() -> pinfetch::Result<()> {
//! let client = HttpClient::new(&Config::default());
//! let url = client.endpoint("/resource/BoardResource/get/")?;
//! let response = client.get(url, "/alice/garden/").await?;
//! let json = HttpClient::read_json(response).await?;
//! # Ok(())
//! # }
//! ```

use once_cell::sync::Lazy;
use reqwest::{
    Client, Response,
    header::{COOKIE, HeaderMap, HeaderName, HeaderValue, USER_AGENT},
};
use serde_json::Value;
use url::Url;

use crate::config::Config;
use crate::error::{Error, Result};

pub mod json;

/// Header telling Pinterest which page the request originates from.
pub const SOURCE_URL_HEADER: &str = "x-pinterest-source-url";

/// Header naming the page handler, required by the resource endpoints.
pub const PWS_HANDLER_HEADER: &str = "x-pinterest-pws-handler";

/// Global HTTP client instance.
///
/// Created on first use and reused for API calls and image downloads alike,
/// so both share one connection pool.
static CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .pool_max_idle_per_host(10)
        .gzip(true)
        .brotli(true)
        .build()
        .expect("Failed to build HTTP client")
});

/// Returns the process-wide `reqwest` client.
pub(crate) fn shared_client() -> &'static Client {
    &CLIENT
}

/// HTTP client wrapper carrying the Pinterest request headers.
///
/// Every request gets `x-requested-with: XMLHttpRequest`, the PWS handler
/// header, the configured user agent and, when present, the session cookie.
/// The per-page `x-pinterest-source-url` header is added by [`get`](HttpClient::get).
#[derive(Clone, Debug)]
pub struct HttpClient {
    api_base: String,
    headers: HeaderMap,
}

impl HttpClient {
    /// Creates a client from the given configuration.
    pub fn new(config: &Config) -> Self {
        let client = Self {
            api_base: config.api_base.trim_end_matches('/').to_string(),
            headers: HeaderMap::new(),
        }
        .with_header("x-requested-with", "XMLHttpRequest")
        .with_header(PWS_HANDLER_HEADER, &config.pws_handler)
        .with_header(USER_AGENT.as_str(), &config.user_agent);

        match &config.cookie {
            Some(cookie) => client.with_header(COOKIE.as_str(), cookie),
            None => client,
        }
    }

    /// Adds a custom header to all requests made by this client.
    ///
    /// Invalid names or values are silently ignored.
    ///
    /// ```rust
    /// use pinfetch::config::Config;
    /// use pinfetch::net::HttpClient;
    ///
    /// let client = HttpClient::new(&Config::default())
    ///     .with_header("accept-language", "en-US");
    /// assert!(client.headers().contains_key("accept-language"));
    /// ```
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (name.parse::<HeaderName>(), value.parse::<HeaderValue>()) {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Joins a path onto the configured API origin.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        Url::parse(&format!("{}{}", self.api_base, path))
            .map_err(|e| Error::Other(format!("Invalid endpoint {}: {}", path, e)))
    }

    /// Performs a GET request on behalf of the page at `source_url`.
    ///
    /// The response is returned whatever its status; callers decide what a
    /// non-success status means for them.
    ///
    /// # Errors
    ///
    /// * [`Error::Network`] - connection or transport failure
    /// * [`Error::Other`] - `source_url` cannot be sent as a header value
    pub async fn get(&self, url: Url, source_url: &str) -> Result<Response> {
        let source_header = HeaderValue::from_str(source_url)
            .map_err(|e| Error::Other(format!("Invalid source url {}: {}", source_url, e)))?;

        let mut headers = self.headers.clone();
        headers.insert(HeaderName::from_static(SOURCE_URL_HEADER), source_header);

        Ok(CLIENT.get(url).headers(headers).send().await?)
    }

    /// Reads a response body as JSON.
    pub async fn read_json(response: Response) -> Result<Value> {
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(Into::into)
    }
}
