//! Authenticated HTTP client
//!
//! Performs exactly one call per request and classifies the outcome:
//! - 429 becomes [`Error::RateLimited`] with the `Retry-After` wait
//! - any other non-200 status becomes [`Error::HttpStatus`], body unread
//! - 200 bodies are read fully and handed to a decoder
//!
//! Retrying is left to the caller.

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use crate::config::HttpSettings;
use crate::error::{Error, Result};
use crate::types::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Client, Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Wait used when a 429 response carries no usable `Retry-After`
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);

const CONTENT_JSON: &str = "application/json";
const CONTENT_FORM: &str = "application/x-www-form-urlencoded";

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL for relative request paths
    pub base_url: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Bearer token sent with every request
    pub bearer_token: Option<String>,
    /// Client-side pacing
    pub rate_limit: Option<RateLimiterConfig>,
    /// Default headers for all requests
    pub default_headers: HashMap<String, String>,
    /// User agent string
    pub user_agent: String,
    /// Dump requests and responses at debug level
    pub debug: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(30),
            bearer_token: None,
            rate_limit: None,
            default_headers: HashMap::new(),
            user_agent: format!("calendula/{}", env!("CARGO_PKG_VERSION")),
            debug: false,
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }

    /// Builder pre-filled from the shared HTTP settings
    pub fn from_settings(settings: &HttpSettings, debug: bool) -> HttpClientConfigBuilder {
        let mut builder = Self::builder().timeout(settings.timeout()).debug(debug);
        if let Some(rps) = settings.requests_per_second {
            builder = builder.rate_limit(RateLimiterConfig::new(rps, rps));
        }
        builder
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the bearer token
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.config.bearer_token = Some(token.into());
        self
    }

    /// Enable client-side pacing
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Toggle request/response dumps
    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// Request payload
#[derive(Debug, Clone)]
pub enum RequestBody {
    /// JSON document
    Json(Value),
    /// URL-encoded form
    Form(Vec<(String, String)>),
}

/// Configuration for a single request
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Query parameters, in the order they are sent
    pub query: Vec<(String, String)>,
    /// Request headers
    pub headers: HashMap<String, String>,
    /// Request body
    pub body: Option<RequestBody>,
}

impl RequestConfig {
    /// Create a new request config
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Add a query parameter when a value is present
    #[must_use]
    pub fn query_opt<V: ToString>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set JSON body
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    /// Set form body
    #[must_use]
    pub fn form<K: Into<String>, V: Into<String>>(
        mut self,
        fields: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        self.body = Some(RequestBody::Form(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ));
        self
    }
}

/// HTTP client with bearer authentication and response classification
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    rate_limiter: Option<RateLimiter>,
}

impl HttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);

        Ok(Self {
            client,
            config,
            rate_limiter,
        })
    }

    /// Get the client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Check if client-side pacing is enabled
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }

    /// Make a GET request
    pub async fn get(&self, url: &str) -> Result<Response> {
        self.request(Method::GET, url, RequestConfig::default())
            .await
    }

    /// Make a GET request with config
    pub async fn get_with_config(&self, url: &str, config: RequestConfig) -> Result<Response> {
        self.request(Method::GET, url, config).await
    }

    /// Make a generic request and classify the response
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        config: RequestConfig,
    ) -> Result<Response> {
        if let Some(ref limiter) = self.rate_limiter {
            limiter.wait().await;
        }

        let request = self.build_request(method, url, &config)?;
        if self.config.debug {
            log_request(&request);
        }

        let response = self.client.execute(request).await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = extract_retry_after(response.headers());
            debug!("Rate limited: {} {}, retry after {:?}", method_name(method), url, retry_after);
            return Err(Error::RateLimited { retry_after });
        }

        // Error pages are sometimes HTML; the body is not read.
        if status != StatusCode::OK {
            if self.config.debug {
                log_response_head(status, response.headers());
            }
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        Ok(response)
    }

    /// Make a request and decode the body with `decode`
    pub async fn request_decoded<T, F>(
        &self,
        method: Method,
        url: &str,
        config: RequestConfig,
        decode: F,
    ) -> Result<T>
    where
        F: FnOnce(&[u8]) -> Result<T>,
    {
        let response = self.request(method, url, config).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        if self.config.debug {
            log_response_head(status, &headers);
            debug!("Response body: {}", String::from_utf8_lossy(&body));
        }

        decode(&body)
    }

    /// Make a request and parse the JSON body into `T`
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        config: RequestConfig,
    ) -> Result<T> {
        self.request_decoded(method, url, config, decode_json::<T>)
            .await
    }

    /// Make a GET request and parse JSON response
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.request_json(Method::GET, url, RequestConfig::default())
            .await
    }

    /// Make a GET request with config and parse JSON response
    pub async fn get_json_with_config<T: DeserializeOwned>(
        &self,
        url: &str,
        config: RequestConfig,
    ) -> Result<T> {
        self.request_json(Method::GET, url, config).await
    }

    /// POST a JSON document and parse the JSON response
    pub async fn post_json<T: DeserializeOwned>(&self, url: &str, body: Value) -> Result<T> {
        self.request_json(Method::POST, url, RequestConfig::new().json(body))
            .await
    }

    /// POST a URL-encoded form and parse the JSON response
    pub async fn post_form<T, K, V>(
        &self,
        url: &str,
        fields: impl IntoIterator<Item = (K, V)>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        K: Into<String>,
        V: Into<String>,
    {
        self.request_json(Method::POST, url, RequestConfig::new().form(fields))
            .await
    }

    /// Build an absolute URL from the base URL and escaped path segments
    pub fn endpoint(&self, segments: &[&str]) -> Result<String> {
        let base = self
            .config
            .base_url
            .as_deref()
            .ok_or_else(|| Error::missing_field("base_url"))?;
        join_segments(base, segments)
    }

    /// Build full URL from path
    fn build_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }

        match &self.config.base_url {
            Some(base) => {
                let base = base.trim_end_matches('/');
                let path = path.trim_start_matches('/');
                format!("{base}/{path}")
            }
            None => path.to_string(),
        }
    }

    fn build_request(&self, method: Method, url: &str, config: &RequestConfig) -> Result<Request> {
        let full_url = self.build_url(url);
        let mut req = self
            .client
            .request(method.into(), &full_url)
            .header(ACCEPT, CONTENT_JSON);

        if let Some(ref token) = self.config.bearer_token {
            req = req.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        for (key, value) in &self.config.default_headers {
            req = req.header(key.as_str(), value.as_str());
        }

        if !config.query.is_empty() {
            req = req.query(&config.query);
        }

        req = match &config.body {
            Some(RequestBody::Json(body)) => req.header(CONTENT_TYPE, CONTENT_JSON).json(body),
            Some(RequestBody::Form(fields)) => req
                .header(CONTENT_TYPE, CONTENT_FORM)
                .body(encode_form(fields)),
            None => req.header(CONTENT_TYPE, CONTENT_JSON),
        };

        let mut request = req.build()?;

        // Per-request headers replace any default with the same name.
        for (key, value) in &config.headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| Error::config(format!("invalid header name {key}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::config(format!("invalid value for header {key}: {e}")))?;
            request.headers_mut().insert(name, value);
        }

        Ok(request)
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.config.base_url)
            .field("timeout", &self.config.timeout)
            .field("has_token", &self.config.bearer_token.is_some())
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .field("debug", &self.config.debug)
            .finish_non_exhaustive()
    }
}

/// Decode a JSON body into `T`, keeping the target type in the error
pub fn decode_json<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(Error::decode::<T>)
}

/// Append escaped path segments to a base URL
pub fn join_segments(base: &str, segments: &[&str]) -> Result<String> {
    let mut url = Url::parse(base)?;
    url.path_segments_mut()
        .map_err(|()| Error::config(format!("URL cannot be a base: {base}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url.to_string())
}

fn encode_form(fields: &[(String, String)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(fields)
        .finish()
}

/// Extract retry-after header value
fn extract_retry_after(headers: &HeaderMap) -> Duration {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map_or(DEFAULT_RETRY_AFTER, Duration::from_secs)
}

fn method_name(method: Method) -> &'static str {
    match method {
        Method::GET => "GET",
        Method::POST => "POST",
    }
}

fn log_request(request: &Request) {
    let mut dump = format!("{} {}\n", request.method(), request.url());
    for (name, value) in request.headers() {
        if name == AUTHORIZATION {
            dump.push_str(&format!("{name}: Bearer ***\n"));
        } else {
            dump.push_str(&format!("{name}: {}\n", value.to_str().unwrap_or("<binary>")));
        }
    }
    if let Some(body) = request.body().and_then(|b| b.as_bytes()) {
        dump.push('\n');
        dump.push_str(&String::from_utf8_lossy(body));
    }
    debug!("Request:\n{dump}");
}

fn log_response_head(status: StatusCode, headers: &HeaderMap) {
    let mut dump = format!("{status}\n");
    for (name, value) in headers {
        dump.push_str(&format!("{name}: {}\n", value.to_str().unwrap_or("<binary>")));
    }
    debug!("Response:\n{dump}");
}
