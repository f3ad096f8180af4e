//! HTTP client module
//!
//! Provides the bearer-authenticated client used by the directory and
//! audit tools.
//!
//! # Features
//!
//! - **Status classification**: 429 maps to a rate-limit error carrying the
//!   server's `Retry-After`; every other non-200 maps to a status error
//! - **Pacing**: optional token bucket rate limiter using governor
//! - **Debug dumps**: full request/response logging with the token redacted

mod client;
mod rate_limit;

pub use client::{
    decode_json, join_segments, HttpClient, HttpClientConfig, HttpClientConfigBuilder,
    RequestBody, RequestConfig, DEFAULT_RETRY_AFTER,
};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
