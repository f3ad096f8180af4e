//! Runtime configuration
//!
//! Endpoints, tokens and client settings for every tool live in one
//! [`Config`] that is threaded through the client constructors. Values come
//! from built-in defaults, an optional YAML file, and finally the process
//! environment (highest precedence).

use crate::error::{Error, Result};
use crate::types::OptionStringExt;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default audit API base URL
pub const DEFAULT_AUDIT_URL: &str = "https://api.slack.com/audit/v1/";

/// Default directory identity provider
pub const DEFAULT_PROVIDER: &str = "ad";

/// Default directory connection
pub const DEFAULT_CONNECTION: &str = "ldap";

// Environment variable names
pub const ENV_DEBUG: &str = "DEBUG";
pub const ENV_DIRECTORY_ENDPOINT: &str = "AUTH0_ENDPOINT";
pub const ENV_DIRECTORY_TOKEN: &str = "AUTH0_TOKEN";
pub const ENV_DIRECTORY_PROVIDER: &str = "AUTH_PROVIDER";
pub const ENV_DIRECTORY_CONNECTION: &str = "AUTH_CONNECTION";
pub const ENV_AUDIT_TOKEN: &str = "ACCESS_TOKEN";
pub const ENV_AUDIT_URL: &str = "AUDIT_URL";
pub const ENV_CLOUD_REGION: &str = "CLOUD_REGION";
pub const ENV_CLOUD_PROFILE: &str = "CLOUD_PROFILE";
pub const ENV_HTTP_TIMEOUT: &str = "HTTP_TIMEOUT_SECS";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete runtime configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Log full requests and responses
    #[serde(default)]
    pub debug: bool,

    /// User directory settings
    #[serde(default)]
    pub directory: DirectoryConfig,

    /// Audit-log API settings
    #[serde(default)]
    pub audit: AuditConfig,

    /// Cloud SDK settings
    #[serde(default)]
    pub cloud: CloudConfig,

    /// HTTP client settings shared by the REST tools
    #[serde(default)]
    pub http: HttpSettings,
}

impl Config {
    /// Load configuration from an optional YAML file and the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.with_env(|key| std::env::var(key).ok())
    }

    /// Read a YAML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply environment overrides using the given variable lookup
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).none_if_empty();

        if let Some(debug) = get(ENV_DEBUG) {
            self.debug = debug.eq_ignore_ascii_case("true") || debug == "1";
        }

        if let Some(endpoint) = get(ENV_DIRECTORY_ENDPOINT) {
            self.directory.endpoint = Some(endpoint);
        }
        if let Some(token) = get(ENV_DIRECTORY_TOKEN) {
            self.directory.token = Some(token);
        }
        if let Some(provider) = get(ENV_DIRECTORY_PROVIDER) {
            self.directory.provider = provider;
        }
        if let Some(connection) = get(ENV_DIRECTORY_CONNECTION) {
            self.directory.connection = connection;
        }

        if let Some(token) = get(ENV_AUDIT_TOKEN) {
            self.audit.token = Some(token);
        }
        if let Some(url) = get(ENV_AUDIT_URL) {
            self.audit.base_url = url;
        }

        if let Some(region) = get(ENV_CLOUD_REGION) {
            self.cloud.region = Some(region);
        }
        if let Some(profile) = get(ENV_CLOUD_PROFILE) {
            self.cloud.profile = Some(profile);
        }

        if let Some(timeout) = get(ENV_HTTP_TIMEOUT) {
            self.http.timeout_secs = timeout.parse().map_err(|_| {
                Error::config(format!("{ENV_HTTP_TIMEOUT} must be a number, got '{timeout}'"))
            })?;
        }

        Ok(self)
    }
}

// ============================================================================
// Directory
// ============================================================================

/// Identity-provider user directory settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Management API base URL (e.g. `https://tenant.auth0.com/api/v2/`)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Bearer token
    #[serde(default)]
    pub token: Option<String>,

    /// Identity provider prefix of user ids
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Connection name of user ids
    #[serde(default = "default_connection")]
    pub connection: String,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            token: None,
            provider: default_provider(),
            connection: default_connection(),
        }
    }
}

fn default_provider() -> String {
    DEFAULT_PROVIDER.to_string()
}

fn default_connection() -> String {
    DEFAULT_CONNECTION.to_string()
}

// ============================================================================
// Audit
// ============================================================================

/// Audit-log API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Audit API base URL
    #[serde(default = "default_audit_url")]
    pub base_url: String,

    /// Bearer token
    #[serde(default)]
    pub token: Option<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            base_url: default_audit_url(),
            token: None,
        }
    }
}

fn default_audit_url() -> String {
    DEFAULT_AUDIT_URL.to_string()
}

// ============================================================================
// Cloud
// ============================================================================

/// Cloud SDK settings; unset values fall back to the SDK's own resolution
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CloudConfig {
    /// Region override
    #[serde(default)]
    pub region: Option<String>,

    /// Named profile override
    #[serde(default)]
    pub profile: Option<String>,
}

// ============================================================================
// HTTP
// ============================================================================

/// HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Client-side pacing; unset means no pacing
    #[serde(default)]
    pub requests_per_second: Option<u32>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            requests_per_second: None,
        }
    }
}

impl HttpSettings {
    /// Request timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_timeout_secs() -> u64 {
    30
}
