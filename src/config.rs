//! Dashboard configuration
//!
//! Settings are layered: a YAML or JSON file, then `ADMIN_PAGER_*`
//! environment variables, then (in the binary) command-line flags. The
//! result is validated once all layers are applied.
//!
//! ```yaml
//! base_url: https://api.example.com
//! auth_token: eyJhbGciOi...
//! items_per_page: 10
//! retry_attempts: 2
//! backoff: exponential
//! resources:
//!   contacts:
//!     path: /api/v2/contact-us
//! ```

use crate::auth::AuthConfig;
use crate::error::{Error, Result};
use crate::fetch::{HttpPageFetcher, RecordClient, DEFAULT_CURSOR_PARAM};
use crate::http::{HttpClient, HttpClientConfig};
use crate::pagination::{RetryPolicy, DEFAULT_ITEMS_PER_PAGE};
use crate::resource::{ResourceKind, ResourceSpec};
use crate::types::{BackoffType, LogLevel};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

// ============================================================================
// Environment Variables
// ============================================================================

/// API base URL
pub const ENV_BASE_URL: &str = "ADMIN_PAGER_BASE_URL";
/// Bearer token
pub const ENV_AUTH_TOKEN: &str = "ADMIN_PAGER_AUTH_TOKEN";
/// Page size
pub const ENV_PAGE_SIZE: &str = "ADMIN_PAGER_PAGE_SIZE";
/// Request timeout in milliseconds
pub const ENV_TIMEOUT_MS: &str = "ADMIN_PAGER_TIMEOUT_MS";
/// Retries per page fetch
pub const ENV_RETRY_ATTEMPTS: &str = "ADMIN_PAGER_RETRY_ATTEMPTS";
/// Log level
pub const ENV_LOG_LEVEL: &str = "ADMIN_PAGER_LOG_LEVEL";

// ============================================================================
// Config Types
// ============================================================================

/// Per-resource overrides
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceOverride {
    /// Collection path, e.g. `/api/v2/products`
    #[serde(default)]
    pub path: Option<String>,

    /// Whether requests carry the bearer token
    #[serde(default)]
    pub requires_auth: Option<bool>,
}

/// Complete dashboard configuration
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// API base URL
    pub base_url: String,

    /// Opaque bearer token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,

    /// Records per page
    pub items_per_page: u32,

    /// Request timeout in milliseconds
    pub timeout_ms: u64,

    /// Retries per page fetch (retryable errors only)
    pub retry_attempts: u32,

    /// Delay growth between retries
    pub backoff: BackoffType,

    /// Delay before the first retry in milliseconds
    pub initial_backoff_ms: u64,

    /// Upper bound on any retry delay in milliseconds
    pub max_backoff_ms: u64,

    /// Query parameter carrying the previous page's cursor
    pub cursor_param: String,

    /// Default log level
    pub log_level: LogLevel,

    /// Per-resource overrides
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub resources: HashMap<ResourceKind, ResourceOverride>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            auth_token: None,
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
            timeout_ms: 10_000,
            retry_attempts: 0,
            backoff: BackoffType::Exponential,
            initial_backoff_ms: 250,
            max_backoff_ms: 10_000,
            cursor_param: DEFAULT_CURSOR_PARAM.to_string(),
            log_level: LogLevel::Info,
            resources: HashMap::new(),
        }
    }
}

impl std::fmt::Debug for DashboardConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardConfig")
            .field("base_url", &self.base_url)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "***"))
            .field("items_per_page", &self.items_per_page)
            .field("timeout_ms", &self.timeout_ms)
            .field("retry_attempts", &self.retry_attempts)
            .field("backoff", &self.backoff)
            .field("cursor_param", &self.cursor_param)
            .field("log_level", &self.log_level)
            .field("resources", &self.resources)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Loading
// ============================================================================

impl DashboardConfig {
    /// Load, apply the environment and validate
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = Self::resolve(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the file (or defaults) and apply the environment, unvalidated
    ///
    /// Callers layering further overrides validate afterwards.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Read a YAML or JSON file, chosen by extension
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                Error::Io(e)
            }
        })?;

        debug!(path = %path.display(), "Loading configuration");
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_yaml_str(&content),
        }
    }

    /// Parse YAML
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parse JSON
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Apply `ADMIN_PAGER_*` variables from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable source
    ///
    /// Values that fail to parse are skipped with a warning and the previous
    /// value stays.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(url) = lookup(ENV_BASE_URL) {
            self.base_url = url;
        }
        if let Some(token) = lookup(ENV_AUTH_TOKEN) {
            self.auth_token = Some(token);
        }
        if let Some(size) = parse_env(ENV_PAGE_SIZE, lookup(ENV_PAGE_SIZE)) {
            self.items_per_page = size;
        }
        if let Some(timeout) = parse_env(ENV_TIMEOUT_MS, lookup(ENV_TIMEOUT_MS)) {
            self.timeout_ms = timeout;
        }
        if let Some(attempts) = parse_env(ENV_RETRY_ATTEMPTS, lookup(ENV_RETRY_ATTEMPTS)) {
            self.retry_attempts = attempts;
        }
        if let Some(level) = parse_env(ENV_LOG_LEVEL, lookup(ENV_LOG_LEVEL)) {
            self.log_level = level;
        }
    }

    /// Validate the merged configuration
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::missing_field("base_url"));
        }

        let url = url::Url::parse(&self.base_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::invalid_value(
                "base_url",
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }

        if self.items_per_page == 0 {
            return Err(Error::invalid_value(
                "items_per_page",
                "must be greater than zero",
            ));
        }

        if self.timeout_ms == 0 {
            return Err(Error::invalid_value("timeout_ms", "must be greater than zero"));
        }

        if self.cursor_param.trim().is_empty() {
            return Err(Error::invalid_value("cursor_param", "cannot be empty"));
        }

        for (kind, resource) in &self.resources {
            if let Some(path) = &resource.path {
                if !path.starts_with('/') {
                    return Err(Error::invalid_value(
                        format!("resources.{kind}.path"),
                        "must start with '/'",
                    ));
                }
            }
        }

        Ok(())
    }
}

fn parse_env<T: FromStr>(key: &str, value: Option<String>) -> Option<T> {
    let value = value?;
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!(variable = key, value = %value, "Ignoring unparseable environment value");
            None
        }
    }
}

// ============================================================================
// Component Construction
// ============================================================================

impl DashboardConfig {
    /// Request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Authentication derived from the token
    pub fn auth_config(&self) -> AuthConfig {
        self.auth_token
            .as_deref()
            .map_or(AuthConfig::None, AuthConfig::bearer)
    }

    /// Controller retry policy
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::retries(self.retry_attempts).with_backoff(
            self.backoff,
            Duration::from_millis(self.initial_backoff_ms),
            Duration::from_millis(self.max_backoff_ms.max(self.initial_backoff_ms)),
        )
    }

    /// Resource definition with overrides applied
    pub fn resource(&self, kind: ResourceKind) -> ResourceSpec {
        let mut spec = ResourceSpec::new(kind);
        if let Some(overrides) = self.resources.get(&kind) {
            if let Some(path) = &overrides.path {
                spec = spec.with_path(path.clone());
            }
            if let Some(requires_auth) = overrides.requires_auth {
                spec = spec.with_auth(requires_auth);
            }
        }
        spec
    }

    /// Build the authenticated HTTP client
    pub fn http_client(&self) -> Result<HttpClient> {
        let config = HttpClientConfig::builder()
            .base_url(self.base_url.trim_end_matches('/'))
            .timeout(self.timeout())
            .build();
        HttpClient::with_auth(config, self.auth_config())
    }

    /// Build a page fetcher for a resource
    pub fn fetcher<T>(&self, client: HttpClient, kind: ResourceKind) -> HttpPageFetcher<T> {
        HttpPageFetcher::new(client, self.resource(kind)).with_cursor_param(&self.cursor_param)
    }

    /// Build a record client for a resource
    pub fn record_client(&self, client: HttpClient, kind: ResourceKind) -> RecordClient {
        RecordClient::new(client, self.resource(kind))
    }
}
