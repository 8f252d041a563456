use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::metrics::MetricsStoreSettings;
use crate::domain::value_objects::NodeId;
use crate::infrastructure::swift::{AuthMethod, SwiftCredentials};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub auth_url: String,
    pub auth_method: AuthMethod,
    pub username: String,
    pub password: String,
    pub project: Option<String>,
    pub domain: Option<String>,
    pub region: Option<String>,
    pub container: String,
    pub node_id: String,
    pub metrics_flush_interval_secs: u64,
    pub quota_check_interval_secs: u64,
    /// No quota is enforced when unset
    pub quota_limit_bytes: Option<u64>,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auth_url: "http://127.0.0.1:8080/auth/v1.0".to_string(),
            auth_method: AuthMethod::TempAuth,
            username: "test:tester".to_string(),
            password: "testing".to_string(),
            project: None,
            domain: None,
            region: None,
            container: "blobstore".to_string(),
            node_id: "node-1".to_string(),
            metrics_flush_interval_secs: 2,
            quota_check_interval_secs: 60,
            quota_limit_bytes: None,
            request_timeout_secs: 30,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("auth_url", &self.auth_url)
            .field("auth_method", &self.auth_method)
            .field("username", &self.username)
            .field("password", &"***")
            .field("project", &self.project)
            .field("domain", &self.domain)
            .field("region", &self.region)
            .field("container", &self.container)
            .field("node_id", &self.node_id)
            .field("metrics_flush_interval_secs", &self.metrics_flush_interval_secs)
            .field("quota_check_interval_secs", &self.quota_check_interval_secs)
            .field("quota_limit_bytes", &self.quota_limit_bytes)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Missing values and unparsable intervals
    /// fall back to defaults; an unknown auth method or an unparsable quota
    /// limit is an error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let number = |key: &str, default: u64| {
            lookup(key)
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(default)
        };

        let auth_method = match lookup("SWIFT_AUTH_METHOD") {
            Some(value) => value
                .parse()
                .map_err(|e| ConfigError::Invalid(format!("SWIFT_AUTH_METHOD: {}", e)))?,
            None => defaults.auth_method,
        };
        let quota_limit_bytes = match lookup("QUOTA_LIMIT_BYTES") {
            Some(value) => Some(value.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!(
                    "QUOTA_LIMIT_BYTES must be a number of bytes, got {:?}",
                    value
                ))
            })?),
            None => None,
        };

        Ok(Self {
            auth_url: lookup("SWIFT_AUTH_URL").unwrap_or(defaults.auth_url),
            auth_method,
            username: lookup("SWIFT_USERNAME").unwrap_or(defaults.username),
            password: lookup("SWIFT_PASSWORD").unwrap_or(defaults.password),
            project: lookup("SWIFT_PROJECT"),
            domain: lookup("SWIFT_DOMAIN"),
            region: lookup("SWIFT_REGION"),
            container: lookup("SWIFT_CONTAINER").unwrap_or(defaults.container),
            node_id: lookup("NODE_ID").unwrap_or(defaults.node_id),
            metrics_flush_interval_secs: number(
                "METRICS_FLUSH_INTERVAL_SECS",
                defaults.metrics_flush_interval_secs,
            ),
            quota_check_interval_secs: number(
                "QUOTA_CHECK_INTERVAL_SECS",
                defaults.quota_check_interval_secs,
            ),
            quota_limit_bytes,
            request_timeout_secs: number("SWIFT_REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs),
        })
    }

    /// Read a TOML file; absent fields take their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(toml::from_str(&text)?)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.auth_url.starts_with("http://") && !self.auth_url.starts_with("https://") {
            return Err(ConfigError::Invalid(
                "SWIFT_AUTH_URL must start with http:// or https://".to_string(),
            ));
        }

        if self.username.is_empty() {
            return Err(ConfigError::Invalid("SWIFT_USERNAME cannot be empty".to_string()));
        }

        if self.auth_method == AuthMethod::Keystone && self.project.is_none() {
            return Err(ConfigError::Invalid(
                "SWIFT_PROJECT is required for keystone authentication".to_string(),
            ));
        }

        if self.container.trim().is_empty() || self.container.contains('/') {
            return Err(ConfigError::Invalid(
                "SWIFT_CONTAINER must be a non-empty name without '/'".to_string(),
            ));
        }

        self.node_id()?;

        if self.metrics_flush_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "METRICS_FLUSH_INTERVAL_SECS must be at least 1 second".to_string(),
            ));
        }

        if self.quota_check_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "QUOTA_CHECK_INTERVAL_SECS must be at least 1 second".to_string(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "SWIFT_REQUEST_TIMEOUT_SECS must be at least 1 second".to_string(),
            ));
        }

        Ok(())
    }

    pub fn node_id(&self) -> Result<NodeId, ConfigError> {
        NodeId::new(self.node_id.clone()).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn credentials(&self) -> SwiftCredentials {
        SwiftCredentials {
            auth_url: self.auth_url.clone(),
            method: self.auth_method,
            username: self.username.clone(),
            password: self.password.clone(),
            project: self.project.clone(),
            domain: self.domain.clone(),
            region: self.region.clone(),
        }
    }

    pub fn metrics_settings(&self) -> MetricsStoreSettings {
        MetricsStoreSettings::new(
            Duration::from_secs(self.metrics_flush_interval_secs),
            Duration::from_secs(self.quota_check_interval_secs),
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
