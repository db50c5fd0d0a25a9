//! Client options for the remote config service
//!
//! These are handed to the `RemoteConnector` untouched apart from the endpoint
//! and namespace, which `Registry::connect_remote` fills in.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

const DEFAULT_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_LOG_LEVEL: &str = "debug";

/// Transport and SDK settings for a remote connection
///
/// # Example
///
/// ```
/// use dynconf_core::remote::ClientOptions;
///
/// let opts = ClientOptions::default()
///     .with_access_key("ak")
///     .with_secret_key("sk")
///     .with_timeout_ms(3_000);
/// assert_eq!(opts.timeout().as_millis(), 3_000);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    pub endpoint: String,
    pub namespace_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub timeout_ms: u64,
    pub log_level: String,
    pub log_dir: PathBuf,
    /// Offline reads fall back to the SDK cache in this directory
    pub cache_dir: PathBuf,
    pub log_stdout: bool,
    pub not_load_cache_at_start: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        let base = dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("dynconf");
        Self {
            endpoint: String::new(),
            namespace_id: String::new(),
            access_key: None,
            secret_key: None,
            username: None,
            password: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_dir: base.join("log"),
            cache_dir: base.join("cache"),
            log_stdout: true,
            not_load_cache_at_start: true,
        }
    }
}

impl ClientOptions {
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_namespace_id(mut self, namespace: impl Into<String>) -> Self {
        self.namespace_id = namespace.into();
        self
    }

    pub fn with_access_key(mut self, key: impl Into<String>) -> Self {
        self.access_key = Some(key.into());
        self
    }

    pub fn with_secret_key(mut self, key: impl Into<String>) -> Self {
        self.secret_key = Some(key.into());
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = dir.into();
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Whether credentials of either kind are present
    pub fn has_credentials(&self) -> bool {
        (self.access_key.is_some() && self.secret_key.is_some())
            || (self.username.is_some() && self.password.is_some())
    }
}

impl std::fmt::Display for ClientOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print secrets
        write!(
            f,
            "endpoint={} namespace={} timeout={}ms credentials={}",
            self.endpoint,
            self.namespace_id,
            self.timeout_ms,
            self.has_credentials()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = ClientOptions::default();
        assert_eq!(opts.timeout_ms, 10_000);
        assert_eq!(opts.log_level, "debug");
        assert!(opts.log_stdout);
        assert!(opts.not_load_cache_at_start);
        assert!(opts.cache_dir.ends_with("dynconf/cache"));
        assert!(!opts.has_credentials());
    }

    #[test]
    fn test_from_yaml_keeps_defaults_for_missing_fields() {
        let opts: ClientOptions = serde_yaml::from_str(
            "endpoint: acm.example.com:8080\nnamespace_id: prod\naccess_key: ak\nsecret_key: sk\n",
        )
        .unwrap();

        assert_eq!(opts.endpoint, "acm.example.com:8080");
        assert_eq!(opts.namespace_id, "prod");
        assert!(opts.has_credentials());
        assert_eq!(opts.timeout_ms, 10_000);
    }

    #[test]
    fn test_display_hides_secrets() {
        let opts = ClientOptions::default()
            .with_endpoint("localhost:8848")
            .with_username("nacos")
            .with_password("hunter2");
        let shown = opts.to_string();
        assert!(shown.contains("localhost:8848"));
        assert!(shown.contains("credentials=true"));
        assert!(!shown.contains("hunter2"));
    }
}
