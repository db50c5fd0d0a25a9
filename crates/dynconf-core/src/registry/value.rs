//! Resolved configuration values

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Which table answered a lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigSource {
    #[default]
    Unknown,
    OnlyFile,
    OnlyRemote,
    Mixed,
}

impl ConfigSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigSource::Unknown => "unknown",
            ConfigSource::OnlyFile => "file",
            ConfigSource::OnlyRemote => "remote",
            ConfigSource::Mixed => "mixed",
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A configuration resolved by name
///
/// File values are the registry's shared copy. Mixed values are a snapshot
/// taken under the registry lock and do not follow later changes.
#[derive(Clone)]
pub enum ConfigValue {
    Mixed(Arc<dyn Any + Send + Sync>),
    File(Arc<dyn Any + Send + Sync>),
    Remote(String),
}

impl ConfigValue {
    pub fn source(&self) -> ConfigSource {
        match self {
            ConfigValue::Mixed(_) => ConfigSource::Mixed,
            ConfigValue::File(_) => ConfigSource::OnlyFile,
            ConfigValue::Remote(_) => ConfigSource::OnlyRemote,
        }
    }

    /// Typed view of a file or mixed value; `None` for remote values or a type mismatch
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        match self {
            ConfigValue::Mixed(v) | ConfigValue::File(v) => v.clone().downcast::<T>().ok(),
            ConfigValue::Remote(_) => None,
        }
    }

    /// Raw content of a remote value
    pub fn as_remote(&self) -> Option<&str> {
        match self {
            ConfigValue::Remote(content) => Some(content),
            _ => None,
        }
    }
}

impl fmt::Debug for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Remote(content) => f.debug_tuple("Remote").field(content).finish(),
            other => write!(f, "{}(..)", other.source().as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downcast_by_variant() {
        let file = ConfigValue::File(Arc::new(8080u16));
        assert_eq!(file.downcast::<u16>().as_deref(), Some(&8080));
        assert!(file.downcast::<String>().is_none());
        assert!(file.as_remote().is_none());
        assert_eq!(file.source(), ConfigSource::OnlyFile);

        let remote = ConfigValue::Remote("port: 1".to_string());
        assert_eq!(remote.as_remote(), Some("port: 1"));
        assert!(remote.downcast::<String>().is_none());
        assert_eq!(remote.source(), ConfigSource::OnlyRemote);
    }

    #[test]
    fn test_source_default_is_unknown() {
        assert_eq!(ConfigSource::default(), ConfigSource::Unknown);
        assert_eq!(ConfigSource::Mixed.to_string(), "mixed");
    }
}
