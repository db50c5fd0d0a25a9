//! Core traits and types for the remote config service

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::options::ClientOptions;

/// Composite key of one remotely managed document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemoteKey {
    pub data_id: String,
    pub group: String,
}

impl RemoteKey {
    pub fn new(data_id: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            data_id: data_id.into(),
            group: group.into(),
        }
    }

    /// Whether a change event concerns this key
    pub fn matches(&self, event: &ChangeEvent) -> bool {
        self.data_id == event.data_id && self.group == event.group
    }
}

impl fmt::Display for RemoteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.data_id, self.group)
    }
}

/// A change notification delivered by the remote adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub namespace: String,
    pub group: String,
    pub data_id: String,
    pub content: String,
}

impl ChangeEvent {
    pub fn new(namespace: impl Into<String>, key: &RemoteKey, content: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            group: key.group.clone(),
            data_id: key.data_id.clone(),
            content: content.into(),
        }
    }

    pub fn key(&self) -> RemoteKey {
        RemoteKey::new(self.data_id.clone(), self.group.clone())
    }
}

/// Callback invoked by the adapter on its own delivery thread
pub type ChangeCallback = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

/// Errors that can occur talking to the remote service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// No server could be reached with the configured endpoint
    #[error("server list is empty")]
    NoServer,

    #[error("listen failed for {key}: {message}")]
    Listen { key: String, message: String },

    #[error("publish failed for {key}: {message}")]
    Publish { key: String, message: String },

    #[error("remote error: {0}")]
    Other(String),
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// A connected remote config client
///
/// Implementations wrap a vendor SDK or an in-process store. Callbacks passed
/// to `listen` may be invoked on any thread.
pub trait RemoteClient: Send + Sync {
    /// Fetch the current content of a key; an absent key yields an empty string
    fn fetch(&self, key: &RemoteKey) -> RemoteResult<String>;

    /// Subscribe `on_change` to every future change of `key`
    fn listen(&self, key: &RemoteKey, on_change: ChangeCallback) -> RemoteResult<()>;

    /// Publish new content for a key
    fn publish(&self, key: &RemoteKey, content: &str) -> RemoteResult<()>;
}

/// Factory for connected clients
pub trait RemoteConnector: Send + Sync {
    fn connect(&self, options: &ClientOptions) -> RemoteResult<Arc<dyn RemoteClient>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_display_is_ledger_form() {
        let key = RemoteKey::new("mongo.yaml", "DEFAULT_GROUP");
        assert_eq!(key.to_string(), "mongo.yaml:DEFAULT_GROUP");
    }

    #[test]
    fn test_key_matches_event() {
        let key = RemoteKey::new("db", "prod");
        let hit = ChangeEvent::new("ns", &key, "x");
        let miss = ChangeEvent::new("ns", &RemoteKey::new("db", "staging"), "x");

        assert!(key.matches(&hit));
        assert!(!key.matches(&miss));
        assert_eq!(hit.key(), key);
    }
}
