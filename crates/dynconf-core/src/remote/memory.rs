//! In-memory remote config service

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::options::ClientOptions;
use super::traits::{
    ChangeCallback, ChangeEvent, RemoteClient, RemoteConnector, RemoteError, RemoteKey,
    RemoteResult,
};

/// In-process remote config service for testing and local development
///
/// Clones share the same documents and listeners. Publishing a key stores the
/// content and then invokes every listener of that key on the publisher's
/// thread, in subscription order.
///
/// # Example
///
/// ```
/// use dynconf_core::remote::{MemoryRemote, RemoteClient, RemoteKey};
///
/// let remote = MemoryRemote::new("dev");
/// let key = RemoteKey::new("app.yaml", "DEFAULT_GROUP");
/// remote.publish(&key, "port: 80").unwrap();
/// assert_eq!(remote.fetch(&key).unwrap(), "port: 80");
/// ```
#[derive(Clone)]
pub struct MemoryRemote {
    inner: Arc<Inner>,
}

struct Inner {
    reachable: bool,
    namespace: RwLock<String>,
    documents: RwLock<HashMap<RemoteKey, String>>,
    listeners: RwLock<HashMap<RemoteKey, Vec<ChangeCallback>>>,
}

impl MemoryRemote {
    /// Create a reachable service scoped to `namespace`
    pub fn new(namespace: impl Into<String>) -> Self {
        Self::build(namespace.into(), true)
    }

    /// Create a service whose every call fails with `RemoteError::NoServer`
    pub fn unreachable() -> Self {
        Self::build(String::new(), false)
    }

    fn build(namespace: String, reachable: bool) -> Self {
        Self {
            inner: Arc::new(Inner {
                reachable,
                namespace: RwLock::new(namespace),
                documents: RwLock::new(HashMap::new()),
                listeners: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Seed a document without notifying listeners
    pub fn with_document(self, key: RemoteKey, content: impl Into<String>) -> Self {
        self.inner.documents.write().insert(key, content.into());
        self
    }

    pub fn namespace(&self) -> String {
        self.inner.namespace.read().clone()
    }

    /// Number of listeners currently subscribed to `key`
    pub fn listener_count(&self, key: &RemoteKey) -> usize {
        self.inner
            .listeners
            .read()
            .get(key)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Deliver an event for `key` under an explicit namespace without storing it
    ///
    /// Simulates a notification from a different tenant or a replayed event.
    pub fn notify(&self, namespace: &str, key: &RemoteKey, content: &str) {
        let event = ChangeEvent::new(namespace, key, content);
        self.deliver(key, &event);
    }

    fn deliver(&self, key: &RemoteKey, event: &ChangeEvent) {
        // Callbacks run without our locks held so they may call back in
        let callbacks: Vec<ChangeCallback> = self
            .inner
            .listeners
            .read()
            .get(key)
            .cloned()
            .unwrap_or_default();

        for callback in callbacks {
            callback(event);
        }
    }

    fn ensure_reachable(&self) -> RemoteResult<()> {
        if self.inner.reachable {
            Ok(())
        } else {
            Err(RemoteError::NoServer)
        }
    }
}

impl RemoteClient for MemoryRemote {
    fn fetch(&self, key: &RemoteKey) -> RemoteResult<String> {
        self.ensure_reachable()?;
        Ok(self
            .inner
            .documents
            .read()
            .get(key)
            .cloned()
            .unwrap_or_default())
    }

    fn listen(&self, key: &RemoteKey, on_change: ChangeCallback) -> RemoteResult<()> {
        self.ensure_reachable()?;
        self.inner
            .listeners
            .write()
            .entry(key.clone())
            .or_default()
            .push(on_change);
        Ok(())
    }

    fn publish(&self, key: &RemoteKey, content: &str) -> RemoteResult<()> {
        self.ensure_reachable()?;
        self.inner
            .documents
            .write()
            .insert(key.clone(), content.to_string());

        let event = ChangeEvent::new(self.namespace(), key, content);
        self.deliver(key, &event);
        Ok(())
    }
}

impl RemoteConnector for MemoryRemote {
    fn connect(&self, options: &ClientOptions) -> RemoteResult<Arc<dyn RemoteClient>> {
        if !options.namespace_id.is_empty() {
            *self.inner.namespace.write() = options.namespace_id.clone();
        }
        Ok(Arc::new(self.clone()))
    }
}

impl std::fmt::Debug for MemoryRemote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryRemote")
            .field("namespace", &self.namespace())
            .field("reachable", &self.inner.reachable)
            .field("documents", &self.inner.documents.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_fetch_missing_is_empty() {
        let remote = MemoryRemote::new("dev");
        assert_eq!(remote.fetch(&RemoteKey::new("none", "g")).unwrap(), "");
    }

    #[test]
    fn test_publish_notifies_only_matching_listeners() {
        let remote = MemoryRemote::new("dev");
        let key = RemoteKey::new("app", "g");
        let other = RemoteKey::new("other", "g");
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        remote
            .listen(&key, Arc::new(move |ev: &ChangeEvent| sink.lock().push(ev.clone())))
            .unwrap();

        remote.publish(&other, "ignored").unwrap();
        remote.publish(&key, "v2").unwrap();

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], ChangeEvent::new("dev", &key, "v2"));
        assert_eq!(remote.listener_count(&key), 1);
        assert_eq!(remote.listener_count(&other), 0);
    }

    #[test]
    fn test_unreachable_reports_no_server() {
        let remote = MemoryRemote::unreachable();
        let key = RemoteKey::new("echo", "echo");
        assert_eq!(remote.publish(&key, "ping"), Err(RemoteError::NoServer));
        assert_eq!(remote.fetch(&key), Err(RemoteError::NoServer));
    }

    #[test]
    fn test_connect_adopts_namespace() {
        let remote = MemoryRemote::new("");
        let client = remote
            .connect(&ClientOptions::default().with_namespace_id("prod"))
            .unwrap();
        assert_eq!(remote.namespace(), "prod");

        let key = RemoteKey::new("app", "g");
        client.publish(&key, "x").unwrap();
        assert_eq!(remote.fetch(&key).unwrap(), "x");
    }
}
