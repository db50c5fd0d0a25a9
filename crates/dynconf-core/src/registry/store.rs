//! The configuration registry
//!
//! Registration runs on the caller's thread and may block on file I/O and a
//! remote round-trip. Change notifications arrive on the remote adapter's
//! delivery thread and are applied under lock. Readers only ever touch memory.
//!
//! Locking:
//! - `tables` guards the three name maps and every mixed entry. Mixed fan-out
//!   holds the write lock for the whole event.
//! - each remote entry keeps its content in a `watch` channel, which is its own
//!   lock; remote updates only need the `tables` read lock to find the entry.
//! - `mixed_keys` serializes installation of the shared mixed listener.
//! - `remote_registration` serializes remote registrations, so a name seen
//!   vacant stays vacant until the entry lands.

use std::any::Any;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Weak};

use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;

use super::error::{RegistryError, RegistryResult};
use super::mixed::{MixedConfig, MixedSlot, Slot};
use super::value::{ConfigSource, ConfigValue};
use crate::codec::{check_template, clone_and_parse, ConfigShape, PayloadFormat};
use crate::logging::{trace, LogLevel, NoOpLogger, SharedLogger};
use crate::remote::{
    ledger, ChangeEvent, ClientOptions, RemoteClient, RemoteConnector, RemoteError, RemoteKey,
};
use crate::{log_debug, log_error, log_info, log_warn};

/// Name used by every operation that does not take one
pub const DEFAULT_NAME: &str = "default";

// The SDK has no ping; publishing a throwaway document is the liveness probe
const PROBE_DATA_ID: &str = "echo";
const PROBE_GROUP: &str = "echo";
const PROBE_CONTENT: &str = "ping";

struct Connection {
    client: Arc<dyn RemoteClient>,
    namespace: String,
}

struct RemoteEntry {
    key: RemoteKey,
    content: watch::Sender<String>,
}

#[derive(Default)]
struct Tables {
    files: HashMap<String, Arc<dyn Any + Send + Sync>>,
    remotes: HashMap<String, RemoteEntry>,
    mixed: HashMap<String, Box<dyn MixedSlot>>,
}

struct Inner {
    connection: OnceCell<Connection>,
    tables: RwLock<Tables>,
    mixed_keys: Mutex<HashSet<RemoteKey>>,
    remote_registration: Mutex<()>,
    logger: SharedLogger,
}

/// Configuration registry over file, remote and mixed sources
///
/// Cloning is cheap; clones share all state.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
///
/// use dynconf_core::{ConfigSource, ConsoleLogger, Registry};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
/// #[serde(default)]
/// struct Settings {
///     port: u16,
///     log_level: String,
/// }
///
/// let registry = Registry::with_logger(Arc::new(ConsoleLogger::new()));
/// registry.register_file_with_name("svc", "demo.yaml", &Settings::default())?;
///
/// let settings = registry.get_file_by_name::<Settings>("svc").unwrap();
/// assert_eq!(settings.port, 8080);
///
/// let (_, source) = registry.get_with_source_by_name("svc");
/// assert_eq!(source, ConfigSource::OnlyFile);
/// # Ok::<(), dynconf_core::RegistryError>(())
/// ```
#[derive(Clone)]
pub struct Registry {
    inner: Arc<Inner>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create an empty registry that logs nowhere
    pub fn new() -> Self {
        Self::with_logger(Arc::new(NoOpLogger::new()))
    }

    /// Create an empty registry reporting through `logger`
    pub fn with_logger(logger: SharedLogger) -> Self {
        Self {
            inner: Arc::new(Inner {
                connection: OnceCell::new(),
                tables: RwLock::new(Tables::default()),
                mixed_keys: Mutex::new(HashSet::new()),
                remote_registration: Mutex::new(()),
                logger,
            }),
        }
    }

    // ==================== CONNECTION ====================

    /// Connect to the remote config service
    ///
    /// Probes the server by publishing a throwaway document. An unreachable
    /// server fails with `ConnectionFailed`; other probe errors are logged and
    /// the connection is kept. A registry connects at most once.
    pub fn connect_remote(
        &self,
        connector: &dyn RemoteConnector,
        address: &str,
        namespace: &str,
        options: ClientOptions,
    ) -> RegistryResult<()> {
        if self.inner.connection.get().is_some() {
            return Err(RegistryError::AlreadyConnected);
        }

        let options = options.with_endpoint(address).with_namespace_id(namespace);
        let client = connector.connect(&options).map_err(|e| match e {
            RemoteError::NoServer => RegistryError::ConnectionFailed,
            other => RegistryError::Remote(other),
        })?;

        match client.publish(&RemoteKey::new(PROBE_DATA_ID, PROBE_GROUP), PROBE_CONTENT) {
            Ok(()) => {}
            Err(RemoteError::NoServer) => {
                log_error!(self.inner.logger, "remote config server unreachable ({})", options);
                return Err(RegistryError::ConnectionFailed);
            }
            Err(e) => {
                log_warn!(self.inner.logger, "liveness probe failed, keeping connection: {}", e);
            }
        }

        self.inner
            .connection
            .set(Connection {
                client,
                namespace: namespace.to_string(),
            })
            .map_err(|_| RegistryError::AlreadyConnected)?;

        log_info!(self.inner.logger, "connected to remote config service ({})", options);
        Ok(())
    }

    /// Whether `connect_remote` has succeeded
    pub fn is_connected(&self) -> bool {
        self.inner.connection.get().is_some()
    }

    /// Namespace of the remote connection, if any
    pub fn namespace(&self) -> Option<&str> {
        self.inner.connection.get().map(|c| c.namespace.as_str())
    }

    fn connection(&self) -> RegistryResult<&Connection> {
        self.inner
            .connection
            .get()
            .ok_or(RegistryError::DialRemoteFirst)
    }

    // ==================== REGISTRATION ====================

    /// Register a file under the default name
    pub fn register_file<T: ConfigShape>(
        &self,
        path: impl AsRef<Path>,
        template: &T,
    ) -> RegistryResult<()> {
        self.register_file_with_name(DEFAULT_NAME, path, template)
    }

    /// Parse `path` into a fresh instance of `T` and store it under `name`
    ///
    /// `.json` files are parsed as JSON, anything else as YAML.
    pub fn register_file_with_name<T: ConfigShape>(
        &self,
        name: &str,
        path: impl AsRef<Path>,
        template: &T,
    ) -> RegistryResult<()> {
        check_template(template)?;
        if self.inner.tables.read().files.contains_key(name) {
            return Err(RegistryError::AlreadyRegistered(name.to_string()));
        }

        let path = path.as_ref();
        let conf = load_file(path, template)?;

        match self.inner.tables.write().files.entry(name.to_string()) {
            Entry::Occupied(_) => return Err(RegistryError::AlreadyRegistered(name.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(conf));
            }
        }

        log_info!(self.inner.logger, "registered file config {} from {}", name, path.display());
        Ok(())
    }

    /// Subscribe to a remote key under the default name
    pub fn register_remote(&self, data_id: &str, group: &str) -> RegistryResult<()> {
        self.register_remote_with_name(DEFAULT_NAME, data_id, group)
    }

    /// Fetch a remote key, keep its raw content under `name` and follow changes
    ///
    /// A key can be subscribed only once per process. The key is claimed
    /// before anything reaches the remote service and given back if any later
    /// step fails, so a losing registration never installs a listener.
    pub fn register_remote_with_name(
        &self,
        name: &str,
        data_id: &str,
        group: &str,
    ) -> RegistryResult<()> {
        let key = RemoteKey::new(data_id, group);
        let _serial = self.inner.remote_registration.lock();

        let claim = match ledger::claim(&key) {
            Some(claim) => claim,
            None => return Err(RegistryError::DuplicateSubscription(key)),
        };
        if self.inner.tables.read().remotes.contains_key(name) {
            return Err(RegistryError::AlreadyRegistered(name.to_string()));
        }

        let conn = self.connection()?;
        let content = conn.client.fetch(&key)?;
        if content.is_empty() {
            return Err(RegistryError::NotFound(key));
        }

        let inner = Arc::downgrade(&self.inner);
        let namespace = conn.namespace.clone();
        let listen_key = key.clone();
        conn.client.listen(
            &key,
            Arc::new(move |event: &ChangeEvent| {
                if event.namespace != namespace {
                    return;
                }
                if let Some(inner) = inner.upgrade() {
                    inner.apply_remote_change(&listen_key, event);
                }
            }),
        )?;

        let (content, _) = watch::channel(content);
        self.inner.tables.write().remotes.insert(
            name.to_string(),
            RemoteEntry {
                key: key.clone(),
                content,
            },
        );
        claim.keep();

        log_info!(self.inner.logger, "registered remote config {} on {}", name, key);
        Ok(())
    }

    /// Register a mixed config under the default name
    pub fn register_mixed<T: MixedConfig>(
        &self,
        path: impl AsRef<Path>,
        data_id: &str,
        group: &str,
        template: &T,
    ) -> RegistryResult<()> {
        self.register_mixed_with_name(DEFAULT_NAME, path, data_id, group, template)
    }

    /// Seed a `T` from `path`, merge the remote key into it and follow changes
    ///
    /// Steps: parse the file, fetch the key and feed it to
    /// `on_remote_changed`, make sure the shared dispatcher listens on the key,
    /// run `update_after_register`, then publish the entry under `name`.
    pub fn register_mixed_with_name<T: MixedConfig>(
        &self,
        name: &str,
        path: impl AsRef<Path>,
        data_id: &str,
        group: &str,
        template: &T,
    ) -> RegistryResult<()> {
        check_template(template)?;
        if self.inner.tables.read().mixed.contains_key(name) {
            return Err(RegistryError::AlreadyRegistered(name.to_string()));
        }

        let path = path.as_ref();
        let mut conf = load_file(path, template)?;

        let conn = self.connection()?;
        let key = RemoteKey::new(data_id, group);
        let content = conn.client.fetch(&key)?;
        conf.on_remote_changed(&ChangeEvent::new(conn.namespace.as_str(), &key, content))?;

        self.listen_mixed(conn, &key)?;
        conf.update_after_register();

        match self.inner.tables.write().mixed.entry(name.to_string()) {
            Entry::Occupied(_) => return Err(RegistryError::AlreadyRegistered(name.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(Box::new(Slot(conf)));
            }
        }

        log_info!(
            self.inner.logger,
            "registered mixed config {} from {} on {}",
            name,
            path.display(),
            key
        );
        Ok(())
    }

    /// Install the shared mixed dispatcher on `key` unless already listening
    fn listen_mixed(&self, conn: &Connection, key: &RemoteKey) -> RegistryResult<()> {
        let mut keys = self.inner.mixed_keys.lock();
        if keys.contains(key) {
            return Ok(());
        }

        let inner: Weak<Inner> = Arc::downgrade(&self.inner);
        conn.client.listen(
            key,
            Arc::new(move |event: &ChangeEvent| {
                if let Some(inner) = inner.upgrade() {
                    inner.dispatch_mixed(event);
                }
            }),
        )?;

        keys.insert(key.clone());
        log_debug!(self.inner.logger, "mixed dispatcher listening on {}", key);
        Ok(())
    }

    // ==================== RESOLUTION ====================

    /// Resolve the default name
    pub fn get(&self) -> Option<ConfigValue> {
        self.get_by_name(DEFAULT_NAME)
    }

    /// Resolve `name` with Mixed > File > Remote precedence
    pub fn get_by_name(&self, name: &str) -> Option<ConfigValue> {
        self.get_with_source_by_name(name).0
    }

    pub fn get_with_source(&self) -> (Option<ConfigValue>, ConfigSource) {
        self.get_with_source_by_name(DEFAULT_NAME)
    }

    /// Resolve `name` and report which table answered
    pub fn get_with_source_by_name(&self, name: &str) -> (Option<ConfigValue>, ConfigSource) {
        let tables = self.inner.tables.read();

        if let Some(slot) = tables.mixed.get(name) {
            return (Some(ConfigValue::Mixed(slot.snapshot())), ConfigSource::Mixed);
        }
        if let Some(conf) = tables.files.get(name) {
            return (Some(ConfigValue::File(conf.clone())), ConfigSource::OnlyFile);
        }
        if let Some(entry) = tables.remotes.get(name) {
            let content = entry.content.borrow().clone();
            return (Some(ConfigValue::Remote(content)), ConfigSource::OnlyRemote);
        }

        (None, ConfigSource::Unknown)
    }

    pub fn get_file<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.get_file_by_name(DEFAULT_NAME)
    }

    /// Shared copy of a file config; `None` if absent or not a `T`
    pub fn get_file_by_name<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        let conf = self.inner.tables.read().files.get(name)?.clone();
        conf.downcast::<T>().ok()
    }

    pub fn get_remote(&self) -> Option<String> {
        self.get_remote_by_name(DEFAULT_NAME)
    }

    /// Current raw content of a remote config
    pub fn get_remote_by_name(&self, name: &str) -> Option<String> {
        let tables = self.inner.tables.read();
        let entry = tables.remotes.get(name)?;
        let content = entry.content.borrow().clone();
        Some(content)
    }

    pub fn get_mixed<T: MixedConfig>(&self) -> Option<T> {
        self.get_mixed_by_name(DEFAULT_NAME)
    }

    /// Snapshot of a mixed config taken under the read lock
    pub fn get_mixed_by_name<T: MixedConfig>(&self, name: &str) -> Option<T> {
        let tables = self.inner.tables.read();
        tables.mixed.get(name)?.as_any().downcast_ref::<T>().cloned()
    }

    /// Receiver that observes every content change of a remote config
    pub fn watch_remote_by_name(&self, name: &str) -> Option<watch::Receiver<String>> {
        let tables = self.inner.tables.read();
        tables.remotes.get(name).map(|entry| entry.content.subscribe())
    }
}

impl Inner {
    /// Replace the content of the remote entry subscribed to `key`
    fn apply_remote_change(&self, key: &RemoteKey, event: &ChangeEvent) {
        let tables = self.tables.read();
        // Keys are unique process-wide, so at most one entry matches
        if let Some((name, entry)) = tables.remotes.iter().find(|(_, e)| &e.key == key) {
            entry.content.send_replace(event.content.clone());
            if trace::enabled(LogLevel::Trace) {
                trace::trace("registry", &format!("remote config {} updated from {}", name, key));
            }
        }
    }

    /// Offer `event` to every mixed entry
    fn dispatch_mixed(&self, event: &ChangeEvent) {
        let mut tables = self.tables.write();
        if trace::enabled(LogLevel::Trace) {
            trace::trace(
                "registry",
                &format!(
                    "dispatching {}:{} to {} mixed entries",
                    event.data_id,
                    event.group,
                    tables.mixed.len()
                ),
            );
        }

        for (name, slot) in tables.mixed.iter_mut() {
            if let Err(e) = slot.apply(event) {
                log_warn!(
                    self.logger,
                    "mixed config {} rejected change of {}:{}: {}",
                    name,
                    event.data_id,
                    event.group,
                    e
                );
            }
        }
    }
}

fn load_file<T: ConfigShape>(path: &Path, template: &T) -> RegistryResult<T> {
    let payload = fs::read(path).map_err(|source| RegistryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    clone_and_parse(&payload, PayloadFormat::from_path(path), template)
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tables = self.inner.tables.read();
        f.debug_struct("Registry")
            .field("namespace", &self.namespace())
            .field("files", &tables.files.len())
            .field("remotes", &tables.remotes.len())
            .field("mixed", &tables.mixed.len())
            .finish()
    }
}
