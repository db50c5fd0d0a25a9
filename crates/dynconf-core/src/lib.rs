//! dynconf core
//!
//! A configuration registry that puts local files, a remote dynamic
//! configuration service, and a "mixed" mode (file defaults overlaid with live
//! remote updates) behind one lookup API keyed by a logical name.
//!
//! ```rust,ignore
//! use dynconf_core::{ClientOptions, MemoryRemote, Registry};
//!
//! let registry = Registry::new();
//! registry.connect_remote(&MemoryRemote::new("dev"), "localhost:8848", "dev", ClientOptions::default())?;
//!
//! registry.register_file_with_name("svc", "conf/svc.yaml", &Settings::default())?;
//! registry.register_mixed_with_name("db", "conf/db.yaml", "db.yaml", "DEFAULT_GROUP", &DbConfig::default())?;
//!
//! // Mixed wins over file, file over remote
//! let (value, source) = registry.get_with_source_by_name("db");
//! ```
//!
//! The remote service is consumed through the `RemoteClient` / `RemoteConnector`
//! traits; bring an adapter for your service or use `MemoryRemote` in tests.

pub mod logging;
pub mod codec;
pub mod remote;
pub mod registry;

pub use codec::{ConfigShape, PayloadFormat};

pub use remote::{
    ChangeCallback, ChangeEvent, ClientOptions, MemoryRemote, RemoteClient, RemoteConnector,
    RemoteError, RemoteKey,
};

pub use registry::{
    ConfigSource, ConfigValue, HookError, HookResult, MixedConfig, Registry, RegistryError,
    RegistryResult, DEFAULT_NAME,
};

pub use logging::{ConsoleLogger, LogLevel, Logger, NoOpLogger, SharedLogger};
