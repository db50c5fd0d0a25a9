//! Name-keyed configuration registry
//!
//! Three independent tables back each logical name:
//! - file entries, parsed once at registration
//! - remote entries, raw strings replaced on every change notification
//! - mixed entries, parsed from a file and then updated in place by the
//!   entry's own `MixedConfig` hook on remote changes
//!
//! Lookups without a mode resolve Mixed > File > Remote > Unknown.

mod error;
mod mixed;
mod value;
mod store;

pub use error::{HookError, HookResult, RegistryError, RegistryResult};
pub use mixed::MixedConfig;
pub use value::{ConfigSource, ConfigValue};
pub use store::{Registry, DEFAULT_NAME};
