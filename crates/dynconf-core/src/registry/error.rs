//! Registry error types

use std::path::PathBuf;

use thiserror::Error;

use crate::remote::{RemoteError, RemoteKey};

/// Errors returned synchronously by registry operations
///
/// Nothing is stored when a registration fails, whatever step it failed at.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The name already has an entry in this mode
    #[error("name had been registered: {0}")]
    AlreadyRegistered(String),

    /// The remote key is already subscribed somewhere in this process
    #[error("dataID and group had been registered: {0}")]
    DuplicateSubscription(RemoteKey),

    /// The template is not a record the payload can populate (struct or map)
    #[error("template must be a mutable record type")]
    MustBeReference,

    /// The payload parsed but populated nothing
    #[error("empty config object")]
    EmptyConfig,

    /// The payload could not be parsed into the template's shape
    #[error("failed to parse config payload: {0}")]
    Parse(String),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The remote key has no content on the server
    #[error("not exist configure on remote server: {0}")]
    NotFound(RemoteKey),

    #[error("need to dial the remote config service first")]
    DialRemoteFirst,

    #[error("remote client has been initialized")]
    AlreadyConnected,

    #[error("connect remote config server failed")]
    ConnectionFailed,

    /// Fetch or listen failed on the remote adapter
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    /// A mixed entry rejected its initial remote content
    #[error("mixed config rejected remote content: {0}")]
    Hook(#[from] HookError),
}

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Error returned by a `MixedConfig` change hook
#[derive(Error, Debug)]
pub enum HookError {
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Rejected(String),
}

impl HookError {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }
}

pub type HookResult = Result<(), HookError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_offender() {
        let err = RegistryError::AlreadyRegistered("svc".to_string());
        assert_eq!(err.to_string(), "name had been registered: svc");

        let err = RegistryError::DuplicateSubscription(RemoteKey::new("db", "prod"));
        assert!(err.to_string().ends_with("db:prod"));

        let err = RegistryError::from(RemoteError::NoServer);
        assert!(err.to_string().contains("server list is empty"));
    }

    #[test]
    fn test_hook_error_from_yaml() {
        let parse: Result<u32, _> = serde_yaml::from_str("[not, a, number]");
        let err = HookError::from(parse.unwrap_err());
        assert!(matches!(err, HookError::Yaml(_)));
        assert!(matches!(RegistryError::from(err), RegistryError::Hook(_)));
    }
}
