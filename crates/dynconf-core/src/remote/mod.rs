//! Remote configuration service capability
//!
//! The registry never speaks a wire protocol itself. It consumes a connected
//! `RemoteClient` (fetch / listen / publish by `dataID:group`) obtained from a
//! `RemoteConnector`, and tracks which keys are subscribed process-wide in the
//! `ledger`.
//!
//! `MemoryRemote` is an in-process implementation of both traits for tests and
//! local development.

mod traits;
mod options;
mod memory;
pub mod ledger;

pub use traits::{
    ChangeCallback, ChangeEvent, RemoteClient, RemoteConnector, RemoteError, RemoteKey,
    RemoteResult,
};
pub use options::ClientOptions;
pub use memory::MemoryRemote;
