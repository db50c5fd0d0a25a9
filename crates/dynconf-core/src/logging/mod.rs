//! Logging
//!
//! Two paths, used for different things:
//! - `Logger` trait objects are handed to a `Registry` and receive operational
//!   messages (registrations, hook failures).
//! - `trace` is a process-wide file for change delivery, enabled with
//!   `DYNCONF_DEBUG=1`.

mod traits;
mod level;
mod noop;
mod console;
pub mod trace;

pub use traits::{Logger, LoggerExt, SharedLogger};
pub use level::LogLevel;
pub use noop::NoOpLogger;
pub use console::ConsoleLogger;
