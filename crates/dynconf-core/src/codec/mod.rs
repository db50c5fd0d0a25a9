//! Payload deserialization into caller-defined configuration shapes
//!
//! The registry is generic over the caller's types; this module turns a raw
//! file payload into a fresh, independently owned instance of the template's
//! type and rejects payloads that populate nothing.

mod cloner;

pub use cloner::{check_template, clone_and_parse, ConfigShape, PayloadFormat};
