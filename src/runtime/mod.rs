//! Environment prober.
//!
//! Verifies that a Python interpreter is reachable and new enough before
//! anything else in the pipeline runs.
//!
//! # Modules
//!
//! - [`probe`] - PATH lookup and version query
//! - [`version`] - Version triples and their ordering

pub mod probe;
pub mod version;

pub use probe::{
    is_executable, parse_system_path, resolve_tool_path, MissingReason, RuntimeDescriptor,
    RuntimeProber,
};
pub use version::Version;
