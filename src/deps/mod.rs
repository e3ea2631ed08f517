//! Dependency installer.
//!
//! Provisions the Python libraries the tracking job imports.

pub mod installer;

pub use installer::{
    normalize_name, DependencyInstallWarning, DependencyInstaller, DependencySpec, InstallReport,
    PIP_QUIET_FLAGS,
};
