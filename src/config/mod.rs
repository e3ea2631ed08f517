//! Configuration loading, parsing, and validation.
//!
//! - Schema definitions in [`schema`]
//! - File discovery and loading in [`loader`]
//! - Deep merging in [`merger`]
//! - Validation in [`validator`]
//!
//! # Example
//!
//! ```
//! use tracker_setup::config::{load_config, validate};
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! let custom = temp.path().join("custom.yml");
//! fs::write(&custom, "trigger:\n  schedule: daily@18:00\n").unwrap();
//!
//! let config = load_config(temp.path(), Some(&custom)).unwrap();
//! validate(&config).unwrap();
//! assert_eq!(config.trigger.name, "hk-stock-tracker");
//! ```
//!
//! # Configuration File Locations
//!
//! Discovered and merged in this order:
//! 1. User global config (`<config dir>/tracker-setup/config.yml`)
//! 2. Project config (`tracker-setup.yml`)
//! 3. Local overrides (`tracker-setup.local.yml`)

pub mod loader;
pub mod merger;
pub mod schema;
pub mod validator;

pub use schema::{
    RuntimeConfig, SetupConfig, SetupOverrides, TriggerConfig, DEFAULT_DEPENDENCIES,
    DEFAULT_ENTRY_POINT, DEFAULT_TRIGGER_NAME,
};

pub use loader::{
    load_config, load_config_file, load_config_value, load_merged_config, parse_config,
    user_config_dir, ConfigPaths, LOCAL_CONFIG, PROJECT_CONFIG,
};

pub use merger::{deep_merge, merge_configs};

pub use validator::{validate, validate_config, ValidationError};
