//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! # Architecture
//!
//! Commands are dispatched via [`CommandDispatcher`], which routes CLI
//! subcommands to their implementations. Commands that touch the host
//! (spawn processes, edit the scheduler) expose a second entry point that
//! takes those capabilities as arguments, so tests can pass fakes.

pub mod completions;
pub mod config;
pub mod dispatcher;
pub mod remove;
pub mod setup;
pub mod status;

use std::path::Path;

use crate::config::{load_config, validate, SetupConfig, SetupOverrides};
use crate::error::Result;

pub use dispatcher::{Command, CommandDispatcher, CommandResult};

/// Load, override and validate the configuration for `project_root`.
pub(crate) fn resolve_config(
    project_root: &Path,
    config_override: Option<&Path>,
    overrides: &SetupOverrides,
) -> Result<SetupConfig> {
    let mut config = load_config(project_root, config_override)?;
    config.apply_overrides(overrides);
    validate(&config)?;
    Ok(config)
}
