//! Configuration schema definitions.
//!
//! These structs map to the YAML configuration files. Every field has a
//! default, so an empty file (or no file at all) is a complete config.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::deps::DependencySpec;
use crate::error::Result;
use crate::runtime::{RuntimeDescriptor, Version};
use crate::schedule::{Recurrence, ScheduledTriggerDescriptor, SchedulerKind};
use crate::shell::{absolutize, default_python};

/// Root configuration structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupConfig {
    /// Interpreter selection and version gate
    pub runtime: RuntimeConfig,

    /// Packages the tracker imports
    pub dependencies: Vec<String>,

    /// The scheduled job
    pub trigger: TriggerConfig,

    /// Scheduler backend
    pub scheduler: SchedulerKind,
}

/// Interpreter settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Executable name looked up on PATH, or an explicit path
    pub executable: String,

    /// Oldest acceptable version
    pub minimum_version: Version,

    /// Extra `pip install` arguments, placed before the package names
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub install_args: Vec<String>,
}

/// Scheduled trigger settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Stable key in the scheduler
    pub name: String,

    /// Tracking script, relative to the project root unless absolute
    pub entry_point: PathBuf,

    /// Directory the job runs in (project root when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,

    /// When the job fires
    pub schedule: Recurrence,

    /// Register the trigger disabled when false
    pub enabled: bool,

    /// Append job output here
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

/// Default trigger name.
pub const DEFAULT_TRIGGER_NAME: &str = "hk-stock-tracker";

/// Default tracking script.
pub const DEFAULT_ENTRY_POINT: &str = "auto_stock_tracker.py";

/// Libraries the tracking script imports.
pub const DEFAULT_DEPENDENCIES: &[&str] = &["yfinance", "pandas", "matplotlib"];

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            runtime: RuntimeConfig::default(),
            dependencies: DEFAULT_DEPENDENCIES.iter().map(|s| s.to_string()).collect(),
            trigger: TriggerConfig::default(),
            scheduler: SchedulerKind::Auto,
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            executable: default_python().to_string(),
            minimum_version: Version::new(3, 8, 0),
            install_args: Vec::new(),
        }
    }
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_TRIGGER_NAME.to_string(),
            entry_point: PathBuf::from(DEFAULT_ENTRY_POINT),
            working_dir: None,
            schedule: Recurrence::default(),
            enabled: true,
            log_file: None,
        }
    }
}

/// Values from CLI flags and environment variables.
///
/// Each `Some` replaces the corresponding configured value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetupOverrides {
    pub executable: Option<String>,
    pub minimum_version: Option<Version>,
    pub dependencies: Option<Vec<String>>,
    pub trigger_name: Option<String>,
    pub schedule: Option<Recurrence>,
    pub entry_point: Option<PathBuf>,
    pub working_dir: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub scheduler: Option<SchedulerKind>,
    pub disabled: bool,
}

impl SetupConfig {
    /// Apply CLI overrides on top of the file configuration.
    pub fn apply_overrides(&mut self, overrides: &SetupOverrides) {
        if let Some(exe) = &overrides.executable {
            self.runtime.executable = exe.clone();
        }
        if let Some(min) = overrides.minimum_version {
            self.runtime.minimum_version = min;
        }
        if let Some(deps) = &overrides.dependencies {
            self.dependencies = deps.clone();
        }
        if let Some(name) = &overrides.trigger_name {
            self.trigger.name = name.clone();
        }
        if let Some(schedule) = overrides.schedule {
            self.trigger.schedule = schedule;
        }
        if let Some(entry) = &overrides.entry_point {
            self.trigger.entry_point = entry.clone();
        }
        if let Some(dir) = &overrides.working_dir {
            self.trigger.working_dir = Some(dir.clone());
        }
        if let Some(log) = &overrides.log_file {
            self.trigger.log_file = Some(log.clone());
        }
        if let Some(kind) = overrides.scheduler {
            self.scheduler = kind;
        }
        if overrides.disabled {
            self.trigger.enabled = false;
        }
    }

    /// The dependency list as a validated spec.
    pub fn dependency_spec(&self) -> Result<DependencySpec> {
        DependencySpec::new(self.dependencies.iter().cloned())
    }

    /// Build the trigger for a probed runtime, resolving every path
    /// against `project_root`.
    pub fn trigger_descriptor(
        &self,
        runtime: &RuntimeDescriptor,
        project_root: &Path,
    ) -> ScheduledTriggerDescriptor {
        let working_dir = match &self.trigger.working_dir {
            Some(dir) => absolutize(dir, project_root),
            None => project_root.to_path_buf(),
        };

        ScheduledTriggerDescriptor::new(
            self.trigger.name.clone(),
            runtime.executable.clone(),
            absolutize(&self.trigger.entry_point, project_root),
            working_dir,
            self.trigger.schedule,
        )
        .with_enabled(self.trigger.enabled)
        .with_log_file(
            self.trigger
                .log_file
                .as_ref()
                .map(|log| absolutize(log, project_root)),
        )
    }
}
