//! Trigger registrar and scheduler backends.
//!
//! The host scheduler is an external mutable singleton. It sits behind the
//! narrow [`SchedulerBackend`] capability so the pipeline never depends on
//! any backend's native syntax.
//!
//! # Modules
//!
//! - [`recurrence`] - Interval + anchor rules and their native renderings
//! - [`trigger`] - The descriptor a backend installs
//! - [`registrar`] - Validate, upsert, compute the next fire time
//! - [`cron`] - User crontab backend (Unix)
//! - [`schtasks`] - Task Scheduler backend (Windows)
//! - [`memory`] - In-process backend for tests and dry runs

pub mod cron;
pub mod memory;
pub mod recurrence;
pub mod registrar;
pub mod schtasks;
pub mod trigger;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shell::CommandRunner;

pub use cron::CronScheduler;
pub use memory::InMemoryScheduler;
pub use recurrence::{Interval, Recurrence};
pub use registrar::TriggerRegistrar;
pub use schtasks::SchtasksScheduler;
pub use trigger::{is_valid_trigger_name, shell_quote, ScheduledTriggerDescriptor};

/// Why the scheduler did not take a trigger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// The current user may not modify the scheduler.
    #[error("insufficient privilege: {message}")]
    PrivilegeDenied { message: String },

    /// The scheduler tool or service is missing or not responding.
    #[error("scheduler unavailable: {message}")]
    SchedulerUnavailable { message: String },

    /// The command cannot be carried by the scheduler as given.
    #[error("malformed command: {message}")]
    MalformedCommand { message: String },
}

impl RegistrationError {
    /// What the operator should do about it.
    pub fn hint(&self) -> String {
        match self {
            Self::PrivilegeDenied { .. } => {
                if cfg!(windows) {
                    "Re-run setup from an administrator prompt".to_string()
                } else {
                    "Re-run as an administrator or ask one to allow you to use crontab \
                     (see /etc/cron.allow)"
                        .to_string()
                }
            }
            Self::SchedulerUnavailable { .. } => {
                "Check that the system scheduler is installed and running".to_string()
            }
            Self::MalformedCommand { .. } => {
                "Check trigger.entry_point, trigger.working_dir and trigger.log_file".to_string()
            }
        }
    }
}

/// Outcome of a successful registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationResult {
    pub trigger_name: String,
    /// `None` when the trigger was registered disabled.
    pub next_fire: Option<DateTime<Local>>,
    /// Backend that stored the trigger.
    pub backend: String,
}

/// A trigger as the scheduler reports it back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledTrigger {
    pub name: String,
    pub command: String,
    /// Schedule in the backend's own syntax.
    pub schedule: String,
    /// Portable rule, when the backend kept it.
    pub recurrence: Option<Recurrence>,
    pub enabled: bool,
}

/// Narrow capability over a host scheduler.
///
/// `upsert` must be create-or-replace in one step: afterwards exactly one
/// trigger carries the name, with every field from the new descriptor.
pub trait SchedulerBackend {
    /// Short backend name for messages.
    fn name(&self) -> &'static str;

    /// Create or replace the trigger with the descriptor's name.
    fn upsert(&mut self, trigger: &ScheduledTriggerDescriptor) -> Result<(), RegistrationError>;

    /// Look up a trigger by name.
    fn query(&self, name: &str) -> Result<Option<InstalledTrigger>, RegistrationError>;

    /// Delete a trigger. Returns whether anything was removed.
    fn remove(&mut self, name: &str) -> Result<bool, RegistrationError>;
}

/// Which backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerKind {
    /// Task Scheduler on Windows, crontab elsewhere.
    #[default]
    Auto,
    Cron,
    Schtasks,
}

impl SchedulerKind {
    /// Resolve `Auto` for the host platform.
    pub fn resolve(self) -> Self {
        match self {
            Self::Auto if cfg!(windows) => Self::Schtasks,
            Self::Auto => Self::Cron,
            other => other,
        }
    }
}

impl fmt::Display for SchedulerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Cron => write!(f, "cron"),
            Self::Schtasks => write!(f, "schtasks"),
        }
    }
}

impl FromStr for SchedulerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "cron" | "crontab" => Ok(Self::Cron),
            "schtasks" => Ok(Self::Schtasks),
            other => Err(format!(
                "unknown scheduler '{}' (expected auto, cron or schtasks)",
                other
            )),
        }
    }
}

/// Build the host backend for `kind`.
pub fn create_backend<'a>(
    kind: SchedulerKind,
    runner: &'a dyn CommandRunner,
) -> Box<dyn SchedulerBackend + 'a> {
    match kind.resolve() {
        SchedulerKind::Schtasks => Box::new(SchtasksScheduler::new(runner)),
        _ => Box::new(CronScheduler::new(runner)),
    }
}
