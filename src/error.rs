//! Error types for setup operations.
//!
//! This module defines [`SetupError`], the primary error type used throughout
//! the application, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Fatal pipeline outcomes (`EnvironmentMissing`, `TriggerRegistrationFailed`)
//!   carry their own exit codes so scripts can tell them apart
//! - A failed dependency install is not an error at all; see
//!   [`DependencyInstallWarning`](crate::deps::DependencyInstallWarning)
//! - Use `anyhow::Error` (via `SetupError::Other`) for unexpected errors
//! - All errors should provide actionable messages for users

use std::path::PathBuf;
use thiserror::Error;

use crate::runtime::MissingReason;
use crate::schedule::RegistrationError;

/// Exit code for a successful run.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for unexpected failures.
pub const EXIT_FAILURE: i32 = 1;
/// Exit code for configuration problems.
pub const EXIT_CONFIG: i32 = 2;
/// Exit code when the runtime is absent or too old.
pub const EXIT_ENVIRONMENT_MISSING: i32 = 3;
/// Exit code when the scheduled trigger could not be installed.
pub const EXIT_REGISTRATION_FAILED: i32 = 4;

/// Core error type for setup operations.
#[derive(Debug, Error)]
pub enum SetupError {
    /// The scripting runtime is missing, unusable, or older than required.
    #[error("Runtime '{runtime}' unavailable: {reason}")]
    EnvironmentMissing {
        runtime: String,
        reason: MissingReason,
    },

    /// The scheduler refused or could not store the trigger.
    #[error("Failed to register trigger '{trigger}': {cause}")]
    TriggerRegistrationFailed {
        trigger: String,
        #[source]
        cause: RegistrationError,
    },

    /// A scheduler query or removal failed.
    #[error("Failed to {operation} trigger '{trigger}': {cause}")]
    SchedulerFailed {
        operation: String,
        trigger: String,
        #[source]
        cause: RegistrationError,
    },

    /// Configuration file not found at expected location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid configuration structure or values.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// An external program could not be started.
    #[error("Failed to start '{command}': {source}")]
    CommandSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SetupError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::EnvironmentMissing { .. } => EXIT_ENVIRONMENT_MISSING,
            Self::TriggerRegistrationFailed { .. } => EXIT_REGISTRATION_FAILED,
            Self::ConfigNotFound { .. }
            | Self::ConfigParseError { .. }
            | Self::ConfigValidationError { .. } => EXIT_CONFIG,
            _ => EXIT_FAILURE,
        }
    }

    /// Remediation hint for the operator, if one applies.
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::EnvironmentMissing { reason, .. } => Some(reason.hint()),
            Self::TriggerRegistrationFailed { cause, .. } | Self::SchedulerFailed { cause, .. } => {
                Some(cause.hint())
            }
            Self::ConfigValidationError { .. } | Self::ConfigParseError { .. } => {
                Some("Fix the configuration and re-run setup".to_string())
            }
            _ => None,
        }
    }
}

/// Result type alias for setup operations.
pub type Result<T> = std::result::Result<T, SetupError>;
