//! Configuration validation rules.
//!
//! Checks run after merging and overrides, before any stage starts:
//! - The trigger name is usable as a scheduler key
//! - The runtime executable and entry point are set
//! - Dependency names are well formed and unique

use std::collections::HashSet;

use crate::config::schema::SetupConfig;
use crate::deps::normalize_name;
use crate::error::{Result, SetupError};
use crate::schedule::is_valid_trigger_name;

/// Validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Rule identifier
    pub rule: String,
    /// Human-readable error message
    pub message: String,
}

impl ValidationError {
    fn new(rule: &str, message: impl Into<String>) -> Self {
        Self {
            rule: rule.to_string(),
            message: message.into(),
        }
    }
}

/// Validate a configuration and return all errors.
///
/// Every rule runs, so one failed setup reports every problem at once.
pub fn validate_config(config: &SetupConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    errors.extend(validate_trigger(config));
    errors.extend(validate_runtime(config));
    errors.extend(validate_dependencies(config));

    errors
}

fn validate_trigger(config: &SetupConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let trigger = &config.trigger;

    if !is_valid_trigger_name(&trigger.name) {
        errors.push(ValidationError::new(
            "trigger-name",
            format!(
                "Trigger name '{}' must be non-empty and use only letters, digits, '.', '_' or '-'",
                trigger.name
            ),
        ));
    }

    if trigger.entry_point.as_os_str().is_empty() {
        errors.push(ValidationError::new(
            "entry-point",
            "Trigger entry point must not be empty",
        ));
    }

    errors
}

fn validate_runtime(config: &SetupConfig) -> Vec<ValidationError> {
    if config.runtime.executable.trim().is_empty() {
        vec![ValidationError::new(
            "runtime-executable",
            "Runtime executable must not be empty",
        )]
    } else {
        Vec::new()
    }
}

fn validate_dependencies(config: &SetupConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for name in &config.dependencies {
        if name.trim().is_empty() {
            errors.push(ValidationError::new(
                "dependency-name",
                "Dependency names must not be empty",
            ));
            continue;
        }
        if name.chars().any(char::is_whitespace) {
            errors.push(ValidationError::new(
                "dependency-name",
                format!("Dependency '{}' contains whitespace", name),
            ));
            continue;
        }
        if !seen.insert(normalize_name(name)) {
            errors.push(ValidationError::new(
                "duplicate-dependency",
                format!("Dependency '{}' is listed more than once", name),
            ));
        }
    }

    errors
}

/// Validate and return Result (for convenience).
///
/// # Errors
///
/// Returns `ConfigValidationError` if any validation rules fail.
pub fn validate(config: &SetupConfig) -> Result<()> {
    let errors = validate_config(config);

    if errors.is_empty() {
        Ok(())
    } else {
        let messages: Vec<_> = errors.iter().map(|e| e.message.clone()).collect();
        Err(SetupError::ConfigValidationError {
            message: messages.join("; "),
        })
    }
}
