//! Remove command implementation.
//!
//! The `tracker-setup remove` command deletes the trigger. Removing a
//! trigger that is not there succeeds.

use std::path::{Path, PathBuf};

use crate::config::SetupOverrides;
use crate::error::{Result, SetupError};
use crate::schedule::{create_backend, SchedulerBackend};
use crate::shell::SystemRunner;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};
use super::resolve_config;

/// The remove command implementation.
pub struct RemoveCommand {
    project_root: PathBuf,
    config_override: Option<PathBuf>,
}

impl RemoveCommand {
    /// Create a new remove command.
    pub fn new(project_root: &Path, config_override: Option<&Path>) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            config_override: config_override.map(Path::to_path_buf),
        }
    }

    /// Remove `name` from `scheduler`.
    pub fn remove(
        &self,
        name: &str,
        scheduler: &mut dyn SchedulerBackend,
        ui: &mut dyn UserInterface,
    ) -> Result<CommandResult> {
        let removed = scheduler
            .remove(name)
            .map_err(|cause| SetupError::SchedulerFailed {
                operation: "remove".to_string(),
                trigger: name.to_string(),
                cause,
            })?;

        if removed {
            tracing::info!("Removed trigger '{}' from {}", name, scheduler.name());
            ui.success(&format!("Removed trigger '{}'", name));
        } else {
            ui.message(&format!("Trigger '{}' is not installed; nothing to remove", name));
        }
        Ok(CommandResult::success())
    }
}

impl Command for RemoveCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let config = resolve_config(
            &self.project_root,
            self.config_override.as_deref(),
            &SetupOverrides::default(),
        )?;
        let runner = SystemRunner;
        let mut backend = create_backend(config.scheduler, &runner);
        self.remove(&config.trigger.name, backend.as_mut(), ui)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{InMemoryScheduler, RegistrationError, ScheduledTriggerDescriptor};
    use crate::ui::MockUI;

    fn command() -> RemoveCommand {
        RemoveCommand::new(Path::new("/srv/tracker"), None)
    }

    #[test]
    fn removes_installed_trigger() {
        let mut scheduler = InMemoryScheduler::new();
        scheduler
            .upsert(&ScheduledTriggerDescriptor::new(
                "hk-stock-tracker",
                "/usr/bin/python3",
                "/srv/tracker/auto_stock_tracker.py",
                "/srv/tracker",
                "daily@09:00".parse().unwrap(),
            ))
            .unwrap();
        let mut ui = MockUI::new();

        let result = command()
            .remove("hk-stock-tracker", &mut scheduler, &mut ui)
            .unwrap();
        assert!(result.success);
        assert!(scheduler.is_empty());
        assert!(ui.has_success("Removed"));
    }

    #[test]
    fn removing_twice_is_fine() {
        let mut scheduler = InMemoryScheduler::new();
        let mut ui = MockUI::new();

        let result = command()
            .remove("hk-stock-tracker", &mut scheduler, &mut ui)
            .unwrap();
        assert!(result.success);
        assert!(ui.has_message("nothing to remove"));
    }

    #[test]
    fn scheduler_errors_propagate() {
        let mut scheduler =
            InMemoryScheduler::new().fail_with(RegistrationError::PrivilegeDenied {
                message: "not allowed to use crontab".into(),
            });
        let mut ui = MockUI::new();

        let err = command()
            .remove("hk-stock-tracker", &mut scheduler, &mut ui)
            .unwrap_err();
        assert!(matches!(err, SetupError::SchedulerFailed { .. }));
        assert_eq!(err.exit_code(), 1);
        assert!(err.hint().unwrap().contains("administrator"));
    }
}
