//! Status command implementation.
//!
//! The `tracker-setup status` command asks the scheduler whether the
//! configured trigger is installed and when it fires next.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::cli::args::StatusArgs;
use crate::config::{SetupConfig, SetupOverrides};
use crate::error::{Result, SetupError, EXIT_FAILURE};
use crate::pipeline::format_next_fire;
use crate::schedule::{create_backend, InstalledTrigger, SchedulerBackend};
use crate::shell::SystemRunner;
use crate::ui::{SetupTheme, UserInterface};

use super::dispatcher::{Command, CommandResult};
use super::resolve_config;

/// What `status --json` prints.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub installed: bool,
    pub backend: String,
    pub trigger: Option<InstalledTrigger>,
    pub next_fire: Option<DateTime<Local>>,
}

/// The status command implementation.
pub struct StatusCommand {
    project_root: PathBuf,
    config_override: Option<PathBuf>,
    args: StatusArgs,
}

impl StatusCommand {
    /// Create a new status command.
    pub fn new(project_root: &Path, config_override: Option<&Path>, args: StatusArgs) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            config_override: config_override.map(Path::to_path_buf),
            args,
        }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &StatusArgs {
        &self.args
    }

    /// Query `scheduler` for the configured trigger.
    pub fn report(
        &self,
        config: &SetupConfig,
        scheduler: &dyn SchedulerBackend,
        now: DateTime<Local>,
    ) -> Result<StatusReport> {
        let name = &config.trigger.name;
        let trigger = scheduler
            .query(name)
            .map_err(|cause| SetupError::SchedulerFailed {
                operation: "query".to_string(),
                trigger: name.clone(),
                cause,
            })?;

        // Backends that keep only native syntax fall back to the configured rule
        let next_fire = trigger.as_ref().and_then(|t| {
            if !t.enabled {
                return None;
            }
            t.recurrence
                .unwrap_or(config.trigger.schedule)
                .next_after(&now)
        });

        Ok(StatusReport {
            installed: trigger.is_some(),
            backend: scheduler.name().to_string(),
            trigger,
            next_fire,
        })
    }

    /// Render a report and pick the exit code.
    pub fn show(
        &self,
        config: &SetupConfig,
        report: &StatusReport,
        ui: &mut dyn UserInterface,
    ) -> Result<CommandResult> {
        if self.args.json {
            let json =
                serde_json::to_string_pretty(report).map_err(|e| SetupError::Other(e.into()))?;
            ui.output(&json);
        } else {
            match &report.trigger {
                Some(trigger) => {
                    let theme = SetupTheme::detect();
                    let enabled = if trigger.enabled { "yes" } else { "no" };
                    ui.show_header(&format!("Trigger '{}' ({})", trigger.name, report.backend));
                    ui.message(&theme.format_field("Command", &trigger.command));
                    ui.message(&theme.format_field("Schedule", &trigger.schedule));
                    ui.message(&theme.format_field("Enabled", enabled));
                    ui.message(&theme.format_field(
                        "Next run",
                        &format_next_fire(report.next_fire),
                    ));
                }
                None => {
                    ui.warning(&format!(
                        "Trigger '{}' is not installed in {}",
                        config.trigger.name, report.backend
                    ));
                    ui.show_hint("Run 'tracker-setup' to install it");
                }
            }
        }

        if report.installed {
            Ok(CommandResult::success())
        } else {
            Ok(CommandResult::failure(EXIT_FAILURE))
        }
    }
}

impl Command for StatusCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let config = resolve_config(
            &self.project_root,
            self.config_override.as_deref(),
            &SetupOverrides::default(),
        )?;
        let runner = SystemRunner;
        let backend = create_backend(config.scheduler, &runner);

        let report = self.report(&config, backend.as_ref(), Local::now())?;
        self.show(&config, &report, ui)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{InMemoryScheduler, ScheduledTriggerDescriptor};
    use crate::ui::MockUI;
    use chrono::TimeZone;

    fn command(json: bool) -> StatusCommand {
        StatusCommand::new(Path::new("/srv/tracker"), None, StatusArgs { json })
    }

    fn jan15(hour: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 1, 15, hour, 0, 0).unwrap()
    }

    fn installed(enabled: bool) -> InMemoryScheduler {
        let mut scheduler = InMemoryScheduler::new();
        scheduler
            .upsert(
                &ScheduledTriggerDescriptor::new(
                    "hk-stock-tracker",
                    "/usr/bin/python3",
                    "/srv/tracker/auto_stock_tracker.py",
                    "/srv/tracker",
                    "daily@09:00".parse().unwrap(),
                )
                .with_enabled(enabled),
            )
            .unwrap();
        scheduler
    }

    #[test]
    fn installed_trigger_reports_next_fire() {
        let config = SetupConfig::default();
        let scheduler = installed(true);
        let cmd = command(false);

        let report = cmd.report(&config, &scheduler, jan15(10)).unwrap();
        assert!(report.installed);
        assert_eq!(
            report.next_fire,
            Some(jan15(9) + chrono::Duration::days(1))
        );

        let mut ui = MockUI::new();
        let result = cmd.show(&config, &report, &mut ui).unwrap();
        assert!(result.success);
        assert!(ui.has_message("daily@09:00"));
        assert!(ui
            .messages()
            .iter()
            .any(|m| m.contains("Enabled:") && m.ends_with("yes")));
    }

    #[test]
    fn disabled_trigger_never_fires() {
        let report = command(false)
            .report(&SetupConfig::default(), &installed(false), jan15(8))
            .unwrap();
        assert!(report.installed);
        assert_eq!(report.next_fire, None);
    }

    #[test]
    fn missing_trigger_exits_one() {
        let config = SetupConfig::default();
        let scheduler = InMemoryScheduler::new();
        let cmd = command(false);

        let report = cmd.report(&config, &scheduler, jan15(8)).unwrap();
        let mut ui = MockUI::new();
        let result = cmd.show(&config, &report, &mut ui).unwrap();

        assert_eq!(result.exit_code, 1);
        assert!(ui.has_warning("not installed"));
        assert!(ui.has_hint("tracker-setup"));
    }

    #[test]
    fn json_output_is_machine_readable() {
        let config = SetupConfig::default();
        let cmd = command(true);
        let report = cmd.report(&config, &installed(true), jan15(8)).unwrap();
        let mut ui = MockUI::new();
        cmd.show(&config, &report, &mut ui).unwrap();

        assert!(ui.messages().is_empty());
        let value: serde_json::Value = serde_json::from_str(&ui.outputs()[0]).unwrap();
        assert_eq!(value["installed"], true);
        assert_eq!(value["backend"], "memory");
        assert_eq!(value["trigger"]["name"], "hk-stock-tracker");
        assert_eq!(value["trigger"]["recurrence"], "daily@09:00");
    }
}
