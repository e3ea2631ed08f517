//! The three-stage setup pipeline.
//!
//! ```text
//! probe runtime ──> install dependencies ──> register trigger
//!      │ fatal            │ warning                │ fatal
//! ```
//!
//! Stages run strictly in order and hand typed results forward. A missing
//! runtime stops everything before any install or scheduler call. A failed
//! install is reported and the pipeline carries on, since the trigger is
//! still worth registering and a later run may succeed once the network or
//! index recovers.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

use crate::config::SetupConfig;
use crate::deps::{DependencyInstaller, InstallReport};
use crate::error::Result;
use crate::runtime::{RuntimeDescriptor, RuntimeProber};
use crate::schedule::{
    RegistrationResult, ScheduledTriggerDescriptor, SchedulerBackend, TriggerRegistrar,
};
use crate::shell::CommandRunner;
use crate::ui::UserInterface;

/// Options for one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct SetupOptions {
    /// Probe only; report what would be installed and registered.
    pub dry_run: bool,
    /// Directories searched for the runtime instead of the host PATH.
    pub search_path: Option<Vec<PathBuf>>,
}

/// Result of a pipeline run.
#[derive(Debug)]
pub struct SetupReport {
    /// The interpreter the trigger runs under.
    pub runtime: RuntimeDescriptor,
    /// Installer outcome. `None` on a dry run.
    pub install: Option<InstallReport>,
    /// The trigger as handed to the scheduler.
    pub trigger: ScheduledTriggerDescriptor,
    pub registration: RegistrationResult,
    pub dry_run: bool,
    pub duration: Duration,
}

impl SetupReport {
    /// Whether the install stage ended with a warning.
    pub fn has_warnings(&self) -> bool {
        self.install
            .as_ref()
            .is_some_and(|report| report.warning().is_some())
    }
}

/// Orchestrates probe, install and registration.
pub struct SetupPipeline<'a> {
    config: &'a SetupConfig,
    runner: &'a dyn CommandRunner,
    project_root: PathBuf,
}

impl<'a> SetupPipeline<'a> {
    /// Create a pipeline for `project_root`, spawning through `runner`.
    pub fn new(config: &'a SetupConfig, runner: &'a dyn CommandRunner, project_root: &Path) -> Self {
        Self {
            config,
            runner,
            project_root: project_root.to_path_buf(),
        }
    }

    /// Run every stage once.
    ///
    /// `now` is the instant the next fire time is computed from.
    pub fn run(
        &self,
        scheduler: &mut dyn SchedulerBackend,
        ui: &mut dyn UserInterface,
        now: DateTime<Local>,
        options: &SetupOptions,
    ) -> Result<SetupReport> {
        let start = Instant::now();
        let deps = self.config.dependency_spec()?;

        let runtime = self.probe(ui, options)?;

        let install = {
            let installer = DependencyInstaller::new(self.runner)
                .with_extra_args(self.config.runtime.install_args.clone());
            let mut spinner = ui.start_spinner("Installing dependencies");

            if deps.is_empty() {
                spinner.finish_skipped("No dependencies configured");
                None
            } else if options.dry_run {
                spinner.finish_skipped(&format!(
                    "Would run: {}",
                    installer.command(&deps, &runtime).display()
                ));
                None
            } else {
                if ui.output_mode().shows_commands() {
                    spinner.set_message(&format!(
                        "$ {}",
                        installer.command(&deps, &runtime).display()
                    ));
                }
                let report = installer.ensure(&deps, &runtime);
                match report.warning() {
                    Some(warning) => spinner.finish_warning(&format!(
                        "{} (continuing; re-run setup to retry)",
                        warning
                    )),
                    None => spinner.finish_success(&format!(
                        "Installed {}",
                        deps.packages().join(", ")
                    )),
                }
                Some(report)
            }
        };

        let trigger = self
            .config
            .trigger_descriptor(&runtime, &self.project_root);
        let mut spinner = ui.start_spinner(&format!("Registering trigger '{}'", trigger.name));
        let mut registrar = TriggerRegistrar::new(scheduler);
        let outcome = if options.dry_run {
            registrar.preview(&trigger, now)
        } else {
            registrar.register(&trigger, now)
        };

        let registration = match outcome {
            Ok(result) => {
                let verb = if options.dry_run {
                    "Would register"
                } else {
                    "Registered"
                };
                spinner.finish_success(&format!(
                    "{} '{}' with {} ({}), next run {}",
                    verb,
                    result.trigger_name,
                    result.backend,
                    trigger.recurrence.describe(),
                    format_next_fire(result.next_fire)
                ));
                result
            }
            Err(e) => {
                spinner.finish_error(&format!("Could not register '{}'", trigger.name));
                return Err(e);
            }
        };

        Ok(SetupReport {
            runtime,
            install,
            trigger,
            registration,
            dry_run: options.dry_run,
            duration: start.elapsed(),
        })
    }

    fn probe(
        &self,
        ui: &mut dyn UserInterface,
        options: &SetupOptions,
    ) -> Result<RuntimeDescriptor> {
        let runtime = &self.config.runtime;
        let mut spinner = ui.start_spinner(&format!(
            "Checking for {} >= {}",
            runtime.executable, runtime.minimum_version
        ));

        let mut prober = RuntimeProber::new(self.runner, &runtime.executable, runtime.minimum_version)
            .with_base_dir(&self.project_root);
        if let Some(path) = &options.search_path {
            prober = prober.with_search_path(path.clone());
        }

        match prober.probe() {
            Ok(found) => {
                spinner.finish_success(&format!(
                    "Python {} at {}",
                    found.version,
                    found.executable.display()
                ));
                Ok(found)
            }
            Err(e) => {
                spinner.finish_error(&format!("{} is not usable", runtime.executable));
                Err(e)
            }
        }
    }
}

/// Human-readable next fire time.
pub fn format_next_fire(next: Option<DateTime<Local>>) -> String {
    match next {
        Some(at) => at.format("%Y-%m-%d %H:%M %Z").to_string(),
        None => "never (disabled)".to_string(),
    }
}
