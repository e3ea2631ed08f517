//! Setup command implementation.
//!
//! The `tracker-setup setup` command (and the bare `tracker-setup`
//! invocation) runs the full pipeline against the host.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::cli::args::SetupArgs;
use crate::config::SetupConfig;
use crate::error::Result;
use crate::pipeline::{SetupOptions, SetupPipeline};
use crate::schedule::{create_backend, SchedulerBackend};
use crate::shell::{is_elevated, CommandRunner, SystemRunner};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};
use super::resolve_config;

/// The setup command implementation.
pub struct SetupCommand {
    project_root: PathBuf,
    config_override: Option<PathBuf>,
    args: SetupArgs,
}

impl SetupCommand {
    /// Create a new setup command.
    pub fn new(project_root: &Path, config_override: Option<&Path>, args: SetupArgs) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            config_override: config_override.map(Path::to_path_buf),
            args,
        }
    }

    /// Get the project root path.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Resolved configuration with this command's flags applied.
    pub fn config(&self) -> Result<SetupConfig> {
        resolve_config(
            &self.project_root,
            self.config_override.as_deref(),
            &self.args.overrides(),
        )
    }

    /// Run the pipeline with explicit host capabilities.
    pub fn run(
        &self,
        config: &SetupConfig,
        ui: &mut dyn UserInterface,
        runner: &dyn CommandRunner,
        scheduler: &mut dyn SchedulerBackend,
        now: DateTime<Local>,
        search_path: Option<Vec<PathBuf>>,
    ) -> Result<CommandResult> {
        ui.show_header(&format!(
            "Setting up '{}' in {}",
            config.trigger.name,
            self.project_root.display()
        ));

        let options = SetupOptions {
            dry_run: self.args.dry_run,
            search_path,
        };
        let report =
            SetupPipeline::new(config, runner, &self.project_root).run(scheduler, ui, now, &options)?;

        if report.dry_run {
            ui.message("Dry run: nothing was installed or registered");
        } else if report.has_warnings() {
            ui.warning("Setup finished with warnings; the tracker may fail until dependencies install");
            ui.show_hint("Check your network connection and re-run setup");
        } else {
            ui.success(&format!(
                "Setup complete in {:.1}s",
                report.duration.as_secs_f64()
            ));
        }

        Ok(CommandResult::success())
    }
}

impl Command for SetupCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let config = self.config()?;
        let runner = SystemRunner;
        let mut backend = create_backend(config.scheduler, &runner);
        tracing::debug!("Using {} scheduler", backend.name());

        if is_elevated() && backend.name() == "cron" {
            ui.warning("Running as root: the trigger goes into root's crontab");
        }

        self.run(&config, ui, &runner, backend.as_mut(), Local::now(), None)
    }
}
