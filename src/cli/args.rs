//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::config::SetupOverrides;
use crate::runtime::Version;
use crate::schedule::{Recurrence, SchedulerKind};

/// tracker-setup - Bootstrap the HK stock tracker on this machine.
#[derive(Debug, Parser)]
#[command(name = "tracker-setup")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to config file (skips discovery of tracker-setup.yml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to project root (overrides current directory)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print nothing but errors and requested output
    #[arg(short, long, global = true)]
    pub silent: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Probe the runtime, install dependencies and register the trigger
    /// (default if no command specified)
    Setup(SetupArgs),

    /// Show whether the trigger is installed and when it fires next
    Status(StatusArgs),

    /// Remove the trigger from the scheduler
    Remove(RemoveArgs),

    /// Show resolved configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `setup` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct SetupArgs {
    /// Python executable name or path
    #[arg(long, env = "TRACKER_SETUP_PYTHON", value_name = "EXE")]
    pub python: Option<String>,

    /// Oldest acceptable Python version
    #[arg(long, env = "TRACKER_SETUP_MIN_VERSION", value_name = "VERSION")]
    pub min_version: Option<Version>,

    /// Packages to install (comma-separated)
    #[arg(long, env = "TRACKER_SETUP_DEPS", value_delimiter = ',')]
    pub deps: Option<Vec<String>>,

    /// Trigger name in the scheduler
    #[arg(long, env = "TRACKER_SETUP_NAME")]
    pub name: Option<String>,

    /// When the tracker runs (e.g. daily@09:00, 6h@00:30, weekly:mon@09:00)
    #[arg(long, env = "TRACKER_SETUP_SCHEDULE")]
    pub schedule: Option<Recurrence>,

    /// Tracking script
    #[arg(long, env = "TRACKER_SETUP_ENTRY_POINT", value_name = "FILE")]
    pub entry_point: Option<PathBuf>,

    /// Directory the tracker runs in
    #[arg(long, env = "TRACKER_SETUP_WORKING_DIR", value_name = "DIR")]
    pub working_dir: Option<PathBuf>,

    /// Append tracker output to this file
    #[arg(long, env = "TRACKER_SETUP_LOG_FILE", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Scheduler backend (auto, cron, schtasks)
    #[arg(long, env = "TRACKER_SETUP_SCHEDULER")]
    pub scheduler: Option<SchedulerKind>,

    /// Register the trigger disabled
    #[arg(long, env = "TRACKER_SETUP_DISABLED")]
    pub disabled: bool,

    /// Probe and preview without installing or registering
    #[arg(long)]
    pub dry_run: bool,
}

impl SetupArgs {
    /// Config overrides carried by these flags.
    pub fn overrides(&self) -> SetupOverrides {
        SetupOverrides {
            executable: self.python.clone(),
            minimum_version: self.min_version,
            dependencies: self.deps.clone(),
            trigger_name: self.name.clone(),
            schedule: self.schedule,
            entry_point: self.entry_point.clone(),
            working_dir: self.working_dir.clone(),
            log_file: self.log_file.clone(),
            scheduler: self.scheduler,
            disabled: self.disabled,
        }
    }
}

/// Arguments for the `status` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct StatusArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `remove` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct RemoveArgs {}

/// Arguments for the `config` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ConfigArgs {
    /// Output as JSON instead of YAML
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_is_none() {
        let cli = Cli::try_parse_from(["tracker-setup"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["tracker-setup", "status", "--verbose", "-p", "/srv"])
            .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.project, Some(PathBuf::from("/srv")));
    }

    #[test]
    fn silent_flag_parses() {
        let cli = Cli::try_parse_from(["tracker-setup", "--silent", "config", "--json"]).unwrap();
        assert!(cli.silent);
        assert!(!cli.quiet);
    }

    #[test]
    fn setup_flags_become_overrides() {
        let cli = Cli::try_parse_from([
            "tracker-setup",
            "setup",
            "--min-version",
            "3.9",
            "--deps",
            "yfinance,pandas",
            "--schedule",
            "weekly:fri@17:30",
            "--scheduler",
            "cron",
            "--disabled",
        ])
        .unwrap();

        let Some(Commands::Setup(args)) = cli.command else {
            panic!("expected setup");
        };
        let overrides = args.overrides();
        assert_eq!(overrides.minimum_version, Some(Version::new(3, 9, 0)));
        assert_eq!(
            overrides.dependencies,
            Some(vec!["yfinance".to_string(), "pandas".to_string()])
        );
        assert_eq!(
            overrides.schedule.map(|s| s.to_string()).as_deref(),
            Some("weekly:fri@17:30")
        );
        assert_eq!(overrides.scheduler, Some(SchedulerKind::Cron));
        assert!(overrides.disabled);
    }

    #[test]
    fn bad_schedule_is_rejected() {
        let result = Cli::try_parse_from(["tracker-setup", "setup", "--schedule", "sometimes"]);
        assert!(result.is_err());
    }

    #[test]
    fn completions_requires_shell() {
        assert!(Cli::try_parse_from(["tracker-setup", "completions"]).is_err());
        assert!(Cli::try_parse_from(["tracker-setup", "completions", "bash"]).is_ok());
    }
}
