//! Config command implementation.
//!
//! The `tracker-setup config` command shows the resolved configuration.

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::cli::args::ConfigArgs;
use crate::config::{ConfigPaths, SetupConfig, SetupOverrides};
use crate::error::{Result, SetupError};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};
use super::resolve_config;

/// The config command implementation.
pub struct ConfigCommand {
    project_root: PathBuf,
    config_override: Option<PathBuf>,
    args: ConfigArgs,
}

impl ConfigCommand {
    /// Create a new config command.
    pub fn new(project_root: &Path, config_override: Option<&Path>, args: ConfigArgs) -> Self {
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

    /// Files that contributed to the configuration, in merge order.
    fn sources(&self) -> Vec<PathBuf> {
        match &self.config_override {
            Some(path) => vec![path.clone()],
            None => ConfigPaths::discover(&self.project_root)
                .all_existing()
                .into_iter()
                .cloned()
                .collect(),
        }
    }

    fn render(&self, config: &SetupConfig) -> Result<String> {
        let text = if self.args.json {
            serde_json::to_string_pretty(config).context("serializing config as JSON")
        } else {
            serde_yaml::to_string(config).context("serializing config as YAML")
        };
        text.map_err(SetupError::Other)
    }
}

impl Command for ConfigCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let config = resolve_config(
            &self.project_root,
            self.config_override.as_deref(),
            &SetupOverrides::default(),
        )?;

        // JSON stays parseable, so sources are only listed for YAML
        if !self.args.json {
            let sources = self.sources();
            if sources.is_empty() {
                ui.message("# built-in defaults");
            }
            for path in sources {
                ui.message(&format!("# {}", path.display()));
            }
        }

        ui.output(self.render(&config)?.trim_end());
        Ok(CommandResult::success())
    }
}
