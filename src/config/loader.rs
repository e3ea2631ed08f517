//! Configuration file discovery and loading.
//!
//! Files are optional. Whatever exists is merged in priority order and
//! parsed once; a project with no files runs on the built-in defaults.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::merger::merge_configs;
use crate::config::schema::SetupConfig;
use crate::error::{Result, SetupError};

/// Project config file name.
pub const PROJECT_CONFIG: &str = "tracker-setup.yml";

/// Uncommitted local override file name.
pub const LOCAL_CONFIG: &str = "tracker-setup.local.yml";

/// Paths to configuration files in merge order (later overrides earlier).
///
/// 1. User global config (`<config dir>/tracker-setup/config.yml`)
/// 2. Project config (`tracker-setup.yml`)
/// 3. Local overrides (`tracker-setup.local.yml`)
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    pub user_global: Option<PathBuf>,
    pub project: Option<PathBuf>,
    pub project_local: Option<PathBuf>,
}

impl ConfigPaths {
    /// Discover config files for the given project root.
    pub fn discover(project_root: &Path) -> Self {
        Self::discover_with_user_dir(project_root, user_config_dir().as_deref())
    }

    /// Discover with an explicit user config directory.
    pub fn discover_with_user_dir(project_root: &Path, user_dir: Option<&Path>) -> Self {
        Self {
            user_global: user_dir.and_then(|dir| existing(dir.join("config.yml"))),
            project: existing(project_root.join(PROJECT_CONFIG)),
            project_local: existing(project_root.join(LOCAL_CONFIG)),
        }
    }

    /// All existing config paths in merge order.
    pub fn all_existing(&self) -> Vec<&PathBuf> {
        [&self.user_global, &self.project, &self.project_local]
            .into_iter()
            .flatten()
            .collect()
    }
}

/// `<config dir>/tracker-setup`, if the platform has a config dir.
pub fn user_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tracker-setup"))
}

fn existing(path: PathBuf) -> Option<PathBuf> {
    path.is_file().then_some(path)
}

/// Load a config file as a raw YAML value for merging.
///
/// An empty file loads as `null`.
pub fn load_config_value(path: &Path) -> Result<serde_yaml::Value> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            SetupError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            SetupError::Io(e)
        }
    })?;

    serde_yaml::from_str(&content).map_err(|e| SetupError::ConfigParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Parse YAML content into a config, reporting errors against `source_path`.
pub fn parse_config(content: &str, source_path: &Path) -> Result<SetupConfig> {
    if content.trim().is_empty() {
        return Ok(SetupConfig::default());
    }
    serde_yaml::from_str(content).map_err(|e| SetupError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load exactly one config file.
pub fn load_config_file(path: &Path) -> Result<SetupConfig> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            SetupError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            SetupError::Io(e)
        }
    })?;
    parse_config(&content, path)
}

/// Merge every discovered file and parse the result.
pub fn load_merged_config(paths: &ConfigPaths) -> Result<SetupConfig> {
    let mut layers = Vec::new();
    for path in paths.all_existing() {
        tracing::debug!("Loading config from {}", path.display());
        let value = load_config_value(path)?;
        if !value.is_null() {
            layers.push(value);
        }
    }

    if layers.is_empty() {
        tracing::debug!("No config files found, using defaults");
        return Ok(SetupConfig::default());
    }

    let source = paths
        .all_existing()
        .last()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(PROJECT_CONFIG));
    serde_yaml::from_value(merge_configs(&layers)).map_err(|e| SetupError::ConfigParseError {
        path: source,
        message: format!("Failed to parse merged config: {}", e),
    })
}

/// Load config with an optional path override.
///
/// If `config_override` is provided, loads only that file without merging.
/// Otherwise, discovers and merges all config files.
pub fn load_config(project_root: &Path, config_override: Option<&Path>) -> Result<SetupConfig> {
    match config_override {
        Some(path) => load_config_file(path),
        None => load_merged_config(&ConfigPaths::discover(project_root)),
    }
}
