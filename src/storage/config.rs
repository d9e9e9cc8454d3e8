//! Configuration handling for taskgate
//!
//! Configuration is stored in `.taskgate/config.toml` (project) and
//! `~/.config/taskgate/config.toml` (global). `TASKGATE_CONFIG_DIR`
//! overrides the global directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{EligibilityStrategy, DEFAULT_CLOSURE_THRESHOLD};

/// Environment variable overriding the global config directory
pub const CONFIG_DIR_ENV: &str = "TASKGATE_CONFIG_DIR";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Strategy setting for eligible-dependency listing
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StrategySetting {
    /// Per-candidate search for small snapshots, closure pass above the threshold
    #[default]
    Auto,
    PerCandidate,
    Closure,
}

/// Configuration for `dep eligible`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EligibilityConfig {
    pub strategy: StrategySetting,

    /// Task count above which `auto` switches to the closure pass
    pub closure_threshold: usize,
}

impl Default for EligibilityConfig {
    fn default() -> Self {
        Self {
            strategy: StrategySetting::Auto,
            closure_threshold: DEFAULT_CLOSURE_THRESHOLD,
        }
    }
}

impl EligibilityConfig {
    /// Resolves the strategy for a snapshot of `task_count` tasks
    pub fn resolve(&self, task_count: usize) -> EligibilityStrategy {
        match self.strategy {
            StrategySetting::Auto => {
                EligibilityStrategy::for_task_count(task_count, self.closure_threshold)
            }
            StrategySetting::PerCandidate => EligibilityStrategy::PerCandidate,
            StrategySetting::Closure => EligibilityStrategy::Closure,
        }
    }
}

/// Project-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ProjectConfig {
    pub eligibility: EligibilityConfig,
}

/// Global user configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GlobalConfig {
    /// Output format used when `--format` is not given
    pub default_format: OutputFormat,
}

/// Output format for commands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Combined configuration (global + project)
#[derive(Debug, Clone)]
pub struct Config {
    pub project: ProjectConfig,
    pub global: GlobalConfig,
    pub project_root: Option<PathBuf>,
}

impl Config {
    /// Loads a project's configuration on top of an already loaded global config
    pub fn for_project_with(project_root: &Path, global: GlobalConfig) -> Result<Self> {
        let project = Self::load_project_config(project_root)?;

        Ok(Self {
            project,
            global,
            project_root: Some(project_root.to_path_buf()),
        })
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|d| !d.is_empty()) {
            return Some(PathBuf::from(dir));
        }
        ProjectDirs::from("dev", "taskgate", "taskgate").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Loads global configuration, without looking at any project
    pub fn load_global() -> Result<GlobalConfig> {
        let config_dir = match Self::global_config_dir() {
            Some(dir) => dir,
            None => return Ok(GlobalConfig::default()),
        };

        let config_path = config_dir.join("config.toml");
        if !config_path.exists() {
            return Ok(GlobalConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read global config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse global config")
    }

    /// Loads project configuration from a specific root
    fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
        let config_path = project_root.join(".taskgate").join("config.toml");

        if !config_path.exists() {
            return Ok(ProjectConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read project config: {}", config_path.display()))?;

        let config: ProjectConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse project config")?;

        config.validate()?;
        Ok(config)
    }

    /// Finds the project root by looking for `.taskgate/` directory
    pub fn find_project_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        Self::find_project_root_from(&current)
    }

    /// Walks up from `start` to the first directory containing `.taskgate/`
    pub fn find_project_root_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();

        loop {
            if current.join(".taskgate").is_dir() {
                return Some(current);
            }

            if !current.pop() {
                return None;
            }
        }
    }
}

impl ProjectConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.eligibility.closure_threshold == 0
            && self.eligibility.strategy == StrategySetting::Auto
        {
            return Err(ConfigError::Invalid(
                "eligibility.closure_threshold must be at least 1 when strategy is auto (use strategy = \"closure\" instead)"
                    .to_string(),
            ));
        }
        Ok(())
    }
}
