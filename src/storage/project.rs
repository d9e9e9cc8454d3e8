//! Project management
//!
//! Handles project initialization and provides access to the task store.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use super::{Config, GlobalConfig, TaskStore};

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Not in a taskgate project. Run 'taskgate init' first.")]
    NotInProject,
}

/// A taskgate project
pub struct Project {
    root: PathBuf,
    config: Config,
}

impl Project {
    /// Opens an existing project at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        Self::open_with(root, Config::load_global()?)
    }

    /// Opens an existing project, reusing an already loaded global config
    pub fn open_with(root: impl Into<PathBuf>, global: GlobalConfig) -> Result<Self> {
        let root = root.into();
        let state_dir = root.join(".taskgate");

        if !state_dir.is_dir() {
            return Err(ProjectError::NotInProject.into());
        }

        let config = Config::for_project_with(&root, global)?;

        Ok(Self { root, config })
    }

    /// Opens the project at the current directory or a parent
    pub fn open_current(global: GlobalConfig) -> Result<Self> {
        let root = Config::find_project_root().ok_or(ProjectError::NotInProject)?;

        Self::open_with(root, global)
    }

    /// Initializes a new project at the given path
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let state_dir = root.join(".taskgate");

        fs::create_dir_all(&state_dir).with_context(|| {
            format!("Failed to create .taskgate directory: {}", state_dir.display())
        })?;

        // Create default config
        let config_path = state_dir.join("config.toml");
        if !config_path.exists() {
            let default_config = r#"# taskgate configuration

[eligibility]
# How `taskgate dep eligible` evaluates candidates: auto, per_candidate or closure
strategy = "auto"

# With strategy = "auto", switch to a single closure pass above this many tasks
closure_threshold = 256
"#;
            fs::write(&config_path, default_config)
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }

        let tasks_path = state_dir.join("tasks.jsonl");
        if !tasks_path.exists() {
            fs::write(&tasks_path, "")
                .with_context(|| format!("Failed to create task store: {}", tasks_path.display()))?;
        }

        let gitignore_path = state_dir.join(".gitignore");
        if !gitignore_path.exists() {
            let gitignore = r#"# Lock and temp files used while writing tasks.jsonl
tasks.lock
*.tmp
"#;
            fs::write(&gitignore_path, gitignore).with_context(|| {
                format!("Failed to write .gitignore: {}", gitignore_path.display())
            })?;
        }

        Self::open(root)
    }

    /// Returns the project root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the .taskgate directory path
    pub fn state_dir(&self) -> PathBuf {
        self.root.join(".taskgate")
    }

    /// Returns the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the task store
    pub fn task_store(&self) -> TaskStore {
        TaskStore::for_project(&self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn init_creates_structure() {
        let dir = TempDir::new().unwrap();
        let project = Project::init(dir.path()).unwrap();

        assert!(project.state_dir().is_dir());
        assert!(project.state_dir().join("config.toml").is_file());
        assert!(project.state_dir().join("tasks.jsonl").is_file());
        assert!(project.state_dir().join(".gitignore").is_file());
    }

    #[test]
    fn init_is_idempotent() {
        let dir = TempDir::new().unwrap();

        Project::init(dir.path()).unwrap();
        Project::init(dir.path()).unwrap(); // Should not fail

        assert!(dir.path().join(".taskgate").is_dir());
    }

    #[test]
    fn init_keeps_existing_tasks() {
        let dir = TempDir::new().unwrap();
        let project = Project::init(dir.path()).unwrap();
        project
            .task_store()
            .append(&crate::domain::Task::new("A".parse().unwrap(), "Keep me"))
            .unwrap();

        let project = Project::init(dir.path()).unwrap();
        assert_eq!(project.task_store().read_all().unwrap().len(), 1);
    }

    #[test]
    fn default_config_file_parses_to_defaults() {
        let dir = TempDir::new().unwrap();
        let project = Project::init(dir.path()).unwrap();

        assert_eq!(project.config().project, super::super::ProjectConfig::default());
    }

    #[test]
    fn open_existing_project() {
        let dir = TempDir::new().unwrap();
        Project::init(dir.path()).unwrap();

        let project = Project::open(dir.path()).unwrap();
        assert_eq!(project.root(), dir.path());
    }

    #[test]
    fn open_non_project_fails() {
        let dir = TempDir::new().unwrap();
        let result = Project::open(dir.path());

        assert!(result.is_err());
    }

    #[test]
    fn task_store_lives_in_state_dir() {
        let dir = TempDir::new().unwrap();
        let project = Project::init(dir.path()).unwrap();

        let task_store = project.task_store();
        assert!(task_store.path().ends_with(".taskgate/tasks.jsonl"));
    }
}
