//! Where a command reads its task snapshot from
//!
//! Normally that is the project's task store. With `--snapshot FILE` the
//! tasks come from a JSON array or JSONL file instead, and only read-only
//! commands are allowed.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::output::Output;
use crate::domain::{GraphError, Task, TaskId};
use crate::storage::{parse_lines, EligibilityConfig, GlobalConfig, Project, TaskStore};

/// Snapshot provider for one command invocation
pub enum Source {
    Project(Project),
    Snapshot {
        path: PathBuf,
        eligibility: EligibilityConfig,
    },
}

impl Source {
    /// Opens the snapshot file if given, otherwise the current project
    ///
    /// A snapshot is evaluated with default settings; no project config is read.
    pub fn open(snapshot: Option<&Path>, global: GlobalConfig, output: &Output) -> Result<Self> {
        match snapshot {
            Some(path) => {
                output.verbose_ctx("source", &format!("Using snapshot file: {}", path.display()));
                Ok(Source::Snapshot {
                    path: path.to_path_buf(),
                    eligibility: EligibilityConfig::default(),
                })
            }
            None => {
                let project = Project::open_current(global)?;
                output.verbose_ctx(
                    "source",
                    &format!("Opened project at: {}", project.root().display()),
                );
                Ok(Source::Project(project))
            }
        }
    }

    /// Loads the full task snapshot
    pub fn load(&self, output: &Output) -> Result<Vec<Task>> {
        let tasks = match self {
            Source::Project(project) => project.task_store().read_all()?,
            Source::Snapshot { path, .. } => read_snapshot_file(path)?,
        };
        output.verbose_ctx("source", &format!("Loaded {} task records", tasks.len()));
        Ok(tasks)
    }

    /// Returns the task store, refusing to write into a snapshot file
    pub fn store(&self) -> Result<TaskStore> {
        match self {
            Source::Project(project) => Ok(project.task_store()),
            Source::Snapshot { path, .. } => anyhow::bail!(
                "Snapshot {} is read-only; run this command inside a taskgate project",
                path.display()
            ),
        }
    }

    pub fn eligibility(&self) -> &EligibilityConfig {
        match self {
            Source::Project(project) => &project.config().project.eligibility,
            Source::Snapshot { eligibility, .. } => eligibility,
        }
    }
}

/// Reads a snapshot as a JSON array of tasks, or as JSONL
///
/// A JSON array is taken verbatim, duplicates included. JSONL follows store
/// semantics: a repeated ID replaces the earlier record.
pub fn read_snapshot_file(path: &Path) -> Result<Vec<Task>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;

    if content.trim_start().starts_with('[') {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse snapshot: {}", path.display()))
    } else {
        parse_lines(Cursor::new(content))
            .with_context(|| format!("Failed to parse snapshot: {}", path.display()))
    }
}

/// Parses a task ID argument, ignoring surrounding whitespace
pub fn parse_id(raw: &str) -> Result<TaskId> {
    raw.trim()
        .parse()
        .with_context(|| format!("Invalid task ID argument '{}'", raw))
}

/// Finds a task by ID in a snapshot
pub fn find<'a>(tasks: &'a [Task], id: &TaskId) -> Result<&'a Task> {
    tasks
        .iter()
        .find(|t| &t.id == id)
        .ok_or_else(|| GraphError::TaskNotFound(id.clone()).into())
}

/// Finds a task by ID for modification
pub fn find_mut<'a>(tasks: &'a mut [Task], id: &TaskId) -> Result<&'a mut Task> {
    tasks
        .iter_mut()
        .find(|t| &t.id == id)
        .ok_or_else(|| GraphError::TaskNotFound(id.clone()).into())
}
