//! JSONL storage for tasks
//!
//! Tasks are stored in `.taskgate/tasks.jsonl` with one JSON object per line.
//! A sibling `tasks.lock` file coordinates processes: readers hold it shared,
//! writers hold it exclusively for the whole read-modify-write cycle.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;

use crate::domain::{Task, TaskId};

/// Store for task data in JSONL format
pub struct TaskStore {
    path: PathBuf,
}

impl TaskStore {
    /// Creates a new task store at the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates the default store for a project
    pub fn for_project(project_root: &Path) -> Self {
        Self::new(project_root.join(".taskgate").join("tasks.jsonl"))
    }

    /// Returns the path to the store file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the path to the lock file
    pub fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    fn open_lock(&self) -> Result<File> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let lock_path = self.lock_path();
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .with_context(|| format!("Failed to open lock file: {}", lock_path.display()))
    }

    /// Reads all tasks from the store, in file order
    ///
    /// If an ID appears on several lines the last line wins, keeping the
    /// position of the first.
    pub fn read_all(&self) -> Result<Vec<Task>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let lock = self.open_lock()?;
        lock.lock_shared()
            .context("Failed to acquire read lock on task store")?;

        // Lock is released when `lock` is dropped
        self.read_unlocked()
    }

    fn read_unlocked(&self) -> Result<Vec<Task>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open task store: {}", self.path.display()))?;
        parse_lines(BufReader::new(file))
    }

    /// Writes all tasks to the store (full rewrite)
    #[cfg(test)]
    pub(crate) fn write_all(&self, tasks: &[Task]) -> Result<()> {
        let lock = self.open_lock()?;
        lock.lock_exclusive()
            .context("Failed to acquire write lock on task store")?;

        self.write_unlocked(tasks)
    }

    fn write_unlocked(&self, tasks: &[Task]) -> Result<()> {
        // Write to temp file first
        let temp_path = self.path.with_extension("jsonl.tmp");

        {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

            let mut writer = BufWriter::new(&file);
            for task in tasks {
                let line = serde_json::to_string(task).context("Failed to serialize task")?;
                writeln!(writer, "{}", line).context("Failed to write task")?;
            }

            writer.flush().context("Failed to flush task store")?;
        }

        // Atomic rename
        fs::rename(&temp_path, &self.path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                temp_path.display(),
                self.path.display()
            )
        })?;

        Ok(())
    }

    /// Appends a raw record without validation, as a hand edit or merge would
    #[cfg(test)]
    pub(crate) fn append(&self, task: &Task) -> Result<()> {
        let lock = self.open_lock()?;
        lock.lock_exclusive()
            .context("Failed to acquire write lock on task store")?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open task store: {}", self.path.display()))?;

        let mut writer = BufWriter::new(&file);
        let line = serde_json::to_string(task).context("Failed to serialize task")?;
        writeln!(writer, "{}", line).context("Failed to write task")?;

        writer.flush().context("Failed to flush task store")?;

        Ok(())
    }

    /// Runs a read-validate-write cycle while holding the exclusive lock
    ///
    /// `f` sees the current tasks and may change them. The store is
    /// rewritten only if `f` succeeds; an error leaves the file untouched.
    /// No other process can read or write between the read and the write,
    /// so validations done inside `f` hold for what gets persisted.
    pub fn mutate<T>(&self, f: impl FnOnce(&mut Vec<Task>) -> Result<T>) -> Result<T> {
        let lock = self.open_lock()?;
        lock.lock_exclusive()
            .context("Failed to acquire write lock on task store")?;

        let mut tasks = self.read_unlocked()?;
        let result = f(&mut tasks)?;
        self.write_unlocked(&tasks)?;

        Ok(result)
    }

    /// Removes a task by ID and strips it from every dependency list
    pub fn remove(&self, task_id: &TaskId) -> Result<bool> {
        self.mutate(|tasks| {
            let len_before = tasks.len();
            tasks.retain(|t| &t.id != task_id);
            let removed = tasks.len() != len_before;
            if removed {
                for task in tasks.iter_mut() {
                    task.remove_dependency(task_id);
                }
            }
            Ok(removed)
        })
    }

    /// Compacts the store (removes duplicate lines, rewrites clean)
    pub fn compact(&self) -> Result<usize> {
        self.mutate(|tasks| Ok(tasks.len()))
    }
}

/// Parses JSONL task records, collapsing repeated IDs onto the last record
pub(crate) fn parse_lines(reader: impl BufRead) -> Result<Vec<Task>> {
    let mut tasks: Vec<Task> = Vec::new();
    let mut positions: HashMap<TaskId, usize> = HashMap::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line {}", line_num + 1))?;

        if line.trim().is_empty() {
            continue;
        }

        let task: Task = serde_json::from_str(&line)
            .with_context(|| format!("Failed to parse task at line {}", line_num + 1))?;

        match positions.get(&task.id) {
            Some(&pos) => tasks[pos] = task,
            None => {
                positions.insert(task.id.clone(), tasks.len());
                tasks.push(task);
            }
        }
    }

    Ok(tasks)
}
