//! # Storage Layer
//!
//! File-backed persistence for taskgate. The validator in
//! [`crate::domain`] never touches these types; the CLI loads a snapshot
//! from here, validates against it, and writes back.
//!
//! ## Storage Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Tasks | JSONL (one JSON per line) | `.taskgate/tasks.jsonl` |
//! | Config | TOML | `.taskgate/config.toml` |
//! | Global config | TOML | `~/.config/taskgate/config.toml` |
//!
//! ## Concurrency Safety
//!
//! - [`TaskStore`] coordinates processes through `fs2` locks on `tasks.lock`
//! - [`TaskStore::mutate`] holds the exclusive lock from read to write, so
//!   dependency edges validated inside it cannot race another writer
//! - All full rewrites are atomic (temp file + rename)
//!
//! ## Project Structure
//!
//! ```text
//! .taskgate/
//! ├── tasks.jsonl    # All tasks in JSONL format
//! ├── tasks.lock     # Lock file (ignored)
//! ├── config.toml    # Project configuration
//! └── .gitignore
//! ```

mod jsonl;
mod config;
mod project;

pub use jsonl::TaskStore;
pub(crate) use jsonl::parse_lines;
pub use config::{
    Config, ConfigError, EligibilityConfig, GlobalConfig, OutputFormat, ProjectConfig,
    StrategySetting, CONFIG_DIR_ENV,
};
pub use project::{Project, ProjectError};
