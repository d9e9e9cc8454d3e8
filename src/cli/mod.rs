//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Command Groups
//!
//! | Group | Purpose | Examples |
//! |-------|---------|----------|
//! | Core | Project management | `init`, `compact` |
//! | Task | Work item management | `task add`, `task start`, `task done` |
//! | Dep | Dependency edges | `dep add`, `dep check`, `dep eligible`, `dep blocked` |
//! | Query | Whole-graph queries | `ready`, `blocked`, `order`, `check` |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! The default can be changed with `default_format` in the global config.
//!
//! ## Snapshots
//!
//! `--snapshot FILE` runs read-only commands against a JSON array or JSONL
//! file instead of the current project:
//! ```bash
//! taskgate --snapshot export.json dep eligible t-1a2b3c4
//! ```
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`, or `TASKGATE_VERBOSE=1`) for debug output on stderr.
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod dep;
mod output;
mod query;
mod source;
mod task;

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat};
