//! Domain models for taskgate
//!
//! Contains the task model and the dependency validator, without any I/O concerns.

mod id;
mod task;
mod graph;

pub use id::{TaskId, IdError};
pub use task::{Task, TaskError, TaskStatus};
pub use graph::{
    blocked_by, eligible_dependencies, is_task_startable, would_create_cycle, DependencyGraph,
    EligibilityStrategy, GraphError, IntegrityReport, DEFAULT_CLOSURE_THRESHOLD,
};
