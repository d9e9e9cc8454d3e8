//! taskgate - dependency validation for task graphs
//!
//! Tasks name the tasks they depend on. taskgate keeps that graph acyclic:
//! it rejects dependencies that would close a cycle, lists which tasks can
//! safely become prerequisites, and decides whether a task may start.
//! Every check runs against a snapshot supplied by the caller.

pub mod domain;
pub mod storage;
pub mod cli;

pub use domain::{DependencyGraph, GraphError, Task, TaskId, TaskStatus};
