//! Dependency graph for tasks
//!
//! [`DependencyGraph`] is a borrowed, per-call index over a snapshot of
//! tasks. It answers whether a proposed dependency would close a cycle,
//! which tasks may safely be added as prerequisites, which tasks a task
//! blocks, and whether a task may start. It holds no state beyond the
//! snapshot it was built from; build a new one whenever the tasks change.
//!
//! Snapshots are not trusted to be well formed. Dependencies naming unknown
//! tasks are never traversed and always block, duplicate IDs are merged,
//! and traversals terminate even if the snapshot already contains a cycle.
//!
//! The snapshot is only as good as the moment it was taken: two writers that
//! validate `A -> B` and `B -> A` against the same snapshot both pass.
//! Callers that persist edges must serialize those mutations (see
//! [`TaskStore::mutate`](crate::storage::TaskStore::mutate)).

use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use petgraph::Direction;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

use super::id::TaskId;
use super::task::{Task, TaskStatus};

/// Task count above which [`EligibilityStrategy::for_task_count`] picks a closure pass
pub const DEFAULT_CLOSURE_THRESHOLD: usize = 256;

#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("Adding dependency would create a cycle: {0} -> {1}")]
    CycleDetected(TaskId, TaskId),

    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("Self-dependency not allowed: {0}")]
    SelfDependency(TaskId),

    #[error("{0} already depends on {1}")]
    DuplicateDependency(TaskId, TaskId),

    #[error("Snapshot contains a dependency cycle through {0}")]
    CyclicSnapshot(TaskId),
}

/// How [`DependencyGraph::eligible_dependencies_with`] evaluates candidates
///
/// Both strategies return the same tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EligibilityStrategy {
    /// One reachability search per candidate (quadratic, no extra memory)
    PerCandidate,
    /// One pass collecting every transitive dependent of the target
    Closure,
}

impl EligibilityStrategy {
    /// Picks a strategy for a snapshot of `task_count` tasks
    pub fn for_task_count(task_count: usize, closure_threshold: usize) -> Self {
        if task_count > closure_threshold {
            EligibilityStrategy::Closure
        } else {
            EligibilityStrategy::PerCandidate
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EligibilityStrategy::PerCandidate => "per_candidate",
            EligibilityStrategy::Closure => "closure",
        }
    }
}

/// Data-integrity problems found in a snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IntegrityReport {
    /// `(task, missing prerequisite)` pairs
    pub dangling: Vec<(TaskId, TaskId)>,
    /// IDs carried by more than one task record
    pub duplicate_ids: Vec<TaskId>,
    /// Tasks listing themselves as a prerequisite
    pub self_dependencies: Vec<TaskId>,
    /// Groups of tasks that depend on each other in a loop
    pub cycles: Vec<Vec<TaskId>>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.dangling.is_empty()
            && self.duplicate_ids.is_empty()
            && self.self_dependencies.is_empty()
            && self.cycles.is_empty()
    }
}

/// A dependency graph over a borrowed task snapshot
#[derive(Debug)]
pub struct DependencyGraph<'a> {
    tasks: &'a [Task],

    /// Edge direction is prerequisite -> dependent
    graph: DiGraph<&'a TaskId, ()>,

    /// Map from TaskId to node index
    node_map: HashMap<&'a TaskId, NodeIndex>,

    /// Effective status per ID; a duplicated ID is complete only if every record is
    statuses: HashMap<&'a TaskId, TaskStatus>,
}

impl<'a> DependencyGraph<'a> {
    /// Indexes a snapshot
    pub fn new(tasks: &'a [Task]) -> Self {
        let mut graph = DiGraph::new();
        let mut node_map = HashMap::new();
        let mut statuses: HashMap<&'a TaskId, TaskStatus> = HashMap::new();

        // First pass: add all nodes
        for task in tasks {
            node_map
                .entry(&task.id)
                .or_insert_with(|| graph.add_node(&task.id));

            statuses
                .entry(&task.id)
                .and_modify(|status| {
                    if !task.status.is_complete() {
                        *status = task.status;
                    }
                })
                .or_insert(task.status);
        }

        // Second pass: add edges whose prerequisite is known
        for task in tasks {
            let dependent = node_map[&task.id];
            for dep_id in &task.dependencies {
                if let Some(&prerequisite) = node_map.get(dep_id) {
                    graph.update_edge(prerequisite, dependent, ());
                }
            }
        }

        Self {
            tasks,
            graph,
            node_map,
            statuses,
        }
    }

    /// Returns the records this graph was built from
    pub fn tasks(&self) -> &'a [Task] {
        self.tasks
    }

    /// Returns the first record carrying `task_id`
    pub fn get(&self, task_id: &TaskId) -> Option<&'a Task> {
        self.tasks.iter().find(|t| &t.id == task_id)
    }

    /// Returns true if the snapshot contains the task
    pub fn contains(&self, task_id: &TaskId) -> bool {
        self.node_map.contains_key(task_id)
    }

    /// Returns the number of distinct task IDs
    pub fn len(&self) -> usize {
        self.node_map.len()
    }

    /// Returns true if the snapshot is empty
    pub fn is_empty(&self) -> bool {
        self.node_map.is_empty()
    }

    /// Returns the effective status of a task, or None if unknown
    pub fn status_of(&self, task_id: &TaskId) -> Option<TaskStatus> {
        self.statuses.get(task_id).copied()
    }

    /// Returns true if making `dependent` depend on `prerequisite` would close a cycle
    ///
    /// A self-dependency always counts as a cycle. Otherwise this walks the
    /// existing prerequisites of `prerequisite`, depth first, and reports
    /// whether `dependent` is among them.
    pub fn would_create_cycle(&self, dependent: &TaskId, prerequisite: &TaskId) -> bool {
        if dependent == prerequisite {
            return true;
        }

        let (Some(&start), Some(&goal)) =
            (self.node_map.get(prerequisite), self.node_map.get(dependent))
        else {
            // An unknown task has no edges in the snapshot, so nothing can loop back
            return false;
        };

        let mut visited = HashSet::new();
        let mut stack = vec![start];

        while let Some(node) = stack.pop() {
            if node == goal {
                return true;
            }
            if !visited.insert(node) {
                continue;
            }
            stack.extend(
                self.graph
                    .neighbors_directed(node, Direction::Incoming)
                    .filter(|next| !visited.contains(next)),
            );
        }

        false
    }

    /// Returns the tasks that may be added as a prerequisite of `target`
    ///
    /// Excludes the target itself, IDs in `current`, and every task for which
    /// [`would_create_cycle`](Self::would_create_cycle) holds. Each ID is
    /// reported once, in snapshot order.
    pub fn eligible_dependencies(&self, target: &TaskId, current: &[TaskId]) -> Vec<&'a Task> {
        let strategy = EligibilityStrategy::for_task_count(self.len(), DEFAULT_CLOSURE_THRESHOLD);
        self.eligible_dependencies_with(target, current, strategy)
    }

    /// [`eligible_dependencies`](Self::eligible_dependencies) with an explicit strategy
    pub fn eligible_dependencies_with(
        &self,
        target: &TaskId,
        current: &[TaskId],
        strategy: EligibilityStrategy,
    ) -> Vec<&'a Task> {
        let dependents = match strategy {
            EligibilityStrategy::Closure => Some(self.transitive_dependents(target)),
            EligibilityStrategy::PerCandidate => None,
        };

        let mut seen = HashSet::new();
        let mut eligible = Vec::new();

        for task in self.tasks {
            if &task.id == target || current.contains(&task.id) || !seen.insert(&task.id) {
                continue;
            }

            let forms_cycle = match &dependents {
                Some(dependents) => dependents.contains(&task.id),
                None => self.would_create_cycle(target, &task.id),
            };
            if !forms_cycle {
                eligible.push(task);
            }
        }

        eligible
    }

    /// Every task that reaches `task_id` through prerequisite edges, plus `task_id` itself
    fn transitive_dependents(&self, task_id: &TaskId) -> HashSet<&'a TaskId> {
        let Some(&start) = self.node_map.get(task_id) else {
            return HashSet::new();
        };

        let mut dfs = Dfs::new(&self.graph, start);
        let mut reached = HashSet::new();
        while let Some(node) = dfs.next(&self.graph) {
            reached.insert(self.graph[node]);
        }
        reached
    }

    /// Returns the tasks that list `prerequisite` as a direct dependency
    ///
    /// Direct only: a task blocked through an intermediate task is not included.
    pub fn blocked_by(&self, prerequisite: &TaskId) -> Vec<&'a Task> {
        self.tasks
            .iter()
            .filter(|task| task.depends_on(prerequisite))
            .collect()
    }

    /// Returns true if every dependency of `task` is completed
    ///
    /// Dependencies that do not resolve to a task in the snapshot block.
    pub fn is_startable(&self, task: &Task) -> bool {
        task.dependencies.iter().all(|dep_id| {
            self.status_of(dep_id)
                .map(|s| s.is_complete())
                .unwrap_or(false)
        })
    }

    /// Returns the dependencies of `task` that are not completed, unknown IDs included
    pub fn unmet_dependencies<'t>(&self, task: &'t Task) -> Vec<&'t TaskId> {
        task.dependencies
            .iter()
            .filter(|dep_id| {
                !self
                    .status_of(dep_id)
                    .map(|s| s.is_complete())
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Returns open tasks whose prerequisites are all completed
    pub fn ready_tasks(&self) -> Vec<&'a Task> {
        self.tasks
            .iter()
            .filter(|task| !task.status.is_complete() && self.is_startable(task))
            .collect()
    }

    /// Returns open tasks held up by at least one prerequisite, with those prerequisites
    pub fn waiting_tasks(&self) -> Vec<(&'a Task, Vec<&'a TaskId>)> {
        self.tasks
            .iter()
            .filter(|task| !task.status.is_complete())
            .filter_map(|task| {
                let unmet = self.unmet_dependencies(task);
                (!unmet.is_empty()).then_some((task, unmet))
            })
            .collect()
    }

    /// Returns the direct prerequisites of a task that exist in the snapshot
    pub fn dependencies_of(&self, task_id: &TaskId) -> Vec<&'a TaskId> {
        self.neighbors(task_id, Direction::Incoming)
    }

    /// Returns the direct dependents of a task (tasks that depend on it)
    pub fn dependents_of(&self, task_id: &TaskId) -> Vec<&'a TaskId> {
        self.neighbors(task_id, Direction::Outgoing)
    }

    fn neighbors(&self, task_id: &TaskId, direction: Direction) -> Vec<&'a TaskId> {
        let Some(&idx) = self.node_map.get(task_id) else {
            return vec![];
        };

        let mut ids: Vec<_> = self
            .graph
            .neighbors_directed(idx, direction)
            .filter(|&n| n != idx)
            .map(|n| self.graph[n])
            .collect();
        ids.sort();
        ids
    }

    /// Returns all task IDs in topological order (prerequisites before dependents)
    pub fn topological_order(&self) -> Result<Vec<&'a TaskId>, GraphError> {
        toposort(&self.graph, None)
            .map(|order| order.into_iter().map(|idx| self.graph[idx]).collect())
            .map_err(|cycle| GraphError::CyclicSnapshot(self.graph[cycle.node_id()].clone()))
    }

    /// Validates the edge `dependent -> prerequisite` before it is persisted
    pub fn validate_new_dependency(
        &self,
        dependent: &TaskId,
        prerequisite: &TaskId,
    ) -> Result<(), GraphError> {
        if dependent == prerequisite {
            return Err(GraphError::SelfDependency(dependent.clone()));
        }
        if !self.contains(dependent) {
            return Err(GraphError::TaskNotFound(dependent.clone()));
        }
        if !self.contains(prerequisite) {
            return Err(GraphError::TaskNotFound(prerequisite.clone()));
        }
        if self
            .tasks
            .iter()
            .any(|t| &t.id == dependent && t.depends_on(prerequisite))
        {
            return Err(GraphError::DuplicateDependency(
                dependent.clone(),
                prerequisite.clone(),
            ));
        }
        if self.would_create_cycle(dependent, prerequisite) {
            return Err(GraphError::CycleDetected(
                dependent.clone(),
                prerequisite.clone(),
            ));
        }
        Ok(())
    }

    /// Collects dangling references, duplicate IDs, self-dependencies and cycles
    pub fn check(&self) -> IntegrityReport {
        let mut report = IntegrityReport::default();

        let mut seen = HashSet::new();
        let mut duplicates = HashSet::new();
        for task in self.tasks {
            if !seen.insert(&task.id) && duplicates.insert(&task.id) {
                report.duplicate_ids.push(task.id.clone());
            }
            for dep_id in &task.dependencies {
                if dep_id == &task.id {
                    if !report.self_dependencies.contains(dep_id) {
                        report.self_dependencies.push(dep_id.clone());
                    }
                } else if !self.contains(dep_id) {
                    report.dangling.push((task.id.clone(), dep_id.clone()));
                }
            }
        }

        for component in tarjan_scc(&self.graph) {
            if component.len() > 1 {
                let mut ids: Vec<TaskId> =
                    component.iter().map(|&n| self.graph[n].clone()).collect();
                ids.sort();
                report.cycles.push(ids);
            }
        }
        report.cycles.sort();

        report
    }
}

/// Returns true if making `dependent` depend on `prerequisite` would close a cycle
pub fn would_create_cycle(tasks: &[Task], dependent: &TaskId, prerequisite: &TaskId) -> bool {
    DependencyGraph::new(tasks).would_create_cycle(dependent, prerequisite)
}

/// Returns the tasks that may be added as a prerequisite of `target`
pub fn eligible_dependencies<'a>(
    tasks: &'a [Task],
    target: &TaskId,
    current: &[TaskId],
) -> Vec<&'a Task> {
    DependencyGraph::new(tasks).eligible_dependencies(target, current)
}

/// Returns the tasks that list `prerequisite` as a direct dependency
pub fn blocked_by<'a>(tasks: &'a [Task], prerequisite: &TaskId) -> Vec<&'a Task> {
    DependencyGraph::new(tasks).blocked_by(prerequisite)
}

/// Returns true if every dependency of `task` is completed in `tasks`
pub fn is_task_startable(task: &Task, tasks: &[Task]) -> bool {
    DependencyGraph::new(tasks).is_startable(task)
}
