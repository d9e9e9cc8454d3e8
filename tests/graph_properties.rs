//! Property tests for the dependency graph queries
//!
//! Each snapshot is checked against a brute-force transitive closure.

use proptest::prelude::*;
use taskgate::domain::{
    blocked_by, eligible_dependencies, is_task_startable, would_create_cycle, DependencyGraph,
    EligibilityStrategy,
};
use taskgate::{Task, TaskId, TaskStatus};

const MAX_TASKS: usize = 10;

fn id(i: usize) -> TaskId {
    format!("T{}", i).parse().unwrap()
}

fn ghost() -> TaskId {
    "GHOST".parse().unwrap()
}

/// Per task: a bitmask of prerequisites, a completion flag and a dangling flag
fn snapshot_strategy() -> impl Strategy<Value = Vec<(u16, bool, bool)>> {
    prop::collection::vec((any::<u16>(), any::<bool>(), prop::bool::weighted(0.1)), 1..=MAX_TASKS)
}

/// Builds tasks from the generated rows; edges may point anywhere, so cycles happen
fn build(rows: &[(u16, bool, bool)], acyclic: bool) -> Vec<Task> {
    let n = rows.len();
    rows.iter()
        .enumerate()
        .map(|(i, &(mask, completed, dangling))| {
            let mut task = Task::new(id(i), format!("Task {}", i));
            let limit = if acyclic { i } else { n };
            for j in 0..limit {
                if j != i && mask & (1 << j) != 0 {
                    task.add_dependency(id(j));
                }
            }
            if dangling {
                task.add_dependency(ghost());
            }
            if completed {
                task.status = TaskStatus::Completed;
            }
            task
        })
        .collect()
}

/// `reach[a][b]` is true when `a` transitively depends on `b`
fn closure(tasks: &[Task]) -> Vec<Vec<bool>> {
    let n = tasks.len();
    let index = |tid: &TaskId| tasks.iter().position(|t| &t.id == tid);

    let mut reach = vec![vec![false; n]; n];
    for (a, task) in tasks.iter().enumerate() {
        for dep in &task.dependencies {
            if let Some(b) = index(dep) {
                reach[a][b] = true;
            }
        }
    }
    for k in 0..n {
        for a in 0..n {
            for b in 0..n {
                if reach[a][k] && reach[k][b] {
                    reach[a][b] = true;
                }
            }
        }
    }
    reach
}

proptest! {
    #[test]
    fn cycle_detection_matches_closure(rows in snapshot_strategy(), acyclic in any::<bool>()) {
        let tasks = build(&rows, acyclic);
        let reach = closure(&tasks);

        for d in 0..tasks.len() {
            for p in 0..tasks.len() {
                let expected = d == p || reach[p][d];
                prop_assert_eq!(
                    would_create_cycle(&tasks, &id(d), &id(p)),
                    expected,
                    "dependent {} prerequisite {}", d, p
                );
            }
        }
    }

    #[test]
    fn unknown_ids_never_form_cycles(rows in snapshot_strategy()) {
        let tasks = build(&rows, false);

        prop_assert!(would_create_cycle(&tasks, &ghost(), &ghost()));
        for i in 0..tasks.len() {
            prop_assert!(!would_create_cycle(&tasks, &id(i), &ghost()));
            prop_assert!(!would_create_cycle(&tasks, &ghost(), &id(i)));
        }
    }

    #[test]
    fn eligible_excludes_exactly_target_current_and_dependents(
        rows in snapshot_strategy(),
        acyclic in any::<bool>(),
    ) {
        let tasks = build(&rows, acyclic);
        let reach = closure(&tasks);
        let graph = DependencyGraph::new(&tasks);

        for target in 0..tasks.len() {
            let current = &tasks[target].dependencies;
            let expected: Vec<TaskId> = (0..tasks.len())
                .filter(|&c| c != target && !current.contains(&id(c)) && !reach[c][target])
                .map(id)
                .collect();

            for strategy in [EligibilityStrategy::PerCandidate, EligibilityStrategy::Closure] {
                let actual: Vec<TaskId> = graph
                    .eligible_dependencies_with(&id(target), current, strategy)
                    .into_iter()
                    .map(|t| t.id.clone())
                    .collect();
                prop_assert_eq!(&actual, &expected, "target {} {:?}", target, strategy);
            }

            let default: Vec<TaskId> = eligible_dependencies(&tasks, &id(target), current)
                .into_iter()
                .map(|t| t.id.clone())
                .collect();
            prop_assert_eq!(&default, &expected);
        }
    }

    #[test]
    fn adding_an_eligible_dependency_keeps_dag_acyclic(rows in snapshot_strategy()) {
        let tasks = build(&rows, true);
        prop_assume!(DependencyGraph::new(&tasks).topological_order().is_ok());

        for target in 0..tasks.len() {
            let current = tasks[target].dependencies.clone();
            let candidates: Vec<TaskId> = eligible_dependencies(&tasks, &id(target), &current)
                .into_iter()
                .map(|t| t.id.clone())
                .collect();

            for candidate in candidates {
                let mut next = tasks.clone();
                next[target].add_dependency(candidate.clone());
                prop_assert!(
                    DependencyGraph::new(&next).topological_order().is_ok(),
                    "{} -> {} closed a cycle", target, candidate
                );
            }
        }
    }

    #[test]
    fn blocked_by_is_direct_dependents(rows in snapshot_strategy(), acyclic in any::<bool>()) {
        let tasks = build(&rows, acyclic);

        for p in 0..tasks.len() {
            let expected: Vec<TaskId> = tasks
                .iter()
                .filter(|t| t.dependencies.contains(&id(p)))
                .map(|t| t.id.clone())
                .collect();
            let actual: Vec<TaskId> = blocked_by(&tasks, &id(p))
                .into_iter()
                .map(|t| t.id.clone())
                .collect();
            prop_assert_eq!(actual, expected);
        }

        let ghost_dependents = blocked_by(&tasks, &ghost()).len();
        let expected = tasks.iter().filter(|t| t.dependencies.contains(&ghost())).count();
        prop_assert_eq!(ghost_dependents, expected);
    }

    #[test]
    fn startable_means_every_prerequisite_completed(
        rows in snapshot_strategy(),
        acyclic in any::<bool>(),
    ) {
        let tasks = build(&rows, acyclic);

        for task in &tasks {
            let expected = task.dependencies.iter().all(|dep| {
                tasks
                    .iter()
                    .find(|t| &t.id == dep)
                    .map(|t| t.status.is_complete())
                    .unwrap_or(false)
            });
            prop_assert_eq!(is_task_startable(task, &tasks), expected);

            if task.dependencies.contains(&ghost()) {
                prop_assert!(!is_task_startable(task, &tasks));
            }
        }
    }
}
