//! Dependency CLI commands
//!
//! `add` and `rm` run inside [`TaskStore::mutate`](crate::storage::TaskStore::mutate),
//! so the snapshot they validate against is the one they write back.

use anyhow::Result;
use clap::Subcommand;

use super::output::Output;
use super::source::{find, find_mut, parse_id, Source};
use crate::domain::DependencyGraph;

#[derive(Subcommand)]
pub enum DepCommands {
    /// Make a task depend on a prerequisite (rejected if it would close a cycle)
    Add {
        /// Task that will be blocked
        task: String,

        /// Task that must be completed first
        prerequisite: String,
    },

    /// Remove a dependency
    Rm {
        /// Task to unblock
        task: String,

        /// Prerequisite to remove
        prerequisite: String,
    },

    /// Report whether adding a dependency would create a cycle, without changing anything
    Check {
        /// Task that would be blocked
        task: String,

        /// Task that would have to be completed first
        prerequisite: String,
    },

    /// List tasks that can be added as prerequisites without creating a cycle
    Eligible {
        /// Task to find prerequisites for
        task: String,
    },

    /// List tasks that directly depend on a task
    Blocked {
        /// Prerequisite task
        task: String,
    },
}

pub fn run(cmd: DepCommands, source: &Source, output: &Output) -> Result<()> {
    match cmd {
        DepCommands::Add { task, prerequisite } => add(source, output, &task, &prerequisite),
        DepCommands::Rm { task, prerequisite } => remove(source, output, &task, &prerequisite),
        DepCommands::Check { task, prerequisite } => check(source, output, &task, &prerequisite),
        DepCommands::Eligible { task } => eligible(source, output, &task),
        DepCommands::Blocked { task } => blocked(source, output, &task),
    }
}

fn add(source: &Source, output: &Output, task: &str, prerequisite: &str) -> Result<()> {
    let dependent = parse_id(task)?;
    let prerequisite = parse_id(prerequisite)?;
    let store = source.store()?;

    store.mutate(|tasks| {
        output.verbose_ctx(
            "dep",
            &format!("Validating {} -> {} against {} tasks", dependent, prerequisite, tasks.len()),
        );
        DependencyGraph::new(tasks.as_slice()).validate_new_dependency(&dependent, &prerequisite)?;
        find_mut(tasks, &dependent)?.add_dependency(prerequisite.clone());
        Ok(())
    })?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "success": true,
            "task": dependent,
            "depends_on": prerequisite,
        }));
    } else {
        output.success(&format!("{} now depends on {}", dependent, prerequisite));
    }

    Ok(())
}

fn remove(source: &Source, output: &Output, task: &str, prerequisite: &str) -> Result<()> {
    let dependent = parse_id(task)?;
    let prerequisite = parse_id(prerequisite)?;
    let store = source.store()?;

    store.mutate(|tasks| {
        if !find_mut(tasks, &dependent)?.remove_dependency(&prerequisite) {
            anyhow::bail!("{} does not depend on {}", dependent, prerequisite);
        }
        Ok(())
    })?;

    output.success(&format!("{} no longer depends on {}", dependent, prerequisite));
    Ok(())
}

fn check(source: &Source, output: &Output, task: &str, prerequisite: &str) -> Result<()> {
    let dependent = parse_id(task)?;
    let prerequisite = parse_id(prerequisite)?;
    let tasks = source.load(output)?;

    let cyclic = DependencyGraph::new(&tasks).would_create_cycle(&dependent, &prerequisite);

    if output.is_json() {
        output.data(&serde_json::json!({
            "task": dependent,
            "prerequisite": prerequisite,
            "would_create_cycle": cyclic,
        }));
    } else if cyclic {
        println!("{} -> {} would create a cycle", dependent, prerequisite);
    } else {
        println!("{} -> {} is safe to add", dependent, prerequisite);
    }

    Ok(())
}

fn eligible(source: &Source, output: &Output, task: &str) -> Result<()> {
    let target = parse_id(task)?;
    let tasks = source.load(output)?;
    let graph = DependencyGraph::new(&tasks);
    let current = &find(&tasks, &target)?.dependencies;

    let strategy = source.eligibility().resolve(graph.len());
    output.verbose_ctx(
        "eligible",
        &format!("Evaluating {} tasks with {} strategy", graph.len(), strategy.as_str()),
    );

    let candidates = graph.eligible_dependencies_with(&target, current, strategy);

    if output.is_json() {
        let items: Vec<_> = candidates
            .iter()
            .map(|t| {
                serde_json::json!({
                    "id": t.id,
                    "title": t.title,
                    "status": t.status,
                })
            })
            .collect();
        output.data(&items);
    } else if candidates.is_empty() {
        println!("No tasks can be added as a dependency of {}.", target);
    } else {
        println!("Eligible dependencies for {} ({}):", target, candidates.len());
        println!("{:<20} TITLE", "ID");
        println!("{}", "-".repeat(60));
        for candidate in candidates {
            println!("{:<20} {}", candidate.id, candidate.title);
        }
    }

    Ok(())
}

fn blocked(source: &Source, output: &Output, task: &str) -> Result<()> {
    let prerequisite = parse_id(task)?;
    let tasks = source.load(output)?;
    let graph = DependencyGraph::new(&tasks);

    if !graph.contains(&prerequisite) {
        output.verbose_ctx(
            "blocked",
            &format!("{} is not in the snapshot; listing dangling references", prerequisite),
        );
    }

    let dependents = graph.blocked_by(&prerequisite);

    if output.is_json() {
        let items: Vec<_> = dependents
            .iter()
            .map(|t| {
                serde_json::json!({
                    "id": t.id,
                    "title": t.title,
                    "status": t.status,
                })
            })
            .collect();
        output.data(&items);
    } else if dependents.is_empty() {
        println!("No tasks depend on {}.", prerequisite);
    } else {
        println!("Blocked by {} ({}):", prerequisite, dependents.len());
        println!("{:<20} {:<16} TITLE", "ID", "STATUS");
        println!("{}", "-".repeat(60));
        for task in dependents {
            println!(
                "{:<20} {} {:<12} {}",
                task.id,
                task.status.marker(),
                task.status,
                task.title
            );
        }
    }

    Ok(())
}
