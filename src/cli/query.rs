//! Query commands (ready, blocked, order, check)

use anyhow::Result;

use super::output::Output;
use super::source::Source;
use crate::domain::DependencyGraph;

/// Show tasks ready to work on
pub fn ready(source: &Source, output: &Output) -> Result<()> {
    let tasks = source.load(output)?;
    let graph = DependencyGraph::new(&tasks);
    let ready_tasks = graph.ready_tasks();

    output.verbose_ctx("ready", &format!("Found {} ready tasks", ready_tasks.len()));

    if output.is_json() {
        let items: Vec<_> = ready_tasks
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
    } else if ready_tasks.is_empty() {
        println!("No tasks ready to work on.");
    } else {
        println!("Ready tasks ({}):", ready_tasks.len());
        println!("{:<20} {:<16} TITLE", "ID", "STATUS");
        println!("{}", "-".repeat(60));
        for task in ready_tasks {
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

/// Show tasks waiting on unfinished or missing prerequisites
pub fn blocked(source: &Source, output: &Output) -> Result<()> {
    let tasks = source.load(output)?;
    let graph = DependencyGraph::new(&tasks);
    let waiting = graph.waiting_tasks();

    output.verbose_ctx("blocked", &format!("Found {} blocked tasks", waiting.len()));

    if output.is_json() {
        let items: Vec<_> = waiting
            .iter()
            .map(|(task, blockers)| {
                serde_json::json!({
                    "id": task.id,
                    "title": task.title,
                    "blocked_by": blockers,
                })
            })
            .collect();
        output.data(&items);
    } else if waiting.is_empty() {
        println!("No blocked tasks.");
    } else {
        println!("Blocked tasks ({}):", waiting.len());
        println!("{:<20} {:<30} BLOCKED BY", "ID", "TITLE");
        println!("{}", "-".repeat(80));
        for (task, blockers) in waiting {
            let blockers: Vec<String> = blockers
                .iter()
                .map(|id| match graph.status_of(id) {
                    Some(_) => id.to_string(),
                    None => format!("{} (missing)", id),
                })
                .collect();
            println!("{:<20} {:<30} {}", task.id, task.title, blockers.join(", "));
        }
    }

    Ok(())
}

/// Show all tasks in dependency order
pub fn order(source: &Source, output: &Output) -> Result<()> {
    let tasks = source.load(output)?;
    let graph = DependencyGraph::new(&tasks);
    let order = graph.topological_order()?;

    if output.is_json() {
        output.data(&order);
    } else {
        for (position, id) in order.iter().enumerate() {
            let title = graph.get(id).map(|t| t.title.as_str()).unwrap_or_default();
            println!("{:>4}. {:<20} {}", position + 1, id, title);
        }
    }

    Ok(())
}

/// Report data-integrity problems in the snapshot
pub fn check(source: &Source, output: &Output) -> Result<()> {
    let tasks = source.load(output)?;
    let report = DependencyGraph::new(&tasks).check();

    let problems = report.dangling.len()
        + report.duplicate_ids.len()
        + report.self_dependencies.len()
        + report.cycles.len();

    if output.is_json() {
        output.data(&serde_json::json!({
            "clean": report.is_clean(),
            "report": report,
        }));
    } else if report.is_clean() {
        println!("No problems found in {} tasks.", tasks.len());
    } else {
        for (task, missing) in &report.dangling {
            println!("dangling:  {} depends on unknown task {}", task, missing);
        }
        for id in &report.duplicate_ids {
            println!("duplicate: {} appears more than once", id);
        }
        for id in &report.self_dependencies {
            println!("self:      {} depends on itself", id);
        }
        for cycle in &report.cycles {
            let ids: Vec<String> = cycle.iter().map(|id| id.to_string()).collect();
            println!("cycle:     {}", ids.join(" <-> "));
        }
    }

    if !report.is_clean() {
        anyhow::bail!("Found {} integrity problem(s)", problems);
    }

    Ok(())
}
