//! Task CLI commands

use anyhow::Result;
use chrono::Utc;
use clap::Subcommand;

use super::output::Output;
use super::source::{find, find_mut, parse_id, Source};
use crate::domain::{DependencyGraph, Task, TaskId, TaskStatus};

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Add a task
    ///
    /// Examples:
    ///   taskgate task add "Write schema"
    ///   taskgate task add "Build API" --after t-1234567
    Add {
        /// Task title
        title: String,

        /// Explicit task ID (generated from the title if omitted)
        #[arg(long)]
        id: Option<String>,

        /// Prerequisite task (repeatable)
        #[arg(long, value_name = "TASK")]
        after: Vec<String>,

        /// Optional description
        #[arg(long, short)]
        description: Option<String>,
    },

    /// List tasks
    List {
        /// Only show tasks with this status
        #[arg(long)]
        status: Option<String>,
    },

    /// Show task details
    Show {
        /// Task ID
        id: String,
    },

    /// Mark task as in progress (requires all prerequisites completed)
    Start {
        /// Task ID
        id: String,
    },

    /// Submit an in-progress task for review
    Review {
        /// Task ID
        id: String,
    },

    /// Mark task as completed
    Done {
        /// Task ID
        id: String,
    },

    /// Reopen a completed or in-review task
    Reopen {
        /// Task ID
        id: String,
    },

    /// Remove a task and every dependency on it
    Rm {
        /// Task ID
        id: String,
    },
}

pub fn run(cmd: TaskCommands, source: &Source, output: &Output) -> Result<()> {
    match cmd {
        TaskCommands::Add {
            title,
            id,
            after,
            description,
        } => add_task(source, output, &title, id.as_deref(), &after, description),
        TaskCommands::List { status } => list_tasks(source, output, status.as_deref()),
        TaskCommands::Show { id } => show_task(source, output, &id),
        TaskCommands::Start { id } => start_task(source, output, &id),
        TaskCommands::Review { id } => {
            transition(source, output, &id, "Submitted for review", Task::submit_for_review)
        }
        TaskCommands::Done { id } => transition(source, output, &id, "Completed", Task::complete),
        TaskCommands::Reopen { id } => transition(source, output, &id, "Reopened", Task::reopen),
        TaskCommands::Rm { id } => remove_task(source, output, &id),
    }
}

fn add_task(
    source: &Source,
    output: &Output,
    title: &str,
    id: Option<&str>,
    after: &[String],
    description: Option<String>,
) -> Result<()> {
    let store = source.store()?;

    let task_id = match id {
        Some(raw) => parse_id(raw)?,
        None => TaskId::generate(title, Utc::now()),
    };
    let prerequisites = after
        .iter()
        .map(|raw| parse_id(raw))
        .collect::<Result<Vec<_>>>()?;

    let mut task = Task::new(task_id.clone(), title);
    if let Some(description) = description {
        task.set_description(description);
    }

    let task = store.mutate(|tasks| {
        if tasks.iter().any(|t| t.id == task_id) {
            anyhow::bail!("Task already exists: {}", task_id);
        }
        tasks.push(task);

        let idx = tasks.len() - 1;
        for prerequisite in &prerequisites {
            DependencyGraph::new(tasks.as_slice())
                .validate_new_dependency(&task_id, prerequisite)?;
            tasks[idx].add_dependency(prerequisite.clone());
        }

        Ok(tasks[idx].clone())
    })?;

    output.verbose_ctx(
        "task",
        &format!("Added {} with {} prerequisite(s)", task.id, task.dependencies.len()),
    );

    if output.is_json() {
        output.data(&task);
    } else {
        output.success(&format!("Created task {}: {}", task.id, task.title));
    }

    Ok(())
}

fn list_tasks(source: &Source, output: &Output, status: Option<&str>) -> Result<()> {
    let status: Option<TaskStatus> = status.map(str::parse::<TaskStatus>).transpose()?;
    let tasks = source.load(output)?;
    let graph = DependencyGraph::new(&tasks);

    let filtered: Vec<&Task> = tasks
        .iter()
        .filter(|t| status.map(|s| t.status == s).unwrap_or(true))
        .collect();

    if output.is_json() {
        let items: Vec<_> = filtered
            .iter()
            .map(|t| {
                serde_json::json!({
                    "id": t.id,
                    "title": t.title,
                    "status": t.status,
                    "dependencies": t.dependencies,
                    "startable": graph.is_startable(t),
                })
            })
            .collect();
        output.data(&items);
    } else if filtered.is_empty() {
        println!("No tasks found.");
    } else {
        println!("{:<20} {:<16} TITLE", "ID", "STATUS");
        println!("{}", "-".repeat(60));
        for task in filtered {
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

fn show_task(source: &Source, output: &Output, id: &str) -> Result<()> {
    let id = parse_id(id)?;
    let tasks = source.load(output)?;
    let graph = DependencyGraph::new(&tasks);
    let task = find(&tasks, &id)?;

    let blocks: Vec<&TaskId> = graph.blocked_by(&id).into_iter().map(|t| &t.id).collect();
    let startable = graph.is_startable(task);

    if output.is_json() {
        let dependencies: Vec<_> = task
            .dependencies
            .iter()
            .map(|dep_id| {
                serde_json::json!({
                    "id": dep_id,
                    "status": graph.status_of(dep_id),
                })
            })
            .collect();

        output.data(&serde_json::json!({
            "id": task.id,
            "title": task.title,
            "status": task.status,
            "description": task.description,
            "dependencies": dependencies,
            "blocks": blocks,
            "startable": startable,
            "created_at": task.created_at,
            "updated_at": task.updated_at,
            "completed_at": task.completed_at,
        }));
        return Ok(());
    }

    println!("{} {}", task.status.marker(), task.title);
    println!("ID:      {}", task.id);
    println!("Status:  {}", task.status);
    println!("Created: {}", task.created_at.format("%Y-%m-%d %H:%M"));
    if let Some(completed_at) = task.completed_at {
        println!("Done:    {}", completed_at.format("%Y-%m-%d %H:%M"));
    }

    if let Some(description) = &task.description {
        println!();
        println!("{}", description);
    }

    if !task.dependencies.is_empty() {
        println!();
        println!("Depends on:");
        for dep_id in &task.dependencies {
            match graph.status_of(dep_id) {
                Some(status) => println!("  {} {} ({})", status.marker(), dep_id, status),
                None => println!("  [!] {} (missing)", dep_id),
            }
        }
    }

    if !blocks.is_empty() {
        println!();
        println!("Blocks:");
        for blocked_id in &blocks {
            println!("  {}", blocked_id);
        }
    }

    println!();
    println!("Startable: {}", if startable { "yes" } else { "no" });

    Ok(())
}

fn start_task(source: &Source, output: &Output, id: &str) -> Result<()> {
    let id = parse_id(id)?;
    let store = source.store()?;

    store.mutate(|tasks| {
        let unmet: Vec<String> = {
            let graph = DependencyGraph::new(tasks.as_slice());
            let task = find(tasks.as_slice(), &id)?;
            graph
                .unmet_dependencies(task)
                .into_iter()
                .map(|dep_id| dep_id.to_string())
                .collect()
        };
        if !unmet.is_empty() {
            anyhow::bail!("Cannot start {}: waiting on {}", id, unmet.join(", "));
        }

        find_mut(tasks, &id)?.start()?;
        Ok(())
    })?;

    output.verbose_ctx("task", &format!("{} moved to in_progress", id));
    output.success(&format!("Started {}", id));
    Ok(())
}

fn transition(
    source: &Source,
    output: &Output,
    id: &str,
    verb: &str,
    apply: fn(&mut Task) -> Result<(), crate::domain::TaskError>,
) -> Result<()> {
    let id = parse_id(id)?;
    let store = source.store()?;

    let status = store.mutate(|tasks| {
        let task = find_mut(tasks, &id)?;
        apply(task)?;
        Ok(task.status)
    })?;

    output.verbose_ctx("task", &format!("{} moved to {}", id, status));
    output.success(&format!("{} {}", verb, id));
    Ok(())
}

fn remove_task(source: &Source, output: &Output, id: &str) -> Result<()> {
    let id = parse_id(id)?;
    let store = source.store()?;

    if !store.remove(&id)? {
        return Err(crate::domain::GraphError::TaskNotFound(id).into());
    }

    output.success(&format!("Removed task {}", id));
    Ok(())
}
