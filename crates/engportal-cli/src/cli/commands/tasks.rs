//! Task command handlers.

use anyhow::{Context, Result};
use engportal_core::Portal;
use engportal_core::tasks::{Period, TaskKind, task_day};
use engportal_types::{Task, TaskDraft};

use super::require_session;

/// Splits `title::note` into a draft; the note is optional.
fn parse_draft(raw: &str) -> TaskDraft {
    match raw.split_once("::") {
        Some((title, note)) => TaskDraft::new(title, note),
        None => TaskDraft::new(raw, ""),
    }
}

fn capitalized(kind: TaskKind) -> &'static str {
    match kind {
        TaskKind::Daily => "Daily",
        TaskKind::Monthly => "Monthly",
    }
}

fn print_task(task: &Task) {
    let date = task_day(&task.date).map_or_else(|| task.date.clone(), |d| d.to_string());
    println!("{}  {}  [{}]  {}", task.id, date, task.status, task.title);
    if !task.note.trim().is_empty() {
        println!("    note: {}", task.note.trim());
    }
    if let Some(feedback) = task
        .supervisor_note
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
    {
        println!("    supervisor: {feedback}");
    }
    if let Some(reviewer) = task.reviewed_by.as_ref().and_then(|r| r.display_name()) {
        println!("    reviewed by: {reviewer}");
    }
}

pub async fn list(
    portal: &Portal,
    kind: TaskKind,
    project_id: &str,
    period: Option<&str>,
) -> Result<()> {
    require_session(portal).await?;
    let period = match period {
        Some(text) => Period::parse(kind, text)?,
        None => Period::current(kind),
    };

    let project = portal
        .api
        .project(project_id)
        .await
        .context("load projects")?
        .with_context(|| format!("Project not found: {project_id}"))?;

    let tasks = portal
        .board
        .fetch_for_period(kind, project_id, &period)
        .await
        .with_context(|| format!("load {kind} tasks"))?;

    println!(
        "{} tasks for {} ({})",
        capitalized(kind),
        project.name,
        period.describe()
    );
    if tasks.is_empty() {
        println!("No {kind} tasks for {}.", period.describe());
        return Ok(());
    }
    for task in &tasks {
        print_task(task);
    }
    Ok(())
}

pub async fn add(
    portal: &Portal,
    kind: TaskKind,
    project_id: &str,
    date: Option<&str>,
    raw_tasks: &[String],
) -> Result<()> {
    require_session(portal).await?;
    let drafts: Vec<TaskDraft> = raw_tasks.iter().map(|raw| parse_draft(raw)).collect();

    let report = portal
        .board
        .create(kind, project_id, date.unwrap_or_default(), &drafts)
        .await?;

    if !report.is_success() {
        anyhow::bail!(report.message());
    }
    println!("{}", report.message());
    Ok(())
}

pub async fn delete(portal: &Portal, kind: TaskKind, task_id: &str) -> Result<()> {
    require_session(portal).await?;
    portal
        .board
        .delete(kind, task_id)
        .await
        .with_context(|| format!("delete {kind} task {task_id}"))?;
    println!("Deleted {kind} task {task_id}");
    Ok(())
}
