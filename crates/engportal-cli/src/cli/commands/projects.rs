use anyhow::{Context, Result};
use engportal_core::Portal;

use super::require_session;

pub async fn list(portal: &Portal) -> Result<()> {
    require_session(portal).await?;
    let projects = portal.api.projects().await.context("load projects")?;

    if projects.is_empty() {
        println!("No projects assigned.");
        return Ok(());
    }
    for project in projects {
        let scope = if project.scope_of_work.trim().is_empty() {
            "-"
        } else {
            project.scope_of_work.trim()
        };
        println!("{}  {}  {}", project.id, project.name, scope);
    }
    Ok(())
}
