use anyhow::{Context, Result};
use engportal_core::Portal;
use engportal_core::stats::DashboardStats;

use super::require_session;

pub async fn show(portal: &Portal) -> Result<()> {
    let identity = require_session(portal).await?;
    let stats = DashboardStats::collect(&portal.api)
        .await
        .context("load dashboard")?;

    println!("Welcome back, {}", identity.display_name());
    println!("Projects:  {}", stats.total_projects);
    println!("Tasks:     {}", stats.total);
    println!("Pending:   {}", stats.pending);
    println!("Approved:  {}", stats.completed);
    Ok(())
}
