//! Dashboard counters across all assigned projects.

use engportal_types::{Task, TaskStatus};
use futures_util::future::join_all;

use crate::api::EngineerApi;
use crate::error::ApiError;
use crate::tasks::TaskKind;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_projects: usize,
    /// Tasks awaiting review
    pub pending: usize,
    /// Tasks approved by a supervisor
    pub completed: usize,
    /// All daily and monthly tasks
    pub total: usize,
}

impl DashboardStats {
    fn add_tasks(&mut self, tasks: &[Task]) {
        self.total += tasks.len();
        for task in tasks {
            match task.status {
                TaskStatus::Pending => self.pending += 1,
                TaskStatus::Done => self.completed += 1,
                TaskStatus::Failed => {}
            }
        }
    }

    /// Loads projects, then both task kinds for every project concurrently.
    ///
    /// A project whose tasks fail to load contributes nothing to the task
    /// counters.
    ///
    /// # Errors
    /// Fails if the project list cannot be loaded, or if any call comes back
    /// 401 (the session is gone, so the partial numbers are meaningless).
    pub async fn collect(api: &EngineerApi) -> Result<Self, ApiError> {
        let projects = api.projects().await?;
        let mut stats = DashboardStats {
            total_projects: projects.len(),
            ..Self::default()
        };

        let per_project = join_all(projects.iter().map(|project| async move {
            let (daily, monthly) = tokio::join!(
                api.tasks(TaskKind::Daily, &project.id),
                api.tasks(TaskKind::Monthly, &project.id)
            );
            (project.id.as_str(), daily, monthly)
        }))
        .await;

        for (project_id, daily, monthly) in per_project {
            for result in [daily, monthly] {
                match result {
                    Ok(tasks) => stats.add_tasks(&tasks),
                    Err(e) if e.is_unauthorized() => return Err(e),
                    Err(e) => {
                        tracing::warn!(project_id, "skipping tasks in stats: {e}");
                    }
                }
            }
        }

        Ok(stats)
    }
}
