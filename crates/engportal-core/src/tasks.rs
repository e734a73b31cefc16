//! Daily and monthly task entries behind one interface.
//!
//! The two kinds differ only in their endpoint and in the granularity of the
//! period a listing is filtered by, so both are driven by [`TaskKind`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use engportal_types::{NewTask, Task, TaskDraft};
use futures_util::future::join_all;

use crate::api::EngineerApi;
use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Daily,
    Monthly,
}

impl TaskKind {
    /// Path segment of the kind's collection endpoint.
    pub fn collection(self) -> &'static str {
        match self {
            TaskKind::Daily => "daily-tasks",
            TaskKind::Monthly => "monthly-tasks",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TaskKind::Daily => "daily",
            TaskKind::Monthly => "monthly",
        }
    }

    pub fn all() -> &'static [TaskKind] {
        &[TaskKind::Daily, TaskKind::Monthly]
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TaskKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(TaskKind::Daily),
            "monthly" => Ok(TaskKind::Monthly),
            other => Err(format!("unknown task kind '{other}' (expected daily or monthly)")),
        }
    }
}

/// The calendar window a listing is filtered by: a day for daily tasks, a
/// month for monthly ones. All dates are UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Day(NaiveDate),
    Month { year: i32, month: u32 },
}

impl Period {
    /// Period of `kind` that contains `date`.
    pub fn containing(kind: TaskKind, date: NaiveDate) -> Self {
        match kind {
            TaskKind::Daily => Period::Day(date),
            TaskKind::Monthly => Period::Month {
                year: date.year(),
                month: date.month(),
            },
        }
    }

    /// Today (daily) or this month (monthly).
    pub fn current(kind: TaskKind) -> Self {
        Self::containing(kind, Utc::now().date_naive())
    }

    /// Parses `YYYY-MM-DD` for daily or `YYYY-MM` for monthly.
    ///
    /// # Errors
    /// Returns a `Validation` error naming the expected format.
    pub fn parse(kind: TaskKind, text: &str) -> Result<Self, ApiError> {
        let text = text.trim();
        match kind {
            TaskKind::Daily => NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .map(Period::Day)
                .ok_or_else(|| {
                    ApiError::validation(format!("Invalid date '{text}', expected YYYY-MM-DD"))
                }),
            TaskKind::Monthly => NaiveDate::parse_from_str(&format!("{text}-01"), "%Y-%m-%d")
                .ok()
                .map(|first| Self::containing(kind, first))
                .ok_or_else(|| {
                    ApiError::validation(format!("Invalid month '{text}', expected YYYY-MM"))
                }),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        match *self {
            Period::Day(day) => day == date,
            Period::Month { year, month } => date.year() == year && date.month() == month,
        }
    }

    /// Human form used in listings, e.g. "May 2024" or "2024-05-03".
    pub fn describe(&self) -> String {
        match *self {
            Period::Day(day) => day.format("%Y-%m-%d").to_string(),
            Period::Month { year, month } => NaiveDate::from_ymd_opt(year, month, 1)
                .map_or_else(|| self.to_string(), |d| d.format("%B %Y").to_string()),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Day(day) => write!(f, "{}", day.format("%Y-%m-%d")),
            Period::Month { year, month } => write!(f, "{year:04}-{month:02}"),
        }
    }
}

/// Calendar day (UTC) of a task's date as sent by the service.
///
/// Accepts RFC 3339 timestamps, naive timestamps and bare dates.
pub fn task_day(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc).date_naive());
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(ts.date());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Tasks whose date falls inside `period`. Undated or unparseable entries
/// never match.
pub fn filter_by_period(tasks: Vec<Task>, period: &Period) -> Vec<Task> {
    tasks
        .into_iter()
        .filter(|task| task_day(&task.date).is_some_and(|day| period.contains(day)))
        .collect()
}

/// Outcome of a batch submission. Entries that were created stay created
/// even when siblings failed.
#[derive(Debug)]
pub struct BatchReport {
    pub kind: TaskKind,
    pub attempted: usize,
    pub created: usize,
    pub failures: Vec<ApiError>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// One-line summary for the user.
    pub fn message(&self) -> String {
        match self.failures.first() {
            None => format!(
                "{} {} task(s) added successfully!",
                self.created,
                self.kind.label()
            ),
            Some(first) if self.created == 0 => first.message.clone(),
            Some(first) => format!(
                "Added {} of {} {} task(s); {} failed: {}",
                self.created,
                self.attempted,
                self.kind.label(),
                self.failures.len(),
                first.message
            ),
        }
    }
}

/// Fetch, create, delete and filter for either task kind.
#[derive(Clone)]
pub struct TaskBoard {
    api: EngineerApi,
}

impl TaskBoard {
    pub fn new(api: EngineerApi) -> Self {
        Self { api }
    }

    /// # Errors
    /// See [`crate::gateway::Gateway::request`].
    pub async fn fetch(&self, kind: TaskKind, project_id: &str) -> Result<Vec<Task>, ApiError> {
        self.api.tasks(kind, project_id).await
    }

    /// # Errors
    /// See [`crate::gateway::Gateway::request`].
    pub async fn fetch_for_period(
        &self,
        kind: TaskKind,
        project_id: &str,
        period: &Period,
    ) -> Result<Vec<Task>, ApiError> {
        let tasks = self.fetch(kind, project_id).await?;
        Ok(filter_by_period(tasks, period))
    }

    /// Submits every titled draft concurrently and waits for all of them.
    ///
    /// Blank-titled drafts are dropped. Nothing is sent when the date is
    /// missing or no draft has a title.
    ///
    /// # Errors
    /// Returns a `Validation` error before any request is made. Request
    /// failures are collected in the report instead.
    pub async fn create(
        &self,
        kind: TaskKind,
        project_id: &str,
        date: &str,
        drafts: &[TaskDraft],
    ) -> Result<BatchReport, ApiError> {
        let date = date.trim();
        if date.is_empty() {
            return Err(ApiError::validation("Please select a date"));
        }

        let entries: Vec<NewTask> = drafts
            .iter()
            .filter(|draft| draft.has_title())
            .map(|draft| NewTask {
                project_id: project_id.to_string(),
                title: draft.title.trim().to_string(),
                note: draft.note.trim().to_string(),
                date: date.to_string(),
            })
            .collect();
        if entries.is_empty() {
            return Err(ApiError::validation(
                "Please add at least one task with a title",
            ));
        }

        tracing::debug!(%kind, project_id, count = entries.len(), "submitting tasks");

        let results = join_all(entries.iter().map(|entry| self.api.create_task(kind, entry))).await;

        let attempted = results.len();
        let failures: Vec<ApiError> = results.into_iter().filter_map(Result::err).collect();
        Ok(BatchReport {
            kind,
            attempted,
            created: attempted - failures.len(),
            failures,
        })
    }

    /// # Errors
    /// See [`crate::gateway::Gateway::request`].
    pub async fn delete(&self, kind: TaskKind, task_id: &str) -> Result<(), ApiError> {
        self.api.delete_task(kind, task_id).await
    }
}
