//! Shared data model for the engineer portal.
//!
//! These are plain serde types exchanged with the remote service and
//! persisted by the session store. They carry no behavior beyond display
//! helpers.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// The authenticated engineer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

impl Identity {
    /// Name if present, otherwise email, otherwise the raw id.
    pub fn display_name(&self) -> &str {
        [self.name.as_str(), self.email.as_str()]
            .into_iter()
            .map(str::trim)
            .find(|s| !s.is_empty())
            .unwrap_or(&self.id)
    }
}

/// Bearer token plus the identity it belongs to.
///
/// Token and identity always travel together; there is no way to build a
/// session with only one of them.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub identity: Identity,
}

impl Session {
    pub fn new(token: impl Into<String>, identity: Identity) -> Self {
        Self {
            token: token.into(),
            identity,
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &mask_token(&self.token))
            .field("identity", &self.identity)
            .finish()
    }
}

/// Returns a masked version of a token for display (first 12 chars + ...).
pub fn mask_token(token: &str) -> String {
    if token.len() <= 16 || !token.is_char_boundary(12) {
        return "***".to_string();
    }
    format!("{}...", &token[..12])
}

/// Login request body.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// A project assigned to the engineer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub scope_of_work: String,
}

/// Supervisor review outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Done,
    Failed,
    /// Awaiting review. Unknown values from the service land here too.
    #[default]
    #[serde(other)]
    Pending,
}

/// Reads a missing or `null` status as pending.
fn status_or_pending<'de, D>(deserializer: D) -> Result<TaskStatus, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<TaskStatus>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl TaskStatus {
    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending Review",
            TaskStatus::Done => "Approved",
            TaskStatus::Failed => "Rejected",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Who reviewed a task. The service sends either a bare id or a populated
/// profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReviewerRef {
    Id(String),
    Profile {
        #[serde(default, alias = "_id")]
        id: Option<String>,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        email: Option<String>,
    },
}

impl ReviewerRef {
    pub fn display_name(&self) -> Option<&str> {
        match self {
            ReviewerRef::Id(_) => None,
            ReviewerRef::Profile { name, email, .. } => name
                .as_deref()
                .or(email.as_deref())
                .map(str::trim)
                .filter(|s| !s.is_empty()),
        }
    }
}

/// A daily or monthly task entry as stored by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub note: String,
    /// ISO-8601 date or timestamp, as sent by the service.
    #[serde(default)]
    pub date: String,
    #[serde(default, deserialize_with = "status_or_pending")]
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supervisor_note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<ReviewerRef>,
}

/// One row of a batch submission before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub note: String,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            note: note.into(),
        }
    }

    /// Drafts with a blank title are dropped before submission.
    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty()
    }
}

/// Creation body for `POST /engineer/{daily,monthly}-tasks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub project_id: String,
    pub title: String,
    pub note: String,
    pub date: String,
}
