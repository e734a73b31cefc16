//! Typed wrappers for the engineer endpoints.

use engportal_types::{Credentials, Identity, NewTask, Project, Session, Task};
use serde::Deserialize;
use serde::de::IgnoredAny;
use serde_json::Value;

use crate::error::{ApiError, ApiErrorKind};
use crate::gateway::Gateway;
use crate::session::identity_from_token;
use crate::tasks::TaskKind;

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default, alias = "user", alias = "identity")]
    engineer: Option<Value>,
}

impl LoginResponse {
    fn into_session(self) -> Result<Session, ApiError> {
        let token = self
            .token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                ApiError::new(
                    ApiErrorKind::RemoteRejection,
                    "Login response did not include a token",
                )
            })?;

        let identity = self
            .engineer
            .and_then(|value| serde_json::from_value::<Identity>(value).ok())
            .or_else(|| identity_from_token(&token))
            .ok_or_else(|| {
                ApiError::new(
                    ApiErrorKind::RemoteRejection,
                    "Login response did not include engineer details",
                )
            })?;

        Ok(Session::new(token, identity))
    }
}

/// Percent-encodes an id for use as a single path segment.
fn segment(id: &str) -> String {
    url::form_urlencoded::byte_serialize(id.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Engineer endpoints of the portal service.
#[derive(Clone)]
pub struct EngineerApi {
    gateway: Gateway,
}

impl EngineerApi {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// Exchanges credentials for a session. Does not persist it.
    ///
    /// # Errors
    /// Gateway errors, or `RemoteRejection` if the response lacks a token or
    /// any way to recover the engineer identity.
    pub async fn login(&self, credentials: &Credentials) -> Result<Session, ApiError> {
        let response: LoginResponse = self
            .gateway
            .post("/engineer/login", Some(credentials))
            .await?;
        response.into_session()
    }

    /// # Errors
    /// See [`Gateway::request`].
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.gateway
            .post::<IgnoredAny, ()>("/engineer/logout", None)
            .await?;
        Ok(())
    }

    /// # Errors
    /// See [`Gateway::request`].
    pub async fn projects(&self) -> Result<Vec<Project>, ApiError> {
        self.gateway.get("/engineer/projects").await
    }

    /// Finds one assigned project. The service has no single-project endpoint.
    ///
    /// # Errors
    /// See [`Gateway::request`].
    pub async fn project(&self, project_id: &str) -> Result<Option<Project>, ApiError> {
        let projects = self.projects().await?;
        Ok(projects.into_iter().find(|p| p.id == project_id))
    }

    /// # Errors
    /// See [`Gateway::request`].
    pub async fn tasks(&self, kind: TaskKind, project_id: &str) -> Result<Vec<Task>, ApiError> {
        let path = format!("/engineer/{}/{}", kind.collection(), segment(project_id));
        self.gateway.get(&path).await
    }

    /// # Errors
    /// See [`Gateway::request`].
    pub async fn create_task(&self, kind: TaskKind, task: &NewTask) -> Result<(), ApiError> {
        let path = format!("/engineer/{}", kind.collection());
        self.gateway.post::<IgnoredAny, _>(&path, Some(task)).await?;
        Ok(())
    }

    /// # Errors
    /// See [`Gateway::request`].
    pub async fn delete_task(&self, kind: TaskKind, task_id: &str) -> Result<(), ApiError> {
        let path = format!("/engineer/{}/{}", kind.collection(), segment(task_id));
        self.gateway.delete::<IgnoredAny>(&path).await?;
        Ok(())
    }
}
