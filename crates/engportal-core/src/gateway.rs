//! Single point of outbound communication with the portal service.
//!
//! Every request goes through [`Gateway::request`], which attaches the
//! current bearer token and handles a 401 by tearing down the session it was
//! sent with. Navigation is not the gateway's concern: teardown is announced
//! as [`SessionEvent::Expired`](crate::session::SessionEvent) on the store's
//! event channel.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::session::SessionStore;

/// HTTP client bound to the portal API base and the session store.
#[derive(Clone)]
pub struct Gateway {
    http: reqwest::Client,
    base_url: String,
    session: SessionStore,
}

impl Gateway {
    /// Builds a reusable client for `base_url` with a per-request `timeout`.
    ///
    /// # Errors
    /// Returns an error if `base_url` is not an absolute http(s) URL or the
    /// client cannot be built.
    pub fn configure(base_url: &str, timeout: Duration, session: SessionStore) -> Result<Self> {
        let parsed = url::Url::parse(base_url)
            .with_context(|| format!("Invalid API base URL: {base_url}"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("API base URL must be http(s): {base_url}");
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Issues one call and decodes the 2xx body as `T`.
    ///
    /// An empty 2xx body decodes as JSON `null`, so callers that do not care
    /// about the body can ask for `serde::de::IgnoredAny` or `Option<_>`.
    ///
    /// # Errors
    /// - `Unreachable` on connect failure or timeout (session untouched)
    /// - `Unauthorized` on 401 (session torn down, at most once)
    /// - `RemoteRejection` on any other non-2xx status
    /// - `Decode` if the body does not match `T`
    pub async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url(path);
        let ticket = self.session.ticket();

        let mut builder = self
            .http
            .request(method.clone(), &url)
            .header("accept", "application/json");
        if let Some(ticket) = &ticket {
            builder = builder.bearer_auth(&ticket.token);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        tracing::debug!(%method, path, authenticated = ticket.is_some(), "request");

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(&e))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::from_reqwest(&e))?;

        tracing::debug!(%method, path, status = status.as_u16(), "response");

        if status == StatusCode::UNAUTHORIZED {
            if let Some(ticket) = ticket
                && self.session.expire(ticket.generation)
            {
                tracing::info!(path, "401 received; session torn down");
            }
            return Err(ApiError::unauthorized(&text));
        }

        if !status.is_success() {
            return Err(ApiError::http_status(status.as_u16(), &text));
        }

        let payload = if text.trim().is_empty() {
            "null"
        } else {
            text.as_str()
        };
        serde_json::from_str(payload)
            .map_err(|e| ApiError::decode(format!("Failed to parse response from {path}: {e}")))
    }

    /// # Errors
    /// See [`Gateway::request`].
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request::<T, ()>(Method::GET, path, None).await
    }

    /// # Errors
    /// See [`Gateway::request`].
    pub async fn post<T, B>(&self, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, path, body).await
    }

    /// # Errors
    /// See [`Gateway::request`].
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request::<T, ()>(Method::DELETE, path, None).await
    }
}
