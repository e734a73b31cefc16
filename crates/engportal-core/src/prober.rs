//! Server reachability probe.
//!
//! Best-effort liveness signal used to decide whether login should be
//! attempted. `true` does not promise that later calls succeed.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::StatusCode;

#[derive(Clone)]
pub struct Prober {
    http: reqwest::Client,
    health_url: String,
}

impl Prober {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(health_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build probe client")?;
        Ok(Self {
            http,
            health_url: health_url.into(),
        })
    }

    pub fn health_url(&self) -> &str {
        &self.health_url
    }

    /// Returns whether the health endpoint answered 200 within the timeout.
    ///
    /// Never fails: timeouts, DNS and connection errors, and any non-200
    /// status all read as `false`.
    pub async fn probe(&self) -> bool {
        match self.http.get(&self.health_url).send().await {
            Ok(response) if response.status() == StatusCode::OK => true,
            Ok(response) => {
                tracing::debug!(status = response.status().as_u16(), "health probe failed");
                false
            }
            Err(e) => {
                tracing::debug!("health probe failed: {e}");
                false
            }
        }
    }
}
