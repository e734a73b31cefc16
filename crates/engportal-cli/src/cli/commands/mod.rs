//! CLI command handlers.

pub mod auth;
pub mod config;
pub mod projects;
pub mod stats;
pub mod status;
pub mod tasks;

use anyhow::Result;
use engportal_core::Portal;
use engportal_core::gate::AuthState;
use engportal_types::Identity;

/// Runs the auth gate and returns the identity only when it lets the
/// engineer in. A stored session is not enough while the server is offline.
pub(crate) async fn require_session(portal: &Portal) -> Result<Identity> {
    match portal.gate.initialize().await {
        AuthState::Authenticated { identity } => Ok(identity),
        AuthState::Unauthenticated {
            server_online: false,
        } if portal.store.load().is_some() => {
            anyhow::bail!("Server is offline ({})", portal.prober.health_url())
        }
        AuthState::Unauthenticated { .. } | AuthState::Initializing => {
            anyhow::bail!("Not logged in. Run `engportal login` first.")
        }
    }
}
