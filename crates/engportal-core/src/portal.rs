//! Wiring of the client components around one session store.

use anyhow::Result;

use crate::api::EngineerApi;
use crate::config::Config;
use crate::gate::AuthGate;
use crate::gateway::Gateway;
use crate::prober::Prober;
use crate::session::SessionStore;
use crate::tasks::TaskBoard;

/// Everything a front end needs, sharing one [`SessionStore`].
#[derive(Clone)]
pub struct Portal {
    pub store: SessionStore,
    pub api: EngineerApi,
    pub prober: Prober,
    pub board: TaskBoard,
    pub gate: AuthGate,
}

impl Portal {
    /// # Errors
    /// Returns an error if the configured URLs are invalid.
    pub fn from_config(config: &Config, store: SessionStore) -> Result<Self> {
        let gateway = Gateway::configure(&config.base_url, config.timeout(), store.clone())?;
        let prober = Prober::new(config.health_url.clone(), config.probe_timeout())?;
        let api = EngineerApi::new(gateway);

        Ok(Self {
            board: TaskBoard::new(api.clone()),
            gate: AuthGate::new(api.clone(), prober.clone()),
            store,
            api,
            prober,
        })
    }
}
