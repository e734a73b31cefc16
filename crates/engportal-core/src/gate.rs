//! Authentication gate.
//!
//! Decides whether the engineer can reach the protected surface. The state
//! starts at `Initializing`, settles after [`AuthGate::initialize`], and
//! moves between `Unauthenticated` and `Authenticated` on login, logout and
//! session expiry. There is no terminal state.

use std::sync::Arc;

use anyhow::Result;
use engportal_types::{Credentials, Identity};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::api::EngineerApi;
use crate::error::ApiErrorKind;
use crate::prober::Prober;
use crate::session::{SessionEvent, SessionStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Initializing,
    Unauthenticated { server_online: bool },
    Authenticated { identity: Identity },
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated { .. })
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            AuthState::Authenticated { identity } => Some(identity),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct AuthGate {
    api: EngineerApi,
    prober: Prober,
    state: Arc<watch::Sender<AuthState>>,
}

impl AuthGate {
    pub fn new(api: EngineerApi, prober: Prober) -> Self {
        let (state, _) = watch::channel(AuthState::Initializing);
        Self {
            api,
            prober,
            state: Arc::new(state),
        }
    }

    fn store(&self) -> &SessionStore {
        self.api.gateway().session()
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    fn set(&self, next: AuthState) {
        self.state.send_replace(next);
    }

    fn server_online(&self) -> bool {
        match &*self.state.borrow() {
            AuthState::Unauthenticated { server_online } => *server_online,
            _ => true,
        }
    }

    /// Probes the server and loads the stored session concurrently.
    ///
    /// Authenticated only if both succeed. A stored session is kept when the
    /// server is offline so a later start can resume it.
    pub async fn initialize(&self) -> AuthState {
        self.set(AuthState::Initializing);

        let store = self.store().clone();
        let (server_online, session) =
            tokio::join!(self.prober.probe(), async move { store.load() });

        let next = match session {
            Some(session) if server_online => AuthState::Authenticated {
                identity: session.identity,
            },
            Some(_) => {
                tracing::info!("server offline; stored session kept but not used");
                AuthState::Unauthenticated { server_online }
            }
            None => AuthState::Unauthenticated { server_online },
        };
        self.set(next.clone());
        next
    }

    /// Logs in and persists the session.
    ///
    /// # Errors
    /// Returns the API error (downcastable to [`crate::ApiError`]) or a
    /// storage error. The state is left unchanged on failure.
    pub async fn login(&self, credentials: &Credentials) -> Result<Identity> {
        let session = self.api.login(credentials).await?;
        self.store().save(&session)?;

        tracing::info!(engineer = %session.identity.id, "logged in");
        self.set(AuthState::Authenticated {
            identity: session.identity.clone(),
        });
        Ok(session.identity)
    }

    /// Notifies the server (best-effort), then always clears the session.
    /// Returns whether a session was present.
    ///
    /// # Errors
    /// Returns an error only if the stored session cannot be removed.
    pub async fn logout(&self) -> Result<bool> {
        let mut server_online = self.server_online();
        if self.store().ticket().is_some() {
            match self.api.logout().await {
                Ok(()) => server_online = true,
                Err(e) => {
                    tracing::warn!("logout request failed: {e}");
                    server_online = e.kind != ApiErrorKind::Unreachable;
                }
            }
        }

        let had_session = self.store().clear()?;
        tracing::info!(had_session, "logged out");
        self.set(AuthState::Unauthenticated { server_online });
        Ok(had_session)
    }

    /// Applies one session event to the gate state.
    pub fn handle_event(&self, event: SessionEvent) {
        if event == SessionEvent::Expired {
            // A 401 means the server answered.
            self.set(AuthState::Unauthenticated {
                server_online: true,
            });
        }
    }

    /// Follows session events in the background until aborted.
    pub fn follow_session(&self) -> JoinHandle<()> {
        let mut events = self.store().subscribe();
        let gate = self.clone();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => gate.handle_event(event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "session events lagged");
                        // Missed events may include an expiry; re-read the store.
                        if gate.state().is_authenticated() && gate.store().load().is_none() {
                            gate.handle_event(SessionEvent::Expired);
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}
