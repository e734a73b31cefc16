//! Session storage.
//!
//! Persists the engineer's bearer token and identity in
//! `<base>/session.json` with restricted permissions (0600). Tokens are never
//! logged or displayed in full.
//!
//! The store is the only shared mutable state in the client. Every mutation
//! is a whole-session replace or clear, serialized by one lock. A generation
//! counter ties each outbound request to the session it was sent with, so a
//! burst of 401 responses tears the session down exactly once.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use engportal_types::{Identity, Session, mask_token};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::config::paths;

/// Capacity of the session event channel. Subscribers that lag just miss
/// intermediate events; the store itself stays authoritative.
const EVENT_CAPACITY: usize = 16;

/// Lifecycle notifications published by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A new session was saved (login).
    Saved,
    /// The session was cleared on request (logout).
    Cleared,
    /// The service rejected the session with 401; it has been torn down.
    Expired,
}

/// Raw blob storage underneath the session store.
pub trait SessionBackend: Send + Sync {
    /// Returns the stored blob, or `None` if nothing is stored.
    ///
    /// # Errors
    /// Returns an error if the storage exists but cannot be read.
    fn read(&self) -> Result<Option<String>>;

    /// Replaces the stored blob in one step.
    ///
    /// # Errors
    /// Returns an error if the blob cannot be written.
    fn write(&self, contents: &str) -> Result<()>;

    /// Removes the stored blob. Removing nothing is not an error.
    ///
    /// # Errors
    /// Returns an error if existing storage cannot be removed.
    fn remove(&self) -> Result<()>;
}

/// Session file on disk.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backend at the default location under the portal home.
    pub fn default_location() -> Self {
        Self::new(paths::session_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionBackend for FileBackend {
    fn read(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to read session from {}", self.path.display())),
        }
    }

    fn write(&self, contents: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        // Write next to the target and rename so readers never see half a session.
        let tmp_path = self.path.with_extension("json.tmp");

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&tmp_path)
                .with_context(|| format!("Failed to open {} for writing", tmp_path.display()))?;
            file.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", tmp_path.display()))?;
        }

        #[cfg(not(unix))]
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&tmp_path)
                .with_context(|| format!("Failed to open {} for writing", tmp_path.display()))?;
            file.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", tmp_path.display()))?;
        }

        fs::rename(&tmp_path, &self.path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                self.path.display()
            )
        })
    }

    fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to remove session at {}", self.path.display())),
        }
    }
}

/// In-process backend, used by tests and embedders without a filesystem.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    contents: Mutex<Option<String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the backend with raw contents, valid or not.
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: Mutex::new(Some(contents.into())),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<String>> {
        self.contents.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionBackend for MemoryBackend {
    fn read(&self) -> Result<Option<String>> {
        Ok(self.slot().clone())
    }

    fn write(&self, contents: &str) -> Result<()> {
        *self.slot() = Some(contents.to_string());
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        *self.slot() = None;
        Ok(())
    }
}

/// On-disk shape: the two entries the portal has always used.
#[derive(Serialize)]
struct StoredSession<'a> {
    #[serde(rename = "engineerToken")]
    token: &'a str,
    #[serde(rename = "engineerInfo")]
    identity: &'a Identity,
}

/// Lenient read side of [`StoredSession`]; either entry may be missing or
/// malformed in a corrupt file.
#[derive(Deserialize)]
struct StoredEntries {
    #[serde(rename = "engineerToken", default)]
    token: Option<Value>,
    #[serde(rename = "engineerInfo", default)]
    identity: Option<Value>,
}

fn decode_session(raw: &str) -> Option<Session> {
    let entries: StoredEntries = serde_json::from_str(raw).ok()?;
    let token = entries
        .token?
        .as_str()
        .map(str::trim)
        .filter(|t| !t.is_empty())?
        .to_string();
    let identity = match entries.identity? {
        // Older writers stored the identity as a JSON-encoded string.
        Value::String(encoded) => serde_json::from_str::<Identity>(&encoded).ok()?,
        value => serde_json::from_value::<Identity>(value).ok()?,
    };
    Some(Session::new(token, identity))
}

/// Request-side view of the session: the token to attach and the
/// generation it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTicket {
    pub token: String,
    pub generation: u64,
}

struct Guard {
    generation: u64,
}

struct Inner {
    backend: Box<dyn SessionBackend>,
    guard: Mutex<Guard>,
    events: broadcast::Sender<SessionEvent>,
}

/// Shared handle to the persisted session. Cloning is cheap and every clone
/// sees the same state.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

impl SessionStore {
    pub fn new(backend: impl SessionBackend + 'static) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                backend: Box::new(backend),
                guard: Mutex::new(Guard { generation: 0 }),
                events,
            }),
        }
    }

    /// Store backed by `session.json` under the portal home.
    pub fn open_default() -> Self {
        Self::new(FileBackend::default_location())
    }

    /// Store backed by memory only.
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    fn lock(&self) -> MutexGuard<'_, Guard> {
        self.inner
            .guard
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribes to session lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.inner.events.send(event);
    }

    /// Persists token and identity together.
    ///
    /// # Errors
    /// Returns an error if the session cannot be serialized or written.
    pub fn save(&self, session: &Session) -> Result<()> {
        let contents = serde_json::to_string_pretty(&StoredSession {
            token: &session.token,
            identity: &session.identity,
        })
        .context("Failed to serialize session")?;

        {
            let mut guard = self.lock();
            self.inner.backend.write(&contents)?;
            guard.generation += 1;
        }

        tracing::debug!(
            token = %mask_token(&session.token),
            engineer = %session.identity.id,
            "session saved"
        );
        self.emit(SessionEvent::Saved);
        Ok(())
    }

    /// Returns the stored session, or `None` if absent or corrupt.
    ///
    /// Never fails: unreadable or malformed storage reads as "no session".
    pub fn load(&self) -> Option<Session> {
        let _guard = self.lock();
        self.load_locked()
    }

    fn load_locked(&self) -> Option<Session> {
        let raw = match self.inner.backend.read() {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("ignoring unreadable session: {e:#}");
                return None;
            }
        };

        let session = decode_session(&raw);
        if session.is_none() {
            tracing::warn!("ignoring corrupt session data");
        }
        session
    }

    /// Token to attach to the next request, tagged with its generation.
    pub fn ticket(&self) -> Option<SessionTicket> {
        let guard = self.lock();
        self.load_locked().map(|session| SessionTicket {
            token: session.token,
            generation: guard.generation,
        })
    }

    /// Removes the session. Returns whether one was present.
    ///
    /// # Errors
    /// Returns an error if existing storage cannot be removed.
    pub fn clear(&self) -> Result<bool> {
        let had_session = {
            let mut guard = self.lock();
            let had_session = self.load_locked().is_some();
            self.inner.backend.remove()?;
            guard.generation += 1;
            had_session
        };

        tracing::debug!(had_session, "session cleared");
        self.emit(SessionEvent::Cleared);
        Ok(had_session)
    }

    /// Tears down the session a 401 was received for.
    ///
    /// Only the first call for a given generation has any effect; later calls
    /// (sibling requests that also got 401, or a session that was already
    /// replaced) return `false` and do nothing.
    pub fn expire(&self, generation: u64) -> bool {
        {
            let mut guard = self.lock();
            if guard.generation != generation {
                return false;
            }
            if let Err(e) = self.inner.backend.remove() {
                tracing::warn!("failed to remove expired session: {e:#}");
            }
            guard.generation += 1;
        }

        tracing::info!("session expired; cleared stored credentials");
        self.emit(SessionEvent::Expired);
        true
    }
}

/// Decodes the engineer identity from a JWT's payload segment.
///
/// Used when the login response carries a token but no identity object.
pub fn identity_from_token(token: &str) -> Option<Identity> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return None;
    }
    let payload = parts[1].trim_end_matches('=');
    let decoded = URL_SAFE_NO_PAD.decode(payload).ok()?;
    serde_json::from_slice::<Identity>(&decoded).ok()
}
