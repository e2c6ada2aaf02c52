use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{RwLock, watch};
use tracing::{debug, info, instrument, warn};

use super::storage::{FileStorage, KeyValueStore, StorageError};
use crate::client::{Authenticator, ClientError, TokenHandle};
use crate::config::Config;
use crate::model::Supervisor;

pub const AUTH_USER_KEY: &str = "authUser";
pub const AUTH_TOKEN_KEY: &str = "authToken";

const RECORD_VERSION: u32 = 1;

/// Durable form of the signed-in supervisor.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredSupervisor {
    version: u32,
    supervisor: Supervisor,
}

impl StoredSupervisor {
    fn parse(raw: &str) -> Option<Supervisor> {
        let record: StoredSupervisor = serde_json::from_str(raw).ok()?;
        let s = &record.supervisor;
        if record.version != RECORD_VERSION || s.username.trim().is_empty() {
            return None;
        }
        Some(record.supervisor)
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session is still being restored")]
    Hydrating,
    #[error("no supervisor is signed in")]
    Unauthenticated,
    #[error("authentication backend failed: {0}")]
    Authenticator(#[from] ClientError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Holds the single active supervisor for a client session.
pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
    authenticator: Arc<dyn Authenticator>,
    supervisor: RwLock<Option<Supervisor>>,
    token: TokenHandle,
    hydrating: watch::Sender<bool>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn KeyValueStore>, authenticator: Arc<dyn Authenticator>) -> Self {
        Self::with_token(storage, authenticator, Arc::new(RwLock::new(None)))
    }

    /// Share an existing token handle, e.g. the one an `ApiClient` reads.
    pub fn with_token(
        storage: Arc<dyn KeyValueStore>,
        authenticator: Arc<dyn Authenticator>,
        token: TokenHandle,
    ) -> Self {
        let (hydrating, _) = watch::channel(true);
        Self {
            storage,
            authenticator,
            supervisor: RwLock::new(None),
            token,
            hydrating,
        }
    }

    /// File-backed store at `SESSION_STORE_PATH`.
    pub fn from_config(
        config: &Config,
        authenticator: Arc<dyn Authenticator>,
        token: TokenHandle,
    ) -> Self {
        let storage = FileStorage::new(&config.session_store_path);
        Self::with_token(Arc::new(storage), authenticator, token)
    }

    /// Shared bearer token, for wiring into an `ApiClient`.
    pub fn token_handle(&self) -> TokenHandle {
        Arc::clone(&self.token)
    }

    pub fn is_hydrating(&self) -> bool {
        *self.hydrating.borrow()
    }

    pub async fn wait_until_hydrated(&self) {
        let mut rx = self.hydrating.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|hydrating| !*hydrating).await;
    }

    pub async fn supervisor(&self) -> Option<Supervisor> {
        self.supervisor.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.supervisor.read().await.is_some()
    }

    /// Gate for authenticated views.
    pub async fn require_supervisor(&self) -> Result<Supervisor, SessionError> {
        if self.is_hydrating() {
            return Err(SessionError::Hydrating);
        }
        self.supervisor().await.ok_or(SessionError::Unauthenticated)
    }

    /// Rebuild the session from durable storage. Runs once; later calls
    /// return the current supervisor without touching storage.
    #[instrument(skip(self))]
    pub async fn restore_from_storage(&self) -> Option<Supervisor> {
        if !self.is_hydrating() {
            return self.supervisor().await;
        }

        let restored = match self.storage.get(AUTH_USER_KEY) {
            Ok(Some(raw)) => {
                let parsed = StoredSupervisor::parse(&raw);
                if parsed.is_none() {
                    warn!("stored supervisor record is malformed, discarding");
                    self.forget_durable();
                }
                parsed
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "session storage unreadable, starting signed out");
                None
            }
        };
        let token = match &restored {
            Some(_) => self.storage.get(AUTH_TOKEN_KEY).unwrap_or_else(|e| {
                warn!(error = %e, "stored token unreadable");
                None
            }),
            None => None,
        };

        {
            let mut current = self.supervisor.write().await;
            if current.is_none() {
                if let Some(supervisor) = &restored {
                    info!(username = %supervisor.username, "session restored");
                    *current = Some(supervisor.clone());
                    *self.token.write().await = token;
                }
            }
        }

        self.hydrating.send_replace(false);
        debug!("hydration complete");
        self.supervisor().await
    }

    /// Returns `Ok(false)` for any credential mismatch. The session is only
    /// established once it has been written to durable storage.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<bool, SessionError> {
        let Some(authenticated) = self.authenticator.authenticate(username, password).await? else {
            info!("login rejected");
            return Ok(false);
        };

        let record = StoredSupervisor {
            version: RECORD_VERSION,
            supervisor: authenticated.supervisor.clone(),
        };
        let json = serde_json::to_string(&record).map_err(StorageError::from)?;
        if let Err(e) = self
            .storage
            .set(AUTH_USER_KEY, &json)
            .and_then(|_| self.storage.set(AUTH_TOKEN_KEY, &authenticated.token))
        {
            warn!(error = %e, "could not persist session");
            self.forget_durable();
            return Err(e.into());
        }

        *self.supervisor.write().await = Some(authenticated.supervisor);
        *self.token.write().await = Some(authenticated.token);
        info!("login successful");
        Ok(true)
    }

    /// Idempotent.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        let previous = self.supervisor.write().await.take();
        *self.token.write().await = None;
        self.forget_durable();
        if let Some(s) = previous {
            info!(username = %s.username, "logged out");
        }
    }

    fn forget_durable(&self) {
        for key in [AUTH_USER_KEY, AUTH_TOKEN_KEY] {
            if let Err(e) = self.storage.remove(key) {
                warn!(key, error = %e, "could not clear stored session key");
            }
        }
    }
}
