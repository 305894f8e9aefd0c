//! Directory of live sessions keyed by identifier.

use std::{collections::HashMap, str::FromStr};

use lane_defence_core::{BuildingKind, JoinError, PlacementError, SessionId, SessionSnapshot};
use rand::Rng;
use thiserror::Error;
use tokio::sync::{broadcast, oneshot, RwLock};
use tracing::{debug, info};

use crate::{
    config::{ConfigError, ServerConfig},
    notification::Notification,
    session::{self, Request, SessionHandle},
};

const SESSION_ID_LENGTH: usize = 7;
const SESSION_ID_RADIX: u32 = 36;

/// Failures surfaced by [`Registry`] operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No session is registered under the identifier.
    #[error("session {0} does not exist")]
    NotFound(SessionId),
    /// The session's actor stopped before answering.
    #[error("session {0} is no longer running")]
    SessionClosed(SessionId),
    /// The session refused the join request.
    #[error("join refused: {0}")]
    Join(#[from] JoinError),
    /// The session refused the placement request.
    #[error("placement refused: {0}")]
    Placement(#[from] PlacementError),
}

/// Owns every live session and routes requests to their actors.
///
/// Lookups share a read lock; creation and removal take the write lock.
/// Each session processes its requests strictly one at a time on its own
/// task, so different sessions never contend with each other.
#[derive(Debug)]
pub struct Registry {
    config: ServerConfig,
    sessions: RwLock<HashMap<SessionId, SessionHandle>>,
}

impl Registry {
    /// Creates an empty registry whose sessions share `config`.
    ///
    /// Fails when the config could not host a session, such as one with a
    /// zero channel capacity or cadence.
    pub fn new(config: ServerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            sessions: RwLock::new(HashMap::new()),
        })
    }

    /// Configuration handed to every new session.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Reports whether no session is live.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Starts a session seated with its owner and returns its identifier.
    pub async fn create(&self, owner: &str) -> Result<SessionId, RegistryError> {
        let id = {
            let mut sessions = self.sessions.write().await;
            let id = loop {
                let candidate = generate_session_id();
                if !sessions.contains_key(&candidate) {
                    break candidate;
                }
            };
            let handle = session::spawn(id.clone(), &self.config);
            let _ = sessions.insert(id.clone(), handle);
            id
        };
        info!(session = %id, %owner, "session created");

        let _ = self.join(&id, owner).await?;
        Ok(id)
    }

    /// Seats a player or reconnects a seated one, returning the current state.
    pub async fn join(
        &self,
        id: &SessionId,
        username: &str,
    ) -> Result<SessionSnapshot, RegistryError> {
        let outcome = self
            .request(id, |reply| Request::Join {
                username: username.to_owned(),
                reply,
            })
            .await?;
        Ok(outcome?)
    }

    /// Places a building for the named player.
    ///
    /// `kind` is the catalog identifier such as `"barracks"`.
    pub async fn place_building(
        &self,
        id: &SessionId,
        username: &str,
        cell: u16,
        kind: &str,
    ) -> Result<SessionSnapshot, RegistryError> {
        let kind = BuildingKind::from_str(kind).map_err(|_| PlacementError::UnknownBuilding)?;
        let outcome = self
            .request(id, |reply| Request::PlaceBuilding {
                username: username.to_owned(),
                cell,
                kind,
                reply,
            })
            .await?;
        Ok(outcome?)
    }

    /// Current state of a session without mutating it.
    pub async fn snapshot(&self, id: &SessionId) -> Result<SessionSnapshot, RegistryError> {
        self.request(id, |reply| Request::Snapshot { reply }).await
    }

    /// Subscribes to the notifications a session publishes from now on.
    pub async fn subscribe(
        &self,
        id: &SessionId,
    ) -> Result<broadcast::Receiver<Notification>, RegistryError> {
        let sessions = self.sessions.read().await;
        let handle = sessions
            .get(id)
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?;
        Ok(handle.notifications.subscribe())
    }

    /// Closes a session, cancels its timers and forgets it.
    pub async fn remove(&self, id: &SessionId) -> Result<(), RegistryError> {
        let handle = self
            .sessions
            .write()
            .await
            .remove(id)
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?;

        let (reply, acknowledged) = oneshot::channel();
        if handle.requests.send(Request::Close { reply }).await.is_ok() {
            let _ = acknowledged.await;
        }
        let SessionHandle { task, .. } = handle;
        if let Err(error) = task.await {
            debug!(session = %id, %error, "session task ended abnormally");
        }
        Ok(())
    }

    /// Tears down every session whose match has ended and returns how many were removed.
    ///
    /// Finished sessions stay queryable until removed; hosts call this on
    /// their own cadence.
    pub async fn remove_finished(&self) -> usize {
        let ids: Vec<SessionId> = self.sessions.read().await.keys().cloned().collect();

        let mut removed = 0;
        for id in ids {
            let finished = match self.snapshot(&id).await {
                Ok(snapshot) => snapshot.game_over,
                Err(RegistryError::SessionClosed(_)) => true,
                Err(_) => false,
            };
            if finished && self.remove(&id).await.is_ok() {
                removed += 1;
            }
        }
        if removed > 0 {
            info!(removed, "finished sessions removed");
        }
        removed
    }

    async fn request<T>(
        &self,
        id: &SessionId,
        build: impl FnOnce(oneshot::Sender<T>) -> Request,
    ) -> Result<T, RegistryError> {
        let requests = {
            let sessions = self.sessions.read().await;
            sessions
                .get(id)
                .map(|handle| handle.requests.clone())
                .ok_or_else(|| RegistryError::NotFound(id.clone()))?
        };

        let (reply, response) = oneshot::channel();
        requests
            .send(build(reply))
            .await
            .map_err(|_| RegistryError::SessionClosed(id.clone()))?;
        response
            .await
            .map_err(|_| RegistryError::SessionClosed(id.clone()))
    }
}

fn generate_session_id() -> SessionId {
    let mut rng = rand::thread_rng();
    let value: String = (0..SESSION_ID_LENGTH)
        .filter_map(|_| char::from_digit(rng.gen_range(0..SESSION_ID_RADIX), SESSION_ID_RADIX))
        .collect();
    SessionId::new(value)
}
