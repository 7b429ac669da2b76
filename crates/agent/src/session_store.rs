use std::collections::HashMap;
use std::sync::Arc;

use skillgate_core::{Config, Result, SessionConfig, SessionError, SessionId};
use skillgate_providers::ChatMessage;
use skillgate_skills::{PermissionContext, SessionSkillState};
use tokio::sync::{Mutex, RwLock};

/// One conversation: its activation state, immutable permissions and history.
#[derive(Debug, Clone)]
pub struct SkillSession {
    id: SessionId,
    pub(crate) state: SessionSkillState,
    pub(crate) permissions: PermissionContext,
    pub(crate) history: Vec<ChatMessage>,
}

impl SkillSession {
    pub fn new(id: SessionId, state: SessionSkillState, permissions: PermissionContext) -> Self {
        Self { id, state, permissions, history: Vec::new() }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn state(&self) -> &SessionSkillState {
        &self.state
    }

    pub fn permissions(&self) -> &PermissionContext {
        &self.permissions
    }

    /// Conversation so far, system prompt first once a turn has run
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }
}

/// Handle to a session; holding the lock serializes that session's turns
pub type SessionHandle = Arc<Mutex<SkillSession>>;

/// Owns every live session, keyed by id.
///
/// The map lock is held only to insert, look up or remove a handle. Turns lock
/// the per-session mutex, so different sessions never contend.
#[derive(Debug)]
pub struct SessionStore {
    session: SessionConfig,
    default_permissions: PermissionContext,
    sessions: RwLock<HashMap<SessionId, SessionHandle>>,
}

impl SessionStore {
    pub fn new(session: SessionConfig, default_permissions: PermissionContext) -> Self {
        Self { session, default_permissions, sessions: RwLock::new(HashMap::new()) }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.session.clone(), PermissionContext::from_config(&config.permissions))
    }

    pub fn session_config(&self) -> &SessionConfig {
        &self.session
    }

    /// Open a session with the configured default permissions
    pub async fn open(&self, id: SessionId) -> Result<SessionHandle> {
        let permissions = self.default_permissions.clone();
        self.open_with(id, permissions).await
    }

    /// Open a session with its own permission context.
    ///
    /// Fails if the id is already open or the configured transition settings
    /// are invalid, such as a FIFO capacity of zero.
    pub async fn open_with(&self, id: SessionId, permissions: PermissionContext) -> Result<SessionHandle> {
        let state = SessionSkillState::from_config(&self.session)?;

        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&id) {
            return Err(SessionError::AlreadyExists(id.to_string()).into());
        }

        let handle = Arc::new(Mutex::new(SkillSession::new(id.clone(), state, permissions)));
        sessions.insert(id.clone(), Arc::clone(&handle));
        tracing::info!(session = %id, mode = %self.session.mode, "session opened");
        Ok(handle)
    }

    pub async fn get(&self, id: &SessionId) -> Option<SessionHandle> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Look up a session or fail with [`SessionError::NotFound`]
    pub async fn require(&self, id: &SessionId) -> Result<SessionHandle> {
        self.get(id).await.ok_or_else(|| SessionError::NotFound(id.to_string()).into())
    }

    /// Drop a session. A turn still holding its handle finishes normally.
    pub async fn close(&self, id: &SessionId) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            tracing::info!(session = %id, "session closed");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Open session ids, sorted
    pub async fn ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = self.sessions.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(SessionConfig::default(), PermissionContext::none())
    }
}
