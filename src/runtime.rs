//! Runtime for chat sessions
//!
//! Each session runs its own `ConversationRuntime` task. Handlers talk to it
//! through the `SessionManager`, which owns the session map.

mod executor;

#[cfg(test)]
pub mod testing;

pub use executor::{Command, ConversationRuntime};

use crate::catalog::ModelCatalog;
use crate::generator::ResponseGenerator;
use crate::state_machine::{ConvContext, ConvState, Event, TransitionError};
use crate::store::{ConversationStore, Message};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};

/// Public metadata of a chat session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionInfo {
    pub id: String,
    pub title: Option<String>,
    /// Currently selected model
    pub model: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Session data shared between the runtime task and request handlers.
/// Only the runtime task writes to it.
#[derive(Debug)]
pub struct Session {
    pub info: SessionInfo,
    pub store: ConversationStore,
}

impl Session {
    fn new(id: String, model: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            info: SessionInfo {
                id,
                title: None,
                model,
                created_at: now,
                updated_at: now,
            },
            store: ConversationStore::new(),
        }
    }

    pub fn touch(&mut self) {
        self.info.updated_at = Utc::now();
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session: self.info.clone(),
            messages: self.store.messages().to_vec(),
            busy: self.store.is_busy(),
            last_question: self.store.last_question().cloned(),
        }
    }
}

/// Point-in-time view of a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session: SessionInfo,
    pub messages: Vec<Message>,
    pub busy: bool,
    pub last_question: Option<Message>,
}

/// Events sent to SSE clients
#[derive(Debug, Clone)]
pub enum SseEvent {
    Init { snapshot: SessionSnapshot },
    Message { message: Message },
    Cleared,
    StateChange { busy: bool, state: ConvState },
    ReplyDone,
    SessionUpdated { session: SessionInfo },
    Error { message: String },
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),
    #[error(transparent)]
    Rejected(#[from] TransitionError),
    #[error("Session runtime stopped: {0}")]
    Stopped(String),
}

/// Handle to interact with a running session
pub struct SessionHandle {
    pub command_tx: mpsc::Sender<Command>,
    pub broadcast_tx: broadcast::Sender<SseEvent>,
    pub session: Arc<RwLock<Session>>,
}

/// Manager for all session runtimes
pub struct SessionManager {
    catalog: Arc<ModelCatalog>,
    generator: Arc<dyn ResponseGenerator>,
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl SessionManager {
    pub fn new(catalog: Arc<ModelCatalog>, generator: Arc<dyn ResponseGenerator>) -> Self {
        Self {
            catalog,
            generator,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn catalog(&self) -> &Arc<ModelCatalog> {
        &self.catalog
    }

    /// Create a session and start its runtime.
    ///
    /// Without an explicit model the catalog default is preselected.
    pub async fn create_session(
        &self,
        model: Option<String>,
    ) -> Result<SessionInfo, RuntimeError> {
        let model = match model {
            Some(m) if !self.catalog.contains(&m) => {
                return Err(TransitionError::UnknownModel(m).into());
            }
            Some(m) => Some(m),
            None => self.catalog.default_model_id().map(String::from),
        };

        let id = uuid::Uuid::new_v4().to_string();
        let session = Arc::new(RwLock::new(Session::new(id.clone(), model)));
        let info = session.read().await.info.clone();

        let (command_tx, command_rx) = mpsc::channel(32);
        let (broadcast_tx, _) = broadcast::channel(128);

        let runtime = ConversationRuntime::new(
            ConvContext::new(&id, self.catalog.clone()),
            session.clone(),
            self.generator.clone(),
            command_rx,
            command_tx.downgrade(),
            broadcast_tx.clone(),
        );
        tokio::spawn(runtime.run());

        self.sessions.write().await.insert(
            id.clone(),
            SessionHandle {
                command_tx,
                broadcast_tx,
                session,
            },
        );

        tracing::info!(session_id = %id, model = ?info.model, "Created session");
        Ok(info)
    }

    /// All sessions, most recently updated first
    pub async fn list_sessions(&self) -> Vec<SessionInfo> {
        let sessions = self.sessions.read().await;
        let mut infos = Vec::with_capacity(sessions.len());
        for handle in sessions.values() {
            infos.push(handle.session.read().await.info.clone());
        }
        infos.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        infos
    }

    pub async fn snapshot(&self, id: &str) -> Result<SessionSnapshot, RuntimeError> {
        let session = self.session(id).await?;
        let snapshot = session.read().await.snapshot();
        Ok(snapshot)
    }

    /// Send a user message. The runtime resolves the model selected when
    /// the message is processed.
    pub async fn send_message(&self, id: &str, text: String) -> Result<(), RuntimeError> {
        self.send_event(id, Event::UserMessage { text, model: None })
            .await
    }

    pub async fn select_model(
        &self,
        id: &str,
        model_id: String,
    ) -> Result<SessionInfo, RuntimeError> {
        self.send_event(id, Event::SelectModel { model_id }).await?;
        Ok(self.snapshot(id).await?.session)
    }

    pub async fn clear(&self, id: &str) -> Result<(), RuntimeError> {
        self.send_event(id, Event::Clear).await
    }

    /// Deliver an event and wait for the transition outcome
    pub async fn send_event(&self, id: &str, event: Event) -> Result<(), RuntimeError> {
        let command_tx = {
            let sessions = self.sessions.read().await;
            let handle = sessions
                .get(id)
                .ok_or_else(|| RuntimeError::SessionNotFound(id.to_string()))?;
            handle.command_tx.clone()
        };

        let (reply_tx, reply_rx) = oneshot::channel();
        command_tx
            .send(Command {
                event,
                reply: Some(reply_tx),
            })
            .await
            .map_err(|_| RuntimeError::Stopped(id.to_string()))?;

        reply_rx
            .await
            .map_err(|_| RuntimeError::Stopped(id.to_string()))?
            .map_err(RuntimeError::from)
    }

    /// Subscribe to session updates.
    ///
    /// The receiver is created before the snapshot is taken so no update
    /// falls between the two.
    pub async fn subscribe(
        &self,
        id: &str,
    ) -> Result<(SessionSnapshot, broadcast::Receiver<SseEvent>), RuntimeError> {
        let sessions = self.sessions.read().await;
        let handle = sessions
            .get(id)
            .ok_or_else(|| RuntimeError::SessionNotFound(id.to_string()))?;
        let rx = handle.broadcast_tx.subscribe();
        let snapshot = handle.session.read().await.snapshot();
        Ok((snapshot, rx))
    }

    /// Drop a session. Its runtime stops once any outstanding generation settles.
    pub async fn delete_session(&self, id: &str) -> Result<(), RuntimeError> {
        if self.sessions.write().await.remove(id).is_none() {
            return Err(RuntimeError::SessionNotFound(id.to_string()));
        }
        tracing::info!(session_id = %id, "Deleted session");
        Ok(())
    }

    async fn session(&self, id: &str) -> Result<Arc<RwLock<Session>>, RuntimeError> {
        self.sessions
            .read()
            .await
            .get(id)
            .map(|h| h.session.clone())
            .ok_or_else(|| RuntimeError::SessionNotFound(id.to_string()))
    }
}
