//! Mock generators for testing
//!
//! These mocks let runtime and API tests run without simulated latency.

use super::SseEvent;
use crate::generator::{GenerationError, ResponseGenerator};
use crate::store::Message;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, Notify};

// ============================================================================
// Scripted Generator
// ============================================================================

/// Generator that returns queued results in order
#[derive(Default)]
pub struct ScriptedGenerator {
    results: Mutex<VecDeque<Result<String, GenerationError>>>,
    /// Record of (history, model) for every call
    calls: Mutex<Vec<(Vec<Message>, String)>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_reply(&self, text: impl Into<String>) {
        self.results.lock().unwrap().push_back(Ok(text.into()));
    }

    pub fn queue_error(&self, error: GenerationError) {
        self.results.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_calls(&self) -> Vec<(Vec<Message>, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResponseGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        history: &[Message],
        model_id: &str,
    ) -> Result<String, GenerationError> {
        self.calls
            .lock()
            .unwrap()
            .push((history.to_vec(), model_id.to_string()));
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::network("No scripted reply queued")))
    }
}

// ============================================================================
// Gated Generator (for observing the busy window)
// ============================================================================

/// Scripted generator that holds each call until released
#[derive(Default)]
pub struct GatedGenerator {
    pub inner: ScriptedGenerator,
    /// Notified when a call starts
    pub started: Arc<Notify>,
    /// Notify to let the pending call return
    pub release: Arc<Notify>,
}

impl GatedGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResponseGenerator for GatedGenerator {
    async fn generate(
        &self,
        history: &[Message],
        model_id: &str,
    ) -> Result<String, GenerationError> {
        self.started.notify_one();
        self.release.notified().await;
        self.inner.generate(history, model_id).await
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Wait until the outstanding reply has settled
pub async fn wait_for_reply(rx: &mut broadcast::Receiver<SseEvent>) {
    let wait = async {
        loop {
            match rx.recv().await {
                Ok(SseEvent::ReplyDone) => return,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => panic!("session closed"),
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(5), wait)
        .await
        .expect("timed out waiting for reply");
}
