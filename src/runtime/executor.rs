//! Session runtime executor

use super::{Session, SseEvent};
use crate::generator::{GenerationError, ResponseGenerator};
use crate::state_machine::{transition, ConvContext, ConvState, Effect, Event, TransitionError};
use crate::title::title_from_message;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};

/// Event plus an optional channel for the transition outcome
#[derive(Debug)]
pub struct Command {
    pub event: Event,
    pub reply: Option<oneshot::Sender<Result<(), TransitionError>>>,
}

/// Drives one session: runs transitions and executes their effects
pub struct ConversationRuntime<G>
where
    G: ResponseGenerator + ?Sized + 'static,
{
    context: ConvContext,
    state: ConvState,
    session: Arc<RwLock<Session>>,
    generator: Arc<G>,
    command_rx: mpsc::Receiver<Command>,
    /// Weak so that dropping the manager's handle ends the runtime
    command_tx: mpsc::WeakSender<Command>,
    broadcast_tx: broadcast::Sender<SseEvent>,
}

impl<G> ConversationRuntime<G>
where
    G: ResponseGenerator + ?Sized + 'static,
{
    pub fn new(
        context: ConvContext,
        session: Arc<RwLock<Session>>,
        generator: Arc<G>,
        command_rx: mpsc::Receiver<Command>,
        command_tx: mpsc::WeakSender<Command>,
        broadcast_tx: broadcast::Sender<SseEvent>,
    ) -> Self {
        Self {
            context,
            state: ConvState::Idle,
            session,
            generator,
            command_rx,
            command_tx,
            broadcast_tx,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(session_id = %self.context.session_id, "Starting session runtime");

        while let Some(command) = self.command_rx.recv().await {
            let Command { event, reply } = command;
            let event_name = event.name();
            let outcome = self.process_event(event).await;

            if let Err(e) = &outcome {
                tracing::debug!(
                    session_id = %self.context.session_id,
                    event = event_name,
                    error = %e,
                    "Event rejected"
                );
            }

            match reply {
                Some(reply) => {
                    let _ = reply.send(outcome);
                }
                None => {
                    if let Err(e) = outcome {
                        let _ = self.broadcast_tx.send(SseEvent::Error {
                            message: e.to_string(),
                        });
                    }
                }
            }
        }

        tracing::info!(session_id = %self.context.session_id, "Session runtime stopped");
    }

    async fn process_event(&mut self, mut event: Event) -> Result<(), TransitionError> {
        match &mut event {
            // Sends without an explicit model use the selection in effect now
            Event::UserMessage { model: model @ None, .. } => {
                model.clone_from(&self.session.read().await.info.model);
            }
            Event::GenerationFailed { error } => {
                tracing::error!(
                    session_id = %self.context.session_id,
                    kind = %error.kind,
                    error = %error.message,
                    "Generation failed, replying with apology"
                );
            }
            _ => {}
        }

        let result = transition(&self.state, &self.context, event)?;
        self.state = result.new_state;

        for effect in result.effects {
            self.execute_effect(effect).await;
        }
        Ok(())
    }

    async fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::AppendUser { content } => {
                let message = {
                    let mut session = self.session.write().await;
                    if session.info.title.is_none() {
                        session.info.title = title_from_message(&content);
                    }
                    session.touch();
                    session.store.append_user(content)
                };
                let _ = self.broadcast_tx.send(SseEvent::Message { message });
            }

            Effect::AppendAssistant { content, model } => {
                let message = {
                    let mut session = self.session.write().await;
                    session.touch();
                    session.store.append_assistant(content, model)
                };
                let _ = self.broadcast_tx.send(SseEvent::Message { message });
            }

            Effect::ClearMessages => {
                {
                    let mut session = self.session.write().await;
                    session.store.clear();
                    session.touch();
                }
                let _ = self.broadcast_tx.send(SseEvent::Cleared);
            }

            Effect::SetBusy(busy) => {
                self.session.write().await.store.set_busy(busy);
                let _ = self.broadcast_tx.send(SseEvent::StateChange {
                    busy,
                    state: self.state.clone(),
                });
            }

            Effect::SelectModel { model_id } => {
                let info = {
                    let mut session = self.session.write().await;
                    session.info.model = Some(model_id);
                    session.touch();
                    session.info.clone()
                };
                tracing::info!(session_id = %info.id, model = ?info.model, "Model selected");
                let _ = self.broadcast_tx.send(SseEvent::SessionUpdated { session: info });
            }

            Effect::RequestGeneration { model } => self.spawn_generation(model).await,

            Effect::NotifyReplyDone => {
                let _ = self.broadcast_tx.send(SseEvent::ReplyDone);
            }
        }
    }

    /// Run the generator as a background task that reports back as an event
    async fn spawn_generation(&self, model: String) {
        let history = self.session.read().await.store.messages().to_vec();
        let generator = self.generator.clone();
        let session_id = self.context.session_id.clone();

        let Some(command_tx) = self.command_tx.upgrade() else {
            tracing::warn!(session_id = %session_id, "Session closed before generation started");
            return;
        };

        tokio::spawn(async move {
            tracing::debug!(session_id = %session_id, model = %model, "Generating reply");

            // A panicking generator must still settle the request
            let outcome = tokio::spawn(async move { generator.generate(&history, &model).await })
                .await
                .unwrap_or_else(|e| {
                    Err(GenerationError::backend(format!(
                        "generator task failed: {e}"
                    )))
                });

            let event = match outcome {
                Ok(text) => Event::GenerationComplete { text },
                Err(error) => Event::GenerationFailed { error },
            };

            if command_tx.send(Command { event, reply: None }).await.is_err() {
                tracing::warn!(session_id = %session_id, "Session runtime gone, dropping reply");
            }
        });
    }
}
