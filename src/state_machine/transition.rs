//! Pure state transition function
//!
//! Given the same inputs it always produces the same outputs, with no I/O.
//! Busy-guarding lives here rather than in the caller: a send while a
//! generation is outstanding is rejected.

use super::{ConvContext, ConvState, Effect, Event};
use thiserror::Error;

/// Assistant text substituted when generation fails
pub const APOLOGY_MESSAGE: &str =
    "Sorry, I encountered an error while generating a response. Please try again.";

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ConvState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ConvState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Please select a model first")]
    NoModelSelected,
    #[error("Unknown model: {0}")]
    UnknownModel(String),
    #[error("A response is still being generated")]
    Busy,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

impl TransitionError {
    /// Stable machine-readable code for API clients
    pub fn code(&self) -> &'static str {
        match self {
            TransitionError::NoModelSelected => "model_required",
            TransitionError::UnknownModel(_) => "unknown_model",
            TransitionError::Busy => "busy",
            TransitionError::InvalidTransition(_) => "invalid_transition",
        }
    }
}

/// Pure transition function
pub fn transition(
    state: &ConvState,
    context: &ConvContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // Sending
        // ============================================================

        // Guard: nothing is appended when no model is selected
        (ConvState::Idle, Event::UserMessage { model: None, .. }) => {
            Err(TransitionError::NoModelSelected)
        }

        (ConvState::Idle, Event::UserMessage { model: Some(model), .. })
            if !context.catalog.contains(&model) =>
        {
            Err(TransitionError::UnknownModel(model))
        }

        // Idle + UserMessage -> Sending
        (ConvState::Idle, Event::UserMessage { text, model: Some(model) }) => {
            Ok(TransitionResult::new(ConvState::Sending {
                model: model.clone(),
            })
            .with_effect(Effect::append_user(text))
            .with_effect(Effect::SetBusy(true))
            .with_effect(Effect::request_generation(model)))
        }

        // One generation at a time
        (ConvState::Sending { .. }, Event::UserMessage { .. }) => Err(TransitionError::Busy),

        // ============================================================
        // Settlement
        // ============================================================

        // A reply always lands, even if the history was cleared meanwhile
        (ConvState::Sending { model }, Event::GenerationComplete { text }) => {
            Ok(settle(Effect::append_assistant(text, model.as_str())))
        }

        // The failure detail is dropped here; the runtime has already logged it
        (ConvState::Sending { model }, Event::GenerationFailed { .. }) => {
            Ok(settle(Effect::append_assistant(APOLOGY_MESSAGE, model.as_str())))
        }

        (ConvState::Idle, event @ (Event::GenerationComplete { .. } | Event::GenerationFailed { .. })) => {
            Err(TransitionError::InvalidTransition(format!(
                "{} while idle",
                event.name()
            )))
        }

        // ============================================================
        // Clearing
        // ============================================================

        (ConvState::Idle, Event::Clear) => {
            Ok(TransitionResult::new(ConvState::Idle).with_effect(Effect::ClearMessages))
        }

        // The outstanding request keeps running and its reply is appended
        (state @ ConvState::Sending { .. }, Event::Clear) => {
            Ok(TransitionResult::new(state.clone()).with_effect(Effect::ClearMessages))
        }

        // ============================================================
        // Model selection
        // ============================================================

        // An in-flight request keeps the model it was issued with
        (state, Event::SelectModel { model_id }) => {
            if context.catalog.contains(&model_id) {
                Ok(TransitionResult::new(state.clone())
                    .with_effect(Effect::SelectModel { model_id }))
            } else {
                Err(TransitionError::UnknownModel(model_id))
            }
        }
    }
}

fn settle(reply: Effect) -> TransitionResult {
    TransitionResult::new(ConvState::Idle)
        .with_effect(reply)
        .with_effect(Effect::SetBusy(false))
        .with_effect(Effect::NotifyReplyDone)
}
