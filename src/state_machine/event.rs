//! Events that can occur in a conversation

use crate::generator::GenerationError;

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    UserMessage {
        text: String,
        /// Model to send with. `None` is resolved by the runtime to the
        /// session's selection when the event is processed.
        model: Option<String>,
    },
    SelectModel {
        model_id: String,
    },
    Clear,

    // Generator events
    GenerationComplete {
        text: String,
    },
    GenerationFailed {
        error: GenerationError,
    },
}

impl Event {
    #[cfg(test)]
    pub fn user_message(text: impl Into<String>, model: Option<&str>) -> Self {
        Event::UserMessage {
            text: text.into(),
            model: model.map(String::from),
        }
    }

    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Event::UserMessage { .. } => "user_message",
            Event::SelectModel { .. } => "select_model",
            Event::Clear => "clear",
            Event::GenerationComplete { .. } => "generation_complete",
            Event::GenerationFailed { .. } => "generation_failed",
        }
    }
}
