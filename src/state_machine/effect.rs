//! Effects produced by state transitions

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Append a user message to the store
    AppendUser { content: String },

    /// Append an assistant message to the store
    AppendAssistant { content: String, model: String },

    /// Drop the whole history
    ClearMessages,

    /// Mirror the busy flag into the store
    SetBusy(bool),

    /// Change the session's selected model
    SelectModel { model_id: String },

    /// Start a generation for the current history (runs as background task)
    RequestGeneration { model: String },

    /// Tell connected clients the outstanding reply has settled
    NotifyReplyDone,
}

impl Effect {
    pub fn append_user(content: impl Into<String>) -> Self {
        Effect::AppendUser {
            content: content.into(),
        }
    }

    pub fn append_assistant(content: impl Into<String>, model: impl Into<String>) -> Self {
        Effect::AppendAssistant {
            content: content.into(),
            model: model.into(),
        }
    }

    pub fn request_generation(model: impl Into<String>) -> Self {
        Effect::RequestGeneration {
            model: model.into(),
        }
    }
}
