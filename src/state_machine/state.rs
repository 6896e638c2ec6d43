//! Conversation state types

use crate::catalog::ModelCatalog;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Send-message lifecycle of one conversation
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConvState {
    /// Ready for user input
    #[default]
    Idle,

    /// Exactly one generation is outstanding
    Sending {
        /// Model the outstanding request was issued with
        model: String,
    },
}

impl ConvState {
    /// Whether a generation is outstanding
    #[cfg(test)]
    pub fn is_busy(&self) -> bool {
        matches!(self, ConvState::Sending { .. })
    }
}

/// Immutable context for a conversation's transitions
#[derive(Debug, Clone)]
pub struct ConvContext {
    pub session_id: String,
    /// Models a send or selection may name
    pub catalog: Arc<ModelCatalog>,
}

impl ConvContext {
    pub fn new(session_id: impl Into<String>, catalog: Arc<ModelCatalog>) -> Self {
        Self {
            session_id: session_id.into(),
            catalog,
        }
    }
}
