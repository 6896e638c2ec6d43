//! Catalog of selectable model descriptors
//!
//! The catalog is an immutable value built once at startup and shared
//! through `Arc`. Tests construct their own catalogs instead of relying on
//! process-wide state.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Static description of a selectable model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Identifier threaded into generator calls (e.g., "gpt-4-turbo")
    pub id: String,
    /// Display name
    pub name: String,
    pub description: String,
    /// Provider display name (e.g., "`OpenAI`")
    pub provider: String,
    /// Capability labels, in display order
    pub capabilities: Vec<String>,
}

impl ModelDescriptor {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        provider: impl Into<String>,
        capabilities: &[&str],
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            provider: provider.into(),
            capabilities: capabilities.iter().map(|c| (*c).to_string()).collect(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Model descriptor has an empty id")]
    EmptyId,
    #[error("Duplicate model id: {0}")]
    DuplicateId(String),
}

/// Immutable, ordered set of model descriptors
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    models: Vec<ModelDescriptor>,
    default_model: Option<String>,
}

impl ModelCatalog {
    /// Build a catalog, validating that ids are non-empty and unique.
    ///
    /// The first entry becomes the default selection.
    pub fn new(models: Vec<ModelDescriptor>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for model in &models {
            if model.id.trim().is_empty() {
                return Err(CatalogError::EmptyId);
            }
            if !seen.insert(model.id.as_str()) {
                return Err(CatalogError::DuplicateId(model.id.clone()));
            }
        }

        let default_model = models.first().map(|m| m.id.clone());
        Ok(Self {
            models,
            default_model,
        })
    }

    /// Load a catalog from a JSON array of descriptors
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        let models: Vec<ModelDescriptor> = serde_json::from_str(&raw)?;
        Self::new(models)
    }

    /// The built-in reference catalog
    pub fn builtin() -> Self {
        let models = vec![
            ModelDescriptor::new(
                "gpt-4-turbo",
                "GPT-4 Turbo",
                "Most capable model for complex reasoning and analysis",
                "OpenAI",
                &[
                    "Text Generation",
                    "Code Analysis",
                    "Mathematical Reasoning",
                    "Creative Writing",
                ],
            ),
            ModelDescriptor::new(
                "gpt-3.5-turbo",
                "GPT-3.5 Turbo",
                "Fast and efficient for most conversational tasks",
                "OpenAI",
                &["Text Generation", "Basic Coding", "Q&A", "Summarization"],
            ),
            ModelDescriptor::new(
                "claude-3-opus",
                "Claude 3 Opus",
                "Excellent for analysis, math, and creative tasks",
                "Anthropic",
                &[
                    "Advanced Analysis",
                    "Creative Writing",
                    "Code Review",
                    "Research",
                ],
            ),
            ModelDescriptor::new(
                "claude-3-sonnet",
                "Claude 3 Sonnet",
                "Balanced performance for everyday tasks",
                "Anthropic",
                &["Text Generation", "Code Help", "Analysis", "Writing"],
            ),
            ModelDescriptor::new(
                "gemini-pro",
                "Gemini Pro",
                "Google's advanced multimodal AI model",
                "Google",
                &[
                    "Text Generation",
                    "Multimodal",
                    "Code Generation",
                    "Reasoning",
                ],
            ),
        ];

        Self {
            default_model: models.first().map(|m| m.id.clone()),
            models,
        }
    }

    /// Prefer `model_id` as the default selection.
    ///
    /// Ids missing from the catalog are ignored with a warning and the
    /// current default is kept.
    #[must_use]
    pub fn with_default(mut self, model_id: &str) -> Self {
        if self.contains(model_id) {
            self.default_model = Some(model_id.to_string());
        } else {
            tracing::warn!(
                model = %model_id,
                fallback = ?self.default_model,
                "Configured default model is not in the catalog"
            );
        }
        self
    }

    pub fn models(&self) -> &[ModelDescriptor] {
        &self.models
    }

    pub fn get(&self, model_id: &str) -> Option<&ModelDescriptor> {
        self.models.iter().find(|m| m.id == model_id)
    }

    pub fn contains(&self, model_id: &str) -> bool {
        self.get(model_id).is_some()
    }

    /// Model preselected for new sessions, if the catalog has any
    pub fn default_model_id(&self) -> Option<&str> {
        self.default_model.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
