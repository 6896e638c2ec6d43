//! Server configuration from environment variables

use crate::catalog::{CatalogError, ModelCatalog};
use crate::generator::{FixedLatency, Latency, NoLatency, RandomLatency};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_MODEL: &str = "gpt-4-turbo";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    /// Model preselected for new sessions
    pub default_model: String,
    /// JSON catalog replacing the built-in one
    pub catalog_path: Option<PathBuf>,
    pub latency_min: Duration,
    pub latency_max: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            default_model: DEFAULT_MODEL.to_string(),
            catalog_path: None,
            latency_min: RandomLatency::DEFAULT_MIN,
            latency_max: RandomLatency::DEFAULT_MAX,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unparseable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let millis = |key: &str, fallback: Duration| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map_or(fallback, Duration::from_millis)
        };

        Self {
            port: lookup("MODEL_CHAT_PORT")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(defaults.port),
            default_model: lookup("MODEL_CHAT_DEFAULT_MODEL")
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(defaults.default_model),
            catalog_path: lookup("MODEL_CHAT_CATALOG")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            latency_min: millis("MODEL_CHAT_LATENCY_MIN_MS", defaults.latency_min),
            latency_max: millis("MODEL_CHAT_LATENCY_MAX_MS", defaults.latency_max),
        }
    }

    /// Load the configured catalog and apply the default selection
    pub fn load_catalog(&self) -> Result<ModelCatalog, CatalogError> {
        let catalog = match &self.catalog_path {
            Some(path) => {
                tracing::info!(path = %path.display(), "Loading model catalog");
                ModelCatalog::from_json_file(path)?
            }
            None => ModelCatalog::builtin(),
        };
        Ok(catalog.with_default(&self.default_model))
    }

    /// Latency strategy for the configured range
    pub fn latency(&self) -> Box<dyn Latency> {
        let random = RandomLatency::new(self.latency_min, self.latency_max);
        if random.max().is_zero() {
            Box::new(NoLatency)
        } else if random.min() == random.max() {
            Box::new(FixedLatency(random.min()))
        } else {
            Box::new(random)
        }
    }
}
