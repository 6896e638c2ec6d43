//! Response generator abstraction
//!
//! There is no inference backend: replies come from `KeywordGenerator`,
//! wrapped in `LoggingGenerator` for diagnostics.

mod error;
mod keyword;
mod latency;

pub use error::GenerationError;
#[cfg(test)]
pub use error::GenerationErrorKind;
pub use keyword::KeywordGenerator;
pub use latency::{FixedLatency, Latency, NoLatency, RandomLatency};

use crate::store::Message;
use async_trait::async_trait;
use std::sync::Arc;

/// Produces assistant text from the conversation history
#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    /// Generate a reply to the last message of `history` as `model_id`
    async fn generate(
        &self,
        history: &[Message],
        model_id: &str,
    ) -> Result<String, GenerationError>;
}

#[async_trait]
impl<T: ResponseGenerator + ?Sized> ResponseGenerator for Arc<T> {
    async fn generate(
        &self,
        history: &[Message],
        model_id: &str,
    ) -> Result<String, GenerationError> {
        (**self).generate(history, model_id).await
    }
}

/// Logging wrapper for generators
pub struct LoggingGenerator<G> {
    inner: G,
}

impl<G: ResponseGenerator> LoggingGenerator<G> {
    pub fn new(inner: G) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<G: ResponseGenerator> ResponseGenerator for LoggingGenerator<G> {
    async fn generate(
        &self,
        history: &[Message],
        model_id: &str,
    ) -> Result<String, GenerationError> {
        let start = std::time::Instant::now();
        let result = self.inner.generate(history, model_id).await;
        let duration = start.elapsed();

        match &result {
            Ok(text) => {
                tracing::info!(
                    model = %model_id,
                    duration_ms = %duration.as_millis(),
                    history_len = history.len(),
                    reply_len = text.len(),
                    "Generation completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %model_id,
                    duration_ms = %duration.as_millis(),
                    kind = %e.kind,
                    error = %e.message,
                    "Generation failed"
                );
            }
        }

        result
    }
}
