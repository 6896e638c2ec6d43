//! Model Chat - single-page chat with a selectable simulated model
//!
//! A Rust backend that keeps each conversation in a pure state machine and
//! produces canned replies after a simulated delay.

mod api;
mod catalog;
mod config;
mod generator;
mod runtime;
mod state_machine;
mod store;
mod title;

use api::{create_router, AppState};
use config::ServerConfig;
use generator::{KeywordGenerator, LoggingGenerator};
use runtime::SessionManager;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "model_chat=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = ServerConfig::from_env();
    let catalog = Arc::new(config.load_catalog()?);

    if catalog.is_empty() {
        tracing::warn!("Model catalog is empty. Messages will be rejected until a model exists.");
    } else {
        tracing::info!(
            models = catalog.models().len(),
            default = ?catalog.default_model_id(),
            "Model catalog loaded"
        );
    }

    tracing::info!(
        min_ms = config.latency_min.as_millis(),
        max_ms = config.latency_max.as_millis(),
        "Simulated reply latency"
    );
    let generator = Arc::new(LoggingGenerator::new(KeywordGenerator::new(
        config.latency(),
    )));

    // Create application state
    let state = AppState::new(SessionManager::new(catalog, generator));

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(compression);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Model chat server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
