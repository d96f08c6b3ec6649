mod config;
mod errors;
mod interview;
mod llm_client;
mod memory;
mod parser;
mod resume;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::memory::MemoryStore;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Prep API v{}", env!("CARGO_PKG_VERSION"));
    if !config.has_api_key() {
        warn!("ANTHROPIC_API_KEY is not set; every LLM call will fail until it is configured");
    }

    // Initialize LLM client
    let llm = LlmClient::new(config.llm())?;
    info!(
        "LLM client initialized (model: {}, max retries: {})",
        llm.model(),
        config.llm_max_retries
    );

    let memory = MemoryStore::new();
    info!(
        "Memory store initialized (in-process, repair cap {})",
        config.resume_max_repair_attempts
    );

    let state = AppState {
        llm: Arc::new(llm),
        memory,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict allowed origins once the web client has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
