use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::ChatModel;
use crate::memory::MemoryStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Chat backend. `LlmClient` in production, a scripted double in tests.
    pub llm: Arc<dyn ChatModel>,
    pub memory: MemoryStore,
    pub config: Config,
}
