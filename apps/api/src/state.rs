use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::TextGenerator;
use crate::session::registry::SessionRegistry;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Generation backend. Default: the Gemini `LlmClient`; tests swap in a fake.
    pub generator: Arc<dyn TextGenerator>,
    pub sessions: SessionRegistry,
}

impl AppState {
    pub fn new(config: Config, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            config,
            generator,
            sessions: SessionRegistry::new(),
        }
    }
}
