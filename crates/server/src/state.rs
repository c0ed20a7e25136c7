use std::sync::Arc;
use rivulet_core::{Config, PipelineManager};

/// Shared application state
pub struct AppState {
    config: Config,
    manager: Arc<PipelineManager>,
}

impl AppState {
    pub fn new(config: Config, manager: Arc<PipelineManager>) -> Self {
        Self { config, manager }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn manager(&self) -> &PipelineManager {
        &self.manager
    }
}
