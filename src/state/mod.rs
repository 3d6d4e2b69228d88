use std::sync::Arc;

use crate::config::ServerConfig;
use crate::core::{CoreState, CoreStateError};

/// Application state that can be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    /// Core layer state: call registry, monitor, providers and conversations
    pub core_state: Arc<CoreState>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Result<Arc<Self>, CoreStateError> {
        let core_state = CoreState::new(&config)?;
        Ok(Arc::new(Self { config, core_state }))
    }

    /// Wrap an already built core, e.g. one with stub providers.
    pub fn with_core(config: ServerConfig, core_state: Arc<CoreState>) -> Arc<Self> {
        Arc::new(Self { config, core_state })
    }
}
