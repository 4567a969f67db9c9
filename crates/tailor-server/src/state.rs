use std::sync::Arc;

use crate::config::ServerConfig;
use crate::pipeline::TailorPipeline;
use crate::session::SessionStore;

/// Shared application state, available to all route handlers via `State<Arc<AppState>>`.
pub struct AppState {
    pub pipeline: Arc<dyn TailorPipeline>,
    pub sessions: SessionStore,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(pipeline: Arc<dyn TailorPipeline>, config: ServerConfig) -> Self {
        Self {
            pipeline,
            sessions: SessionStore::bounded(config.max_sessions),
            config,
        }
    }
}
