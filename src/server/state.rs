//! Shared application state for the HTTP server.

use std::sync::Arc;

use crate::catcher::Catcher;
use crate::stats::CatcherStats;

use super::config::ServerConfig;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Dispatcher over the host registry.
    pub catcher: Catcher,
    /// Status page counters.
    pub stats: Arc<CatcherStats>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Creates new app state.
    pub fn new(catcher: Catcher, stats: Arc<CatcherStats>, config: ServerConfig) -> Self {
        Self {
            catcher,
            stats,
            config: Arc::new(config),
        }
    }
}
