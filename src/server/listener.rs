//! Request catcher server
//!
//! Binds the listener and serves the axum router.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

use crate::catcher::Catcher;
use crate::error::Result;
use crate::registry::HostRegistry;
use crate::stats::CatcherStats;

use super::config::ServerConfig;
use super::state::AppState;

/// Request catcher server
pub struct CatcherServer {
    config: ServerConfig,
    catcher: Catcher,
    stats: Arc<CatcherStats>,
}

impl CatcherServer {
    /// Create a new server with its own host registry
    pub fn new(config: ServerConfig) -> Self {
        let registry = Arc::new(HostRegistry::with_config(config.registry_config()));

        Self {
            config,
            catcher: Catcher::new(registry),
            stats: Arc::new(CatcherStats::new()),
        }
    }

    /// Get a reference to the host registry
    pub fn registry(&self) -> &Arc<HostRegistry> {
        self.catcher.registry()
    }

    /// Get the catch dispatcher
    pub fn catcher(&self) -> &Catcher {
        &self.catcher
    }

    /// Get the status counters
    pub fn stats(&self) -> &Arc<CatcherStats> {
        &self.stats
    }

    /// Get the server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the HTTP router
    pub fn router(&self) -> Router {
        super::router(AppState::new(
            self.catcher.clone(),
            Arc::clone(&self.stats),
            self.config.clone(),
        ))
    }

    /// Run the server
    ///
    /// This method blocks until the server fails.
    pub async fn run(&self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.bind_addr()).await?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already-bound listener until `shutdown` resolves
    ///
    /// On shutdown every viewer is asked to close so that open WebSockets
    /// do not hold the server up.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            addr = %addr,
            root_host = %self.config.root_host,
            "Request catcher listening"
        );

        let registry = Arc::clone(self.registry());
        let shutdown = async move {
            shutdown.await;
            tracing::info!("Shutdown signal received");
            registry.close_all().await;
        };

        axum::serve(
            listener,
            self.router()
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await?;

        tracing::info!("Request catcher stopped");
        Ok(())
    }
}
