//! Catch dispatcher
//!
//! The single write path from the HTTP boundary into the registry, plus the
//! entry point for new viewers.

use std::sync::Arc;

use crate::capture::{self, RawRequest};
use crate::registry::{HostRegistry, Hostname};
use crate::viewer::ViewerConnection;

/// What happened to an inbound request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatchOutcome {
    /// A channel exists for the host and the capture was published
    Caught,
    /// Nobody has ever watched this host; nothing was recorded
    Ignored,
}

/// Routes inbound requests to their host channel
#[derive(Clone)]
pub struct Catcher {
    registry: Arc<HostRegistry>,
}

impl Catcher {
    /// Create a dispatcher over `registry`
    pub fn new(registry: Arc<HostRegistry>) -> Self {
        Self { registry }
    }

    /// Get a reference to the host registry
    pub fn registry(&self) -> &Arc<HostRegistry> {
        &self.registry
    }

    /// Check if a channel exists for `host`
    ///
    /// Lets the boundary skip reading bodies nobody will see.
    pub async fn is_watched(&self, host: &str) -> bool {
        self.registry.get(&Hostname::new(host)).await.is_some()
    }

    /// Capture and publish a request if anyone watches its host
    ///
    /// Never creates a channel, so noise aimed at random hostnames leaves
    /// the registry untouched.
    pub async fn catch(&self, raw: RawRequest) -> CatchOutcome {
        let hostname = Hostname::new(&raw.host);

        let Some(channel) = self.registry.get(&hostname).await else {
            tracing::debug!(host = %hostname, path = %raw.path, "Request ignored");
            return CatchOutcome::Ignored;
        };

        let captured = capture::convert(raw, self.registry.config().max_body_size);
        let report = channel.publish(captured).await;

        tracing::debug!(
            host = %hostname,
            delivered = report.delivered,
            dropped = report.dropped,
            "Request caught"
        );

        CatchOutcome::Caught
    }

    /// Subscribe a new viewer to `host`, creating its channel if needed
    pub async fn subscribe(&self, host: &str) -> ViewerConnection {
        let hostname = Hostname::new(host);
        let channel = self.registry.get_or_create(&hostname).await;

        ViewerConnection::open(channel, self.registry.config().viewer_queue_capacity).await
    }
}
