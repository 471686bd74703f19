//! Per-host channel and fan-out
//!
//! A `HostChannel` holds the viewers subscribed to one hostname. Publishing
//! walks the current membership under a read lock and tries a non-blocking
//! enqueue on each viewer. A viewer whose queue is full misses that capture;
//! nobody else is slowed down and the publisher never waits on a viewer.
//!
//! Subscribe and unsubscribe take the write lock, so once `unsubscribe`
//! returns no publish can still be holding that viewer.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::capture::CapturedRequest;
use crate::stats::ChannelStats;
use crate::viewer::ViewerHandle;

use super::host::Hostname;

/// Result of one publish
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Viewers that accepted the capture into their queue
    pub delivered: usize,
    /// Viewers that missed it (queue full or closing)
    pub dropped: usize,
}

/// Broadcast channel for a single hostname
pub struct HostChannel {
    hostname: Hostname,

    /// Live viewers keyed by viewer ID
    viewers: RwLock<HashMap<u64, ViewerHandle>>,

    next_viewer_id: AtomicU64,

    /// Captures published on this channel
    published: AtomicU64,

    /// Individual deliveries dropped
    dropped: AtomicU64,
}

impl HostChannel {
    /// Create an empty channel
    pub(super) fn new(hostname: Hostname) -> Self {
        Self {
            hostname,
            viewers: RwLock::new(HashMap::new()),
            next_viewer_id: AtomicU64::new(1),
            published: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Hostname served by this channel
    pub fn hostname(&self) -> &Hostname {
        &self.hostname
    }

    /// Allocate an ID for a new viewer
    pub fn next_viewer_id(&self) -> u64 {
        self.next_viewer_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Add a viewer to the membership set
    pub async fn subscribe(&self, viewer: ViewerHandle) {
        let mut viewers = self.viewers.write().await;
        let viewer_id = viewer.id();
        viewers.insert(viewer_id, viewer);

        tracing::info!(
            host = %self.hostname,
            viewer_id = viewer_id,
            viewers = viewers.len(),
            "Viewer subscribed"
        );
    }

    /// Remove a viewer from the membership set
    ///
    /// Returns `false` if the viewer was not subscribed.
    pub async fn unsubscribe(&self, viewer_id: u64) -> bool {
        let mut viewers = self.viewers.write().await;
        let removed = viewers.remove(&viewer_id).is_some();

        tracing::debug!(
            host = %self.hostname,
            viewer_id = viewer_id,
            viewers = viewers.len(),
            removed = removed,
            "Viewer unsubscribed"
        );

        removed
    }

    /// Fan a capture out to every current viewer
    ///
    /// Never waits on a viewer: each enqueue is a `try_send`.
    pub async fn publish(&self, capture: CapturedRequest) -> PublishReport {
        let capture = Arc::new(capture);
        let mut report = PublishReport::default();

        {
            let viewers = self.viewers.read().await;
            for viewer in viewers.values() {
                if viewer.enqueue(&capture).is_dropped() {
                    report.dropped += 1;
                } else {
                    report.delivered += 1;
                }
            }
        }

        self.published.fetch_add(1, Ordering::Relaxed);
        if report.dropped > 0 {
            self.dropped
                .fetch_add(report.dropped as u64, Ordering::Relaxed);
            tracing::debug!(
                host = %self.hostname,
                delivered = report.delivered,
                dropped = report.dropped,
                "Viewers fell behind, capture dropped for them"
            );
        }

        report
    }

    /// Ask every viewer to close
    pub async fn close_all(&self) {
        let viewers = self.viewers.read().await;
        for viewer in viewers.values() {
            viewer.close();
        }
    }

    /// Number of subscribed viewers
    pub async fn viewer_count(&self) -> usize {
        self.viewers.read().await.len()
    }

    /// Snapshot of the channel counters
    pub async fn stats(&self) -> ChannelStats {
        ChannelStats {
            viewers: self.viewer_count().await,
            published: self.published.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for HostChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostChannel")
            .field("hostname", &self.hostname)
            .field("published", &self.published.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
