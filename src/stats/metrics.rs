//! Statistics and metrics for the catcher

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Process-wide request counters
///
/// All counters only ever increase. They are read by the status page and
/// never influence routing.
#[derive(Debug)]
pub struct CatcherStats {
    started_at: Instant,
    requests_index: AtomicU64,
    requests_caught: AtomicU64,
    requests_ignored: AtomicU64,
    subscriptions: AtomicU64,
}

impl CatcherStats {
    /// Create counters starting at zero, with uptime measured from now
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            requests_index: AtomicU64::new(0),
            requests_caught: AtomicU64::new(0),
            requests_ignored: AtomicU64::new(0),
            subscriptions: AtomicU64::new(0),
        }
    }

    /// Count a request to a subdomain index page
    pub fn record_index(&self) {
        self.requests_index.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a request that reached at least one channel
    pub fn record_caught(&self) {
        self.requests_caught.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a request nobody was listening for
    pub fn record_ignored(&self) {
        self.requests_ignored.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a viewer subscription attempt
    pub fn record_subscription(&self) {
        self.subscriptions.fetch_add(1, Ordering::Relaxed);
    }

    /// Time since the counters were created
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Take a snapshot, with the host count supplied by the registry
    pub fn snapshot(&self, hosts: usize) -> StatusSnapshot {
        StatusSnapshot {
            uptime: self.uptime(),
            hosts,
            index: self.requests_index.load(Ordering::Relaxed),
            caught: self.requests_caught.load(Ordering::Relaxed),
            ignored: self.requests_ignored.load(Ordering::Relaxed),
            client_init: self.subscriptions.load(Ordering::Relaxed),
        }
    }
}

impl Default for CatcherStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of the counters
///
/// `Display` renders the plain-text status page, one `name: value` per line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub uptime: Duration,
    pub hosts: usize,
    pub index: u64,
    pub caught: u64,
    pub ignored: u64,
    pub client_init: u64,
}

impl fmt::Display for StatusSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "uptime: {}", self.uptime.as_secs())?;
        writeln!(f, "hosts: {}", self.hosts)?;
        writeln!(f, "index: {}", self.index)?;
        writeln!(f, "caught: {}", self.caught)?;
        writeln!(f, "ignored: {}", self.ignored)?;
        writeln!(f, "client-init: {}", self.client_init)
    }
}

/// Per-host channel counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelStats {
    /// Currently subscribed viewers
    pub viewers: usize,
    /// Captures published on the channel
    pub published: u64,
    /// Individual deliveries dropped because a viewer fell behind or was closing
    pub dropped: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catcher_stats_new() {
        let stats = CatcherStats::new();
        let snapshot = stats.snapshot(0);

        assert_eq!(snapshot.hosts, 0);
        assert_eq!(snapshot.index, 0);
        assert_eq!(snapshot.caught, 0);
        assert_eq!(snapshot.ignored, 0);
        assert_eq!(snapshot.client_init, 0);
    }

    #[test]
    fn test_counters_increase() {
        let stats = CatcherStats::new();

        stats.record_index();
        stats.record_caught();
        stats.record_caught();
        stats.record_ignored();
        stats.record_ignored();
        stats.record_ignored();
        stats.record_subscription();

        let snapshot = stats.snapshot(4);
        assert_eq!(snapshot.hosts, 4);
        assert_eq!(snapshot.index, 1);
        assert_eq!(snapshot.caught, 2);
        assert_eq!(snapshot.ignored, 3);
        assert_eq!(snapshot.client_init, 1);
    }

    #[test]
    fn test_status_text() {
        let snapshot = StatusSnapshot {
            uptime: Duration::from_millis(61_900),
            hosts: 2,
            index: 3,
            caught: 4,
            ignored: 5,
            client_init: 6,
        };

        assert_eq!(
            snapshot.to_string(),
            "uptime: 61\nhosts: 2\nindex: 3\ncaught: 4\nignored: 5\nclient-init: 6\n"
        );
    }

    #[test]
    fn test_channel_stats_default() {
        let stats = ChannelStats::default();
        assert_eq!(stats.viewers, 0);
        assert_eq!(stats.published, 0);
        assert_eq!(stats.dropped, 0);
    }
}
