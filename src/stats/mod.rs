//! Catcher statistics
//!
//! Monotonic counters for the status page and per-channel delivery stats.

pub mod metrics;

pub use metrics::{CatcherStats, ChannelStats, StatusSnapshot};
