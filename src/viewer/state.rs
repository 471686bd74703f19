//! Viewer lifecycle state machine
//!
//! Tracks a viewer connection from subscription to teardown:
//!
//! ```text
//! Active ──(peer close | write error | local close)──► Closing ──► Closed
//! ```
//!
//! The phase is shared between the enqueue side (held by the host channel)
//! and the delivery loop, so it lives in an atomic.

use std::sync::atomic::{AtomicU8, Ordering};

/// Viewer lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerPhase {
    /// Subscribed and accepting captures
    Active,
    /// Tearing down; enqueues are refused
    Closing,
    /// Unsubscribed and transport released
    Closed,
}

impl ViewerPhase {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ViewerPhase::Active,
            1 => ViewerPhase::Closing,
            _ => ViewerPhase::Closed,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            ViewerPhase::Active => 0,
            ViewerPhase::Closing => 1,
            ViewerPhase::Closed => 2,
        }
    }
}

/// Atomic cell holding a [`ViewerPhase`]
#[derive(Debug)]
pub struct PhaseCell(AtomicU8);

impl PhaseCell {
    /// Create a cell in the `Active` phase
    pub fn new() -> Self {
        Self(AtomicU8::new(ViewerPhase::Active.as_u8()))
    }

    /// Current phase
    pub fn get(&self) -> ViewerPhase {
        ViewerPhase::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Check if the viewer still accepts captures
    pub fn is_active(&self) -> bool {
        self.get() == ViewerPhase::Active
    }

    /// Move `Active -> Closing`
    ///
    /// Returns `true` only for the caller that performed the transition.
    pub fn begin_closing(&self) -> bool {
        self.0
            .compare_exchange(
                ViewerPhase::Active.as_u8(),
                ViewerPhase::Closing.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Move to the terminal `Closed` phase
    pub fn finish(&self) {
        self.0.store(ViewerPhase::Closed.as_u8(), Ordering::Release);
    }
}

impl Default for PhaseCell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewer_lifecycle() {
        let phase = PhaseCell::new();
        assert_eq!(phase.get(), ViewerPhase::Active);
        assert!(phase.is_active());

        assert!(phase.begin_closing());
        assert_eq!(phase.get(), ViewerPhase::Closing);
        assert!(!phase.is_active());

        phase.finish();
        assert_eq!(phase.get(), ViewerPhase::Closed);
    }

    #[test]
    fn test_begin_closing_only_once() {
        let phase = PhaseCell::new();

        assert!(phase.begin_closing());
        assert!(!phase.begin_closing());

        phase.finish();
        assert!(!phase.begin_closing());
        assert_eq!(phase.get(), ViewerPhase::Closed);
    }
}
