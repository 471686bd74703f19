//! Viewer connections
//!
//! A viewer is one long-lived subscriber watching a hostname. It owns a
//! bounded outbound queue and a delivery loop; the host channel only ever
//! sees its [`ViewerHandle`].

pub mod connection;
pub mod state;

pub use connection::{CloseReason, Delivery, PeerFrame, ViewerConnection, ViewerHandle};
pub use state::{PhaseCell, ViewerPhase};
