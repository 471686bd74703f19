//! Request catcher
//!
//! A catch-all HTTP endpoint for debugging webhooks. Point a webhook at
//! `<anything>.your-host`, open the viewer page on that hostname, and every
//! request sent there shows up live over a WebSocket.
//!
//! The core is the [`registry`]: a map from hostname to a [`HostChannel`]
//! that fans each [`CapturedRequest`] out to the viewers subscribed to it.
//! Delivery is best-effort per viewer: a viewer that falls behind misses
//! captures, it never slows down the request path or other viewers.
//!
//! [`HostChannel`]: registry::HostChannel
//! [`CapturedRequest`]: capture::CapturedRequest

pub mod capture;
pub mod catcher;
pub mod error;
pub mod registry;
pub mod server;
pub mod stats;
pub mod viewer;

pub use catcher::{CatchOutcome, Catcher};
pub use error::{Error, Result};
pub use registry::{HostRegistry, Hostname, RegistryConfig};
pub use server::{CatcherServer, ServerConfig};
