//! Host registry for request fan-out
//!
//! The registry maps each hostname to a [`HostChannel`] and routes captured
//! requests to the viewers watching that hostname.
//!
//! # Architecture
//!
//! ```text
//!                          Arc<HostRegistry>
//!                     ┌─────────────────────────┐
//!                     │ hosts: HashMap<Hostname,│
//!                     │   HostChannel {         │
//!                     │     viewers: {id ->     │
//!                     │       ViewerHandle },   │
//!                     │   }                     │
//!                     │ >                       │
//!                     └───────────┬─────────────┘
//!                                 │
//!         ┌───────────────────────┼───────────────────────┐
//!         │                       │                       │
//!         ▼                       ▼                       ▼
//!    [Catcher]                [Viewer]                [Viewer]
//!    catch()                  rx.recv()               rx.recv()
//!         │                       │                       │
//!         └──► channel.publish() ─┴─► try_send() ──► WebSocket
//! ```
//!
//! # Creation asymmetry
//!
//! Subscribing always creates the channel ([`HostRegistry::get_or_create`]);
//! catching only looks it up ([`HostRegistry::get`]). Entries live for the
//! lifetime of the registry.
//!
//! # Zero-Copy Delivery
//!
//! Each capture is wrapped in an `Arc` once per publish and its body is a
//! `bytes::Bytes`, so every viewer shares the same allocation.

pub mod channel;
pub mod config;
pub mod host;
pub mod store;

pub use channel::{HostChannel, PublishReport};
pub use config::RegistryConfig;
pub use host::Hostname;
pub use store::HostRegistry;
