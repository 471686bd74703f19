//! Viewer connection and delivery loop
//!
//! A viewer is split in two:
//!
//! - [`ViewerHandle`] is the enqueue side. The host channel keeps one per
//!   subscriber and pushes captures into it without ever waiting.
//! - [`ViewerConnection`] owns the receive side of the bounded queue and the
//!   transport. Its delivery loop writes captures in arrival order and tears
//!   the subscription down exactly once when the viewer goes away.
//!
//! The transport is any `Sink<String>` for outbound text frames plus a
//! `Stream<Item = PeerFrame>` that reports what the peer sends back.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;

use crate::capture::CapturedRequest;
use crate::registry::HostChannel;

use super::state::{PhaseCell, ViewerPhase};

/// How long a closing viewer waits for its transport to flush and close
const TRANSPORT_CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Outcome of a single non-blocking enqueue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Accepted into the viewer's queue
    Queued,
    /// Queue full; the viewer fell behind and this capture was dropped for it
    Full,
    /// Viewer is closing or closed
    Inactive,
}

impl Delivery {
    /// Check if the capture was not queued
    pub fn is_dropped(self) -> bool {
        self != Delivery::Queued
    }
}

/// Frame received from the viewer's peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerFrame {
    /// Anything that is not a close (text, binary, ping, pong)
    Message,
    /// Protocol-level close or a transport error
    Close,
}

/// Why a delivery loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Closed from this side via [`ViewerHandle::close`]
    Local,
    /// Peer sent a close frame, errored, or hung up
    PeerClosed,
    /// Writing to the transport failed
    WriteFailed,
}

#[derive(Debug)]
struct Shared {
    phase: PhaseCell,
    close_requested: Notify,
}

/// Enqueue side of a viewer connection
#[derive(Debug, Clone)]
pub struct ViewerHandle {
    id: u64,
    tx: mpsc::Sender<Arc<CapturedRequest>>,
    shared: Arc<Shared>,
}

impl ViewerHandle {
    /// Viewer ID, unique within its host channel
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> ViewerPhase {
        self.shared.phase.get()
    }

    /// Try to queue a capture without waiting
    pub fn enqueue(&self, capture: &Arc<CapturedRequest>) -> Delivery {
        if !self.shared.phase.is_active() {
            return Delivery::Inactive;
        }

        match self.tx.try_send(Arc::clone(capture)) {
            Ok(()) => Delivery::Queued,
            Err(TrySendError::Full(_)) => Delivery::Full,
            Err(TrySendError::Closed(_)) => Delivery::Inactive,
        }
    }

    /// Ask the delivery loop to close the connection
    ///
    /// Enqueues are refused from this point on. The loop unsubscribes and
    /// releases the transport on its own task.
    pub fn close(&self) {
        if self.shared.phase.begin_closing() {
            self.shared.close_requested.notify_one();
        }
    }
}

/// A subscribed viewer that owns its queue and transport
pub struct ViewerConnection {
    handle: ViewerHandle,
    rx: mpsc::Receiver<Arc<CapturedRequest>>,
    channel: Arc<HostChannel>,
}

impl ViewerConnection {
    /// Create a viewer and subscribe it to `channel`
    ///
    /// Captures published from here on are queued (up to `queue_capacity`)
    /// until [`run`](Self::run) starts draining them.
    pub async fn open(channel: Arc<HostChannel>, queue_capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let handle = ViewerHandle {
            id: channel.next_viewer_id(),
            tx,
            shared: Arc::new(Shared {
                phase: PhaseCell::new(),
                close_requested: Notify::new(),
            }),
        };

        channel.subscribe(handle.clone()).await;

        Self {
            handle,
            rx,
            channel,
        }
    }

    /// Enqueue handle for this viewer
    pub fn handle(&self) -> ViewerHandle {
        self.handle.clone()
    }

    /// Channel this viewer is subscribed to
    pub fn channel(&self) -> &Arc<HostChannel> {
        &self.channel
    }

    /// Run the delivery loop on its own task
    pub fn spawn<S, R>(self, sink: S, peer: R) -> JoinHandle<CloseReason>
    where
        S: Sink<String> + Unpin + Send + 'static,
        S::Error: Display,
        R: Stream<Item = PeerFrame> + Unpin + Send + 'static,
    {
        tokio::spawn(self.run(sink, peer))
    }

    /// Deliver queued captures until the viewer closes
    ///
    /// Returns once the viewer has been unsubscribed and the transport
    /// released.
    pub async fn run<S, R>(mut self, mut sink: S, mut peer: R) -> CloseReason
    where
        S: Sink<String> + Unpin,
        S::Error: Display,
        R: Stream<Item = PeerFrame> + Unpin,
    {
        tracing::debug!(
            host = %self.channel.hostname(),
            viewer_id = self.handle.id,
            "Viewer delivery loop started"
        );

        let reason = loop {
            tokio::select! {
                biased;

                _ = self.handle.shared.close_requested.notified() => break CloseReason::Local,

                frame = peer.next() => match frame {
                    Some(PeerFrame::Message) => continue,
                    Some(PeerFrame::Close) | None => break CloseReason::PeerClosed,
                },

                capture = self.rx.recv() => {
                    // The handle keeps a sender alive, so the queue never ends here
                    let Some(capture) = capture else {
                        break CloseReason::Local;
                    };

                    let payload = match capture.to_json() {
                        Ok(payload) => payload,
                        Err(e) => {
                            tracing::warn!(
                                host = %self.channel.hostname(),
                                viewer_id = self.handle.id,
                                error = %e,
                                "Failed to encode capture"
                            );
                            continue;
                        }
                    };

                    if let Some(reason) = self.write(&mut sink, &mut peer, payload).await {
                        break reason;
                    }
                }
            }
        };

        self.shut_down(&mut sink, reason).await;
        reason
    }

    /// Write one payload, still honouring close requests while it is pending
    ///
    /// A peer that stops reading leaves the write pending forever, so the
    /// write is raced against a local close and the peer going away. Returns
    /// the close reason if the loop has to stop.
    async fn write<S, R>(&self, sink: &mut S, peer: &mut R, payload: String) -> Option<CloseReason>
    where
        S: Sink<String> + Unpin,
        S::Error: Display,
        R: Stream<Item = PeerFrame> + Unpin,
    {
        let write = sink.send(payload);
        tokio::pin!(write);

        loop {
            tokio::select! {
                biased;

                _ = self.handle.shared.close_requested.notified() => return Some(CloseReason::Local),

                frame = peer.next() => match frame {
                    Some(PeerFrame::Message) => continue,
                    Some(PeerFrame::Close) | None => return Some(CloseReason::PeerClosed),
                },

                result = &mut write => {
                    return match result {
                        Ok(()) => None,
                        Err(e) => {
                            tracing::warn!(
                                host = %self.channel.hostname(),
                                viewer_id = self.handle.id,
                                error = %e,
                                "Viewer write failed"
                            );
                            Some(CloseReason::WriteFailed)
                        }
                    };
                }
            }
        }
    }

    async fn shut_down<S>(&mut self, sink: &mut S, reason: CloseReason)
    where
        S: Sink<String> + Unpin,
        S::Error: Display,
    {
        self.handle.shared.phase.begin_closing();
        self.channel.unsubscribe(self.handle.id).await;

        self.rx.close();
        let mut discarded = 0usize;
        while self.rx.try_recv().is_ok() {
            discarded += 1;
        }

        match tokio::time::timeout(TRANSPORT_CLOSE_TIMEOUT, sink.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::debug!(
                    host = %self.channel.hostname(),
                    viewer_id = self.handle.id,
                    error = %e,
                    "Error closing viewer transport"
                );
            }
            Err(_) => {
                tracing::debug!(
                    host = %self.channel.hostname(),
                    viewer_id = self.handle.id,
                    "Viewer transport did not close in time, dropping it"
                );
            }
        }

        self.handle.shared.phase.finish();

        tracing::info!(
            host = %self.channel.hostname(),
            viewer_id = self.handle.id,
            reason = ?reason,
            discarded = discarded,
            "Viewer closed"
        );
    }
}
