//! Realtime channel plumbing.
//!
//! The session driver only sees typed events on a pair of mpsc queues
//! ([`RealtimeLink`]). A transport adapter (WebSocket, socket.io bridge, test
//! harness) holds the other end ([`RealtimeEndpoint`]) and moves JSON frames
//! `{"event": ..., "data": ...}` in and out.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use parlor_shared::{ClientEvent, ServerEvent};

use crate::error::{ClientError, Result};

/// Driver side of the realtime channel.
#[derive(Debug)]
pub struct RealtimeLink {
    pub outbound: mpsc::Sender<ClientEvent>,
    pub inbound: mpsc::Receiver<ServerEvent>,
}

/// Transport side of the realtime channel.
#[derive(Debug)]
pub struct RealtimeEndpoint {
    inbound_tx: mpsc::Sender<ServerEvent>,
    outbound_rx: mpsc::Receiver<ClientEvent>,
}

/// Create a connected link/endpoint pair with `buffer` slots per direction.
pub fn channel_pair(buffer: usize) -> (RealtimeLink, RealtimeEndpoint) {
    let (inbound_tx, inbound_rx) = mpsc::channel::<ServerEvent>(buffer);
    let (outbound_tx, outbound_rx) = mpsc::channel::<ClientEvent>(buffer);
    (
        RealtimeLink {
            outbound: outbound_tx,
            inbound: inbound_rx,
        },
        RealtimeEndpoint {
            inbound_tx,
            outbound_rx,
        },
    )
}

impl RealtimeEndpoint {
    /// Push an already decoded event towards the driver.
    pub async fn deliver(&self, event: ServerEvent) -> Result<()> {
        self.inbound_tx
            .send(event)
            .await
            .map_err(|_| ClientError::ChannelClosed)
    }

    /// Decode a JSON frame received from the server and push it towards the
    /// driver. Malformed frames are rejected without closing the channel.
    pub async fn deliver_frame(&self, frame: &str) -> Result<()> {
        let event = match ServerEvent::from_json(frame) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "Dropping malformed realtime frame");
                return Err(e.into());
            }
        };
        debug!(event = event.name(), "Inbound frame");
        self.deliver(event).await
    }

    /// Next event the driver wants sent, or `None` once the driver is gone.
    pub async fn next_event(&mut self) -> Option<ClientEvent> {
        self.outbound_rx.recv().await
    }

    /// Next outbound event, encoded as a JSON frame.
    pub async fn next_frame(&mut self) -> Option<Result<String>> {
        let event = self.next_event().await?;
        debug!(event = event.name(), "Outbound frame");
        Some(event.to_json().map_err(ClientError::from))
    }
}
