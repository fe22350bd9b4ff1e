//! Peer transport interface.
//!
//! The data channel itself is established by the host environment (the
//! signaling handshake lives in [`crate::signaling`]); the core only needs
//! an ordered, reliable text channel that delivers UTF-8 JSON messages.

use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport is closed")]
    Closed,
}

/// An ordered, reliable bidirectional message channel.
pub trait PeerTransport {
    /// Send one message to the remote peer.
    fn send(&mut self, message: &str) -> Result<(), TransportError>;

    /// Drain messages received since the last poll, in delivery order.
    fn poll(&mut self) -> Vec<String>;

    /// Close the sending side. Idempotent.
    fn close(&mut self);

    fn is_open(&self) -> bool;
}

/// In-memory duplex channel: two connected endpoints in one process, used by
/// tests and for local loopback sessions.
pub struct ChannelTransport {
    tx: Option<Sender<String>>,
    rx: Receiver<String>,
}

impl ChannelTransport {
    /// Create a connected pair of endpoints.
    pub fn pair() -> (Self, Self) {
        let (a_tx, b_rx) = channel();
        let (b_tx, a_rx) = channel();
        (
            Self {
                tx: Some(a_tx),
                rx: a_rx,
            },
            Self {
                tx: Some(b_tx),
                rx: b_rx,
            },
        )
    }
}

impl PeerTransport for ChannelTransport {
    fn send(&mut self, message: &str) -> Result<(), TransportError> {
        match &self.tx {
            Some(tx) => tx
                .send(message.to_string())
                .map_err(|_| TransportError::Closed),
            None => Err(TransportError::Closed),
        }
    }

    fn poll(&mut self) -> Vec<String> {
        let mut messages = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(msg) => messages.push(msg),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        messages
    }

    fn close(&mut self) {
        self.tx = None;
    }

    fn is_open(&self) -> bool {
        self.tx.is_some()
    }
}
