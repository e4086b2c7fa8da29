//! The relay hub: one broadcast channel shared by every connection.
//!
//! Every accepted frame goes through a single `broadcast::Sender`, so all
//! connections observe the same global order. The sender is subscribed like
//! everyone else and receives its own frames back.

use std::net::SocketAddr;
use std::num::NonZeroUsize;

use axum::extract::ws::Utf8Bytes;
use bytes::Bytes;
use dashmap::DashMap;
use serde::de::IgnoredAny;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

/// Identifier the hub assigns to each socket. Never sent to clients.
pub type ConnectionId = Uuid;

/// Bookkeeping for a live connection.
#[derive(Debug, Clone)]
pub struct Connection {
    pub addr: SocketAddr,
}

/// Shared relay state.
pub struct RelayHub {
    tx: broadcast::Sender<Utf8Bytes>,
    connections: DashMap<ConnectionId, Connection>,
}

impl RelayHub {
    /// Create a hub whose receivers may fall at most `capacity` frames behind.
    pub fn new(capacity: NonZeroUsize) -> Self {
        let (tx, _) = broadcast::channel(capacity.get());
        Self {
            tx,
            connections: DashMap::new(),
        }
    }

    /// Register a connection and start receiving relayed frames.
    ///
    /// Subscribe before reading the connection's first frame so it sees its
    /// own echoes.
    pub fn subscribe(&self, addr: SocketAddr) -> (ConnectionId, broadcast::Receiver<Utf8Bytes>) {
        let id = Uuid::new_v4();
        let rx = self.tx.subscribe();
        self.connections.insert(id, Connection { addr });
        (id, rx)
    }

    /// Forward a text frame to every live connection, the sender included.
    ///
    /// The frame is passed on verbatim if it is well-formed JSON; anything
    /// else is dropped. Returns whether the frame was relayed.
    pub fn relay(&self, from: ConnectionId, text: Utf8Bytes) -> bool {
        if let Err(e) = serde_json::from_str::<IgnoredAny>(text.as_str()) {
            debug!("Dropping malformed frame from {}: {}", from, e);
            return false;
        }
        // Only fails when nobody is subscribed.
        let _ = self.tx.send(text);
        true
    }

    /// Forget a connection. Nothing is announced to the others.
    pub fn disconnect(&self, id: ConnectionId) -> Option<Connection> {
        self.connections.remove(&id).map(|(_, conn)| conn)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

/// Binary frames are accepted when they hold UTF-8 text.
pub fn binary_to_text(data: Bytes) -> Option<Utf8Bytes> {
    String::from_utf8(data.to_vec()).ok().map(Utf8Bytes::from)
}
