//! In-memory transport and relay for unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::sync::{SyncEvent, Transport, TransportError};

#[derive(Debug, Default)]
struct Wire {
    sent: Vec<String>,
    inbox: VecDeque<SyncEvent>,
}

/// A transport whose two ends live in the same thread.
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeTransport {
    wire: Rc<RefCell<Wire>>,
}

impl FakeTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue an event for the next `poll_events`.
    pub(crate) fn push(&self, event: SyncEvent) {
        self.wire.borrow_mut().inbox.push_back(event);
    }

    /// Frames sent so far, oldest first.
    pub(crate) fn sent(&self) -> Vec<String> {
        self.wire.borrow().sent.clone()
    }

    fn take_sent(&self) -> Vec<String> {
        std::mem::take(&mut self.wire.borrow_mut().sent)
    }
}

impl Transport for FakeTransport {
    fn send(&self, text: &str) -> Result<(), TransportError> {
        self.wire.borrow_mut().sent.push(text.to_string());
        Ok(())
    }

    fn poll_events(&mut self) -> Vec<SyncEvent> {
        self.wire.borrow_mut().inbox.drain(..).collect()
    }
}

/// A relay that fans every frame out to all clients, sender included, in a
/// single global order.
#[derive(Debug, Default)]
pub(crate) struct LocalRelay {
    clients: Vec<FakeTransport>,
}

impl LocalRelay {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Attach a client that is already connected.
    pub(crate) fn attach(&mut self) -> FakeTransport {
        let transport = FakeTransport::new();
        transport.push(SyncEvent::Connected);
        self.clients.push(transport.clone());
        transport
    }

    /// Deliver everything sent so far. Returns the number of frames relayed.
    pub(crate) fn pump(&mut self) -> usize {
        let mut order = Vec::new();
        for client in &self.clients {
            order.extend(client.take_sent());
        }
        for frame in &order {
            for client in &self.clients {
                client.push(SyncEvent::Message(frame.clone()));
            }
        }
        order.len()
    }
}
