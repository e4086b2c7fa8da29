//! A client's connection to the relay and the state it keeps in sync.
//!
//! The session owns the stroke history and the presence table and is the
//! only place that talks to the transport. Inbound frames are decoded and
//! applied here; local edits are applied first and transmitted only while
//! the connection is open. Nothing is queued or retried.

use crate::config::ClientConfig;
use crate::history::{HistorySync, StrokeHistory};
use crate::presence::{Participant, PresenceTable};
use crate::protocol::Message;
use crate::render::{Scene, Surface};
use crate::stroke::Stroke;
use crate::sync::{ConnectionState, PlatformWebSocket, SyncEvent, Transport};

/// One participant's live connection to a shared board.
pub struct Session<T: Transport, S: Surface = Scene> {
    transport: T,
    state: ConnectionState,
    local: Participant,
    history: StrokeHistory<S>,
    presence: PresenceTable,
}

impl<S: Surface> Session<PlatformWebSocket, S> {
    /// Open a WebSocket to the relay named in `config`.
    ///
    /// Never fails: if the socket cannot even be started, the session is
    /// returned already `Closed` and works as a local-only board.
    pub fn connect(config: &ClientConfig, surface: S) -> Self {
        let mut transport = PlatformWebSocket::new();
        let started = transport.connect(&config.relay_url);
        let mut session = Self::new(transport, Participant::from_config(config), surface);
        if let Err(e) = started {
            log::warn!("Failed to connect to {}: {}", config.relay_url, e);
            session.state = ConnectionState::Closed;
        }
        session
    }
}

impl<T: Transport, S: Surface> Session<T, S> {
    /// Wrap an already-started transport. The session begins `Connecting`.
    pub fn new(transport: T, local: Participant, surface: S) -> Self {
        let mut presence = PresenceTable::new();
        presence.upsert(local.clone());
        Self {
            transport,
            state: ConnectionState::Connecting,
            local,
            history: StrokeHistory::new(surface),
            presence,
        }
    }

    /// Drain transport events and apply them.
    ///
    /// Returns true if the board or presence may have changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        for event in self.transport.poll_events() {
            match event {
                SyncEvent::Connected => {
                    if self.state == ConnectionState::Closed {
                        continue;
                    }
                    log::info!("Connected to relay as {}", self.local.name);
                    self.state = ConnectionState::Open;
                    self.send(&Message::Join(self.local.without_position()));
                }
                SyncEvent::Disconnected => {
                    log::info!("Disconnected from relay");
                    self.state = ConnectionState::Closed;
                }
                SyncEvent::Error { message } => {
                    log::warn!("Relay connection error: {}", message);
                    self.state = ConnectionState::Closed;
                }
                SyncEvent::Message(text) => changed |= self.handle_message(&text),
            }
        }
        changed
    }

    /// Decode and apply one inbound frame.
    ///
    /// Malformed frames are dropped. Returns true if something was applied.
    pub fn handle_message(&mut self, text: &str) -> bool {
        let message = match Message::decode(text) {
            Ok(message) => message,
            Err(e) => {
                log::debug!("Dropping inbound frame: {}", e);
                return false;
            }
        };

        match message {
            Message::Join(participant) | Message::Cursor(participant) => {
                self.presence.upsert(participant);
                true
            }
            Message::Stroke(stroke) => self.history.apply_remote_stroke(stroke),
            Message::Undo(snapshot) | Message::Redo(snapshot) => {
                self.history.apply_history_snapshot(snapshot.strokes);
                true
            }
        }
    }

    /// Commit a local stroke and broadcast it if connected.
    ///
    /// A sent stroke is held in flight until the relay echoes it, so its
    /// final position follows the relay's order.
    pub fn publish_stroke(&mut self, stroke: Stroke) {
        let id = stroke.id();
        let message = Message::Stroke(stroke.clone());
        self.history.commit(stroke);
        if self.send(&message) {
            self.history.mark_in_flight(id);
        }
    }

    /// Record the local pointer position and broadcast it if connected.
    pub fn publish_cursor(&mut self, x: f64, y: f64) {
        let positioned = self.local.at(x, y);
        self.presence.upsert(positioned.clone());
        self.send(&Message::Cursor(positioned));
    }

    /// Undo the last committed stroke. Returns false if there was nothing to
    /// undo, in which case nothing is sent.
    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(snapshot) => {
                self.send(&Message::Undo(snapshot));
                true
            }
            None => false,
        }
    }

    /// Redo the last undone stroke. Returns false if there was nothing to
    /// redo, in which case nothing is sent.
    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(snapshot) => {
                self.send(&Message::Redo(snapshot));
                true
            }
            None => false,
        }
    }

    /// Transmit if open. Failures are logged and swallowed.
    ///
    /// Returns whether the frame was handed to the transport.
    fn send(&self, message: &Message) -> bool {
        if self.state != ConnectionState::Open {
            log::debug!("Not connected, keeping {} local", message.kind());
            return false;
        }
        let text = match message.encode() {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Failed to encode {}: {}", message.kind(), e);
                return false;
            }
        };
        match self.transport.send(&text) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Failed to send {}: {}", message.kind(), e);
                false
            }
        }
    }

    pub fn history(&self) -> &StrokeHistory<S> {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut StrokeHistory<S> {
        &mut self.history
    }

    pub fn presence(&self) -> &PresenceTable {
        &self.presence
    }

    /// The local participant (without position).
    pub fn local(&self) -> &Participant {
        &self.local
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Open
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}
