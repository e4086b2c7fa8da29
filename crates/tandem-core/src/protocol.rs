//! Wire protocol shared by clients and the relay.
//!
//! Every frame is one JSON object `{ "type": ..., "payload": ... }`:
//! ```json
//! { "type": "join",   "payload": { "id": "...", "name": "User-1234", "color": "#0ea5e9" } }
//! { "type": "stroke", "payload": { "id": "...", "type": "line", "startX": 0, ... } }
//! { "type": "cursor", "payload": { "id": "...", "name": "...", "color": "...", "x": 10, "y": 20 } }
//! { "type": "undo",   "payload": { "strokes": [ ... ] } }
//! { "type": "redo",   "payload": { "strokes": [ ... ] } }
//! ```
//! Frames carry no sequence number or timestamp; ordering is whatever order
//! the relay delivers them in.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::presence::Participant;
use crate::stroke::Stroke;

/// Protocol errors.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Malformed message: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("Failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),
}

/// A full copy of a committed history, sent on undo and redo.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistorySnapshot {
    pub strokes: Vec<Stroke>,
}

impl HistorySnapshot {
    pub fn new(strokes: Vec<Stroke>) -> Self {
        Self { strokes }
    }
}

/// A message exchanged through the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Message {
    /// A participant announcing itself right after connecting.
    Join(Participant),
    /// A newly committed stroke.
    Stroke(Stroke),
    /// A participant's pointer position.
    Cursor(Participant),
    /// The sender's committed history after an undo.
    Undo(HistorySnapshot),
    /// The sender's committed history after a redo.
    Redo(HistorySnapshot),
}

impl Message {
    /// Serialize to a JSON text frame.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    /// Parse a JSON text frame. Unknown message types are malformed.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Malformed)
    }

    /// The `type` tag of this message.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Join(_) => "join",
            Message::Stroke(_) => "stroke",
            Message::Cursor(_) => "cursor",
            Message::Undo(_) => "undo",
            Message::Redo(_) => "redo",
        }
    }
}
