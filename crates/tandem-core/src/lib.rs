//! Tandem Core Library
//!
//! Platform-agnostic sync core for the Tandem shared whiteboard: strokes,
//! the wire protocol, undo/redo history, presence and the relay connection.

pub mod canvas;
pub mod config;
pub mod history;
pub mod input;
pub mod presence;
pub mod protocol;
pub mod render;
pub mod session;
pub mod stroke;
pub mod sync;
pub mod tools;

#[cfg(test)]
mod testing;

pub use canvas::Canvas;
pub use config::ClientConfig;
pub use history::{HistorySync, StrokeHistory};
pub use input::{MouseButton, PointerEvent};
pub use presence::{Participant, ParticipantId, PresenceTable};
pub use protocol::{HistorySnapshot, Message, ProtocolError};
pub use render::{Paint, Primitive, Scene, Surface, SurfaceError};
pub use session::Session;
pub use stroke::{Stroke, StrokeGeometry, StrokeId, StrokeKind};
pub use sync::{ConnectionState, PlatformWebSocket, SyncEvent, Transport, TransportError};
pub use tools::{GestureEffect, TextPrompt, ToolKind, ToolManager};
