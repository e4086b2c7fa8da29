//! The whiteboard as seen by a UI layer.

use crate::config::ClientConfig;
use crate::input::PointerEvent;
use crate::presence::{Participant, PresenceTable};
use crate::render::{Scene, Surface, SurfaceError};
use crate::session::Session;
use crate::stroke::Stroke;
use crate::sync::{ConnectionState, PlatformWebSocket, Transport};
use crate::tools::{GestureEffect, TextPrompt, ToolKind, ToolManager};

/// A shared board: the session, the tool state and the preview overlay.
///
/// The main surface (inside the session's history) only ever shows committed
/// strokes. Shape previews go to the overlay, which is cleared whenever a
/// preview is replaced or the gesture ends.
pub struct Canvas<T: Transport, S: Surface = Scene> {
    session: Session<T, S>,
    tools: ToolManager,
    overlay: S,
}

impl<S: Surface> Canvas<PlatformWebSocket, S> {
    /// Connect to the relay in `config` and draw onto `surface`/`overlay`.
    pub fn connect(config: &ClientConfig, surface: S, overlay: S) -> Self {
        Self::new(Session::connect(config, surface), overlay)
    }
}

impl<T: Transport, S: Surface> Canvas<T, S> {
    /// Drawing color defaults to the local participant's presence color.
    pub fn new(session: Session<T, S>, mut overlay: S) -> Self {
        overlay.clear();
        let tools = ToolManager::new(session.local().color.clone());
        Self { session, tools, overlay }
    }

    /// Feed one pointer event. Returns true if anything visible changed.
    ///
    /// Every move is published as a cursor update, whether or not a gesture
    /// is in progress.
    pub fn handle_pointer(&mut self, event: PointerEvent, prompt: &mut dyn TextPrompt) -> bool {
        let effect = match event {
            PointerEvent::Down { position, button } => self.tools.pointer_down(position, button, prompt),
            PointerEvent::Move { position } => {
                self.session.publish_cursor(position.x, position.y);
                self.tools.pointer_move(position)
            }
            PointerEvent::Up { position, button } => {
                let effect = self.tools.pointer_up(position, button);
                if matches!(effect, GestureEffect::Nothing)
                    && button.is_primary()
                    && self.tools.current_tool.is_shape()
                {
                    // A drag that never moved leaves no preview behind.
                    self.overlay.clear();
                }
                effect
            }
        };
        self.apply(effect)
    }

    fn apply(&mut self, effect: GestureEffect) -> bool {
        match effect {
            GestureEffect::Nothing => false,
            GestureEffect::Commit(stroke) => {
                self.session.publish_stroke(stroke);
                true
            }
            GestureEffect::Preview(preview) => {
                self.overlay.clear();
                self.overlay.draw(&preview.primitive, &preview.paint);
                true
            }
            GestureEffect::Finish(stroke) => {
                self.overlay.clear();
                self.session.publish_stroke(stroke);
                true
            }
        }
    }

    /// Select a tool. Any gesture and preview in progress are dropped.
    pub fn set_tool(&mut self, tool: ToolKind) {
        self.tools.set_tool(tool);
        self.overlay.clear();
    }

    pub fn set_color(&mut self, color: impl Into<String>) {
        self.tools.set_color(color);
    }

    pub fn set_size(&mut self, size: u32) {
        self.tools.set_weight(size);
    }

    pub fn tool(&self) -> ToolKind {
        self.tools.current_tool
    }

    pub fn color(&self) -> &str {
        &self.tools.color
    }

    pub fn size(&self) -> u32 {
        self.tools.weight
    }

    pub fn tools(&self) -> &ToolManager {
        &self.tools
    }

    pub fn undo(&mut self) -> bool {
        self.session.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.session.redo()
    }

    /// Committed strokes, back to front.
    pub fn strokes(&self) -> &[Stroke] {
        self.session.history().committed()
    }

    pub fn presence(&self) -> &PresenceTable {
        self.session.presence()
    }

    /// Other participants, for cursors and the roster.
    pub fn peers(&self) -> Vec<&Participant> {
        self.session.presence().peers(self.session.local().id)
    }

    pub fn local(&self) -> &Participant {
        self.session.local()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.session.state()
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    /// Apply pending network events. Returns true if a repaint is needed.
    pub fn poll(&mut self) -> bool {
        self.session.poll()
    }

    /// Export the committed board as a PNG.
    pub fn export_image(&self) -> Result<Vec<u8>, SurfaceError> {
        self.session.history().surface().export_png()
    }

    /// The surface holding committed strokes.
    pub fn surface(&self) -> &S {
        self.session.history().surface()
    }

    /// The surface holding the shape preview.
    pub fn overlay(&self) -> &S {
        &self.overlay
    }

    pub fn session(&self) -> &Session<T, S> {
        &self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::MouseButton;
    use crate::protocol::Message;
    use crate::render::Primitive;
    use crate::stroke::StrokeKind;
    use crate::sync::SyncEvent;
    use crate::testing::{FakeTransport, LocalRelay};
    use crate::tools::DEFAULT_WEIGHT;
    use kurbo::Point;

    fn canvas(transport: FakeTransport) -> Canvas<FakeTransport> {
        let session = Session::new(transport, Participant::new("Ada", "#a855f7"), Scene::new());
        Canvas::new(session, Scene::new())
    }

    fn open_canvas() -> (Canvas<FakeTransport>, FakeTransport) {
        let transport = FakeTransport::new();
        transport.push(SyncEvent::Connected);
        let mut canvas = canvas(transport.clone());
        canvas.poll();
        (canvas, transport)
    }

    fn no_text() -> impl FnMut(Point) -> Option<String> {
        |_| None
    }

    fn down(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Down { position: Point::new(x, y), button: MouseButton::Left }
    }

    fn moved(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Move { position: Point::new(x, y) }
    }

    fn up(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Up { position: Point::new(x, y), button: MouseButton::Left }
    }

    fn sent_kinds(transport: &FakeTransport) -> Vec<&'static str> {
        transport.sent().iter().map(|t| Message::decode(t).unwrap().kind()).collect()
    }

    #[test]
    fn test_defaults() {
        let canvas = canvas(FakeTransport::new());
        assert_eq!(canvas.tool(), ToolKind::Brush);
        assert_eq!(canvas.color(), "#a855f7");
        assert_eq!(canvas.size(), DEFAULT_WEIGHT);
        assert_eq!(canvas.connection_state(), ConnectionState::Connecting);
        assert!(canvas.peers().is_empty());
    }

    #[test]
    fn test_freehand_drag_publishes_segments_and_cursors() {
        let (mut canvas, transport) = open_canvas();
        let mut prompt = no_text();

        canvas.handle_pointer(down(0.0, 0.0), &mut prompt);
        canvas.handle_pointer(moved(1.0, 1.0), &mut prompt);
        canvas.handle_pointer(moved(2.0, 2.0), &mut prompt);
        canvas.handle_pointer(up(2.0, 2.0), &mut prompt);

        assert_eq!(canvas.strokes().len(), 2);
        assert_eq!(sent_kinds(&transport), vec!["join", "cursor", "stroke", "cursor", "stroke"]);
        assert!(canvas.overlay().is_empty());
    }

    #[test]
    fn test_rectangle_preview_then_commit() {
        let (mut canvas, _) = open_canvas();
        let mut prompt = no_text();
        canvas.set_tool(ToolKind::Rectangle);

        canvas.handle_pointer(down(50.0, 50.0), &mut prompt);
        canvas.handle_pointer(moved(20.0, 20.0), &mut prompt);
        canvas.handle_pointer(moved(10.0, 10.0), &mut prompt);

        // Only the latest preview is visible and nothing is committed yet.
        assert_eq!(canvas.overlay().commands().len(), 1);
        assert!(canvas.overlay().commands()[0].paint.dashed);
        assert!(canvas.strokes().is_empty());

        canvas.handle_pointer(up(10.0, 10.0), &mut prompt);
        assert!(canvas.overlay().is_empty());
        assert_eq!(canvas.strokes().len(), 1);
        assert_eq!(canvas.strokes()[0].kind(), StrokeKind::Rectangle);
        assert_eq!(
            canvas.surface().commands()[0].primitive,
            Primitive::Rect(kurbo::Rect::new(10.0, 10.0, 50.0, 50.0))
        );
    }

    #[test]
    fn test_secondary_release_does_not_end_shape_drag() {
        let (mut canvas, _) = open_canvas();
        let mut prompt = no_text();
        canvas.set_tool(ToolKind::Circle);

        canvas.handle_pointer(down(10.0, 10.0), &mut prompt);
        canvas.handle_pointer(moved(14.0, 10.0), &mut prompt);
        let right_up = PointerEvent::Up { position: Point::new(14.0, 10.0), button: MouseButton::Right };
        assert!(!canvas.handle_pointer(right_up, &mut prompt));

        // The preview survives and the primary release still commits.
        assert_eq!(canvas.overlay().commands().len(), 1);
        assert!(canvas.strokes().is_empty());
        canvas.handle_pointer(up(16.0, 10.0), &mut prompt);
        assert_eq!(canvas.strokes().len(), 1);
        assert!(canvas.overlay().is_empty());
    }

    #[test]
    fn test_text_tool_uses_prompt() {
        let (mut canvas, _) = open_canvas();
        canvas.set_tool(ToolKind::Text);
        canvas.set_size(5);
        let mut prompt = |_: Point| Some("hi".to_string());

        assert!(canvas.handle_pointer(down(4.0, 4.0), &mut prompt));
        match &canvas.surface().commands()[0].primitive {
            Primitive::Text { text, font_size, .. } => {
                assert_eq!(text, "hi");
                assert_eq!(*font_size, 20.0);
            }
            other => panic!("Expected text, got {other:?}"),
        }
    }

    #[test]
    fn test_undo_redo_pass_through() {
        let (mut canvas, transport) = open_canvas();
        let mut prompt = no_text();
        canvas.set_tool(ToolKind::Line);
        canvas.handle_pointer(down(0.0, 0.0), &mut prompt);
        canvas.handle_pointer(up(5.0, 5.0), &mut prompt);

        assert!(canvas.undo());
        assert!(canvas.strokes().is_empty());
        assert!(canvas.redo());
        assert_eq!(canvas.strokes().len(), 1);
        assert!(!canvas.redo());

        assert_eq!(sent_kinds(&transport), vec!["join", "stroke", "undo", "redo"]);
    }

    #[test]
    fn test_export_unsupported_on_scene() {
        let canvas = canvas(FakeTransport::new());
        assert!(matches!(canvas.export_image(), Err(SurfaceError::ExportUnsupported)));
    }

    #[test]
    fn test_peers_see_each_other() {
        let mut relay = LocalRelay::new();
        let mut ada = canvas(relay.attach());
        let bob_session = Session::new(relay.attach(), Participant::new("Bob", "#f97316"), Scene::new());
        let mut bob = Canvas::new(bob_session, Scene::new());
        ada.poll();
        bob.poll();

        bob.handle_pointer(moved(7.0, 8.0), &mut no_text());
        relay.pump();
        ada.poll();
        bob.poll();

        let peers = ada.peers();
        assert_eq!(peers.len(), 1);
        assert_eq!(peers[0].name, "Bob");
        assert_eq!(peers[0].position(), Some(Point::new(7.0, 8.0)));
    }
}
