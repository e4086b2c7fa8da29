//! Tool system: turns pointer input into strokes and previews.

use kurbo::Point;
use serde::{Deserialize, Serialize};

use crate::input::MouseButton;
use crate::render::{Paint, Primitive, shape_primitive};
use crate::stroke::{ERASER_COLOR, Stroke, StrokeKind};

/// Default brush/line width.
pub const DEFAULT_WEIGHT: u32 = 3;

/// Default drawing color when none is configured.
pub const DEFAULT_COLOR: &str = "#000000";

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ToolKind {
    #[default]
    Brush,
    Eraser,
    Line,
    Rectangle,
    Circle,
    Text,
}

impl ToolKind {
    /// Freehand tools commit one segment per pointer move.
    pub fn is_freehand(self) -> bool {
        matches!(self, ToolKind::Brush | ToolKind::Eraser)
    }

    /// Shape tools preview while dragging and commit on release.
    pub fn is_shape(self) -> bool {
        self.stroke_kind().is_shape()
    }

    /// The kind of stroke this tool produces.
    pub fn stroke_kind(self) -> StrokeKind {
        match self {
            ToolKind::Brush => StrokeKind::Freehand,
            ToolKind::Eraser => StrokeKind::Eraser,
            ToolKind::Line => StrokeKind::Line,
            ToolKind::Rectangle => StrokeKind::Rectangle,
            ToolKind::Circle => StrokeKind::Circle,
            ToolKind::Text => StrokeKind::Text,
        }
    }
}

/// State of a tool interaction.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GestureState {
    /// Waiting for a pointer-down.
    #[default]
    Idle,
    /// A pointer button is held.
    Drawing {
        /// Freehand: last sampled point. Shapes: fixed press point.
        anchor: Point,
    },
}

/// Synchronous free-text input, requested when the text tool is clicked.
pub trait TextPrompt {
    /// Ask the user for text to place at `at`. `None` means cancelled.
    fn request_text(&mut self, at: Point) -> Option<String>;
}

impl<F> TextPrompt for F
where
    F: FnMut(Point) -> Option<String>,
{
    fn request_text(&mut self, at: Point) -> Option<String> {
        self(at)
    }
}

/// A dashed outline shown while a shape is being dragged.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapePreview {
    pub primitive: Primitive,
    pub paint: Paint,
}

/// What a pointer event produced.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureEffect {
    /// No visible effect.
    Nothing,
    /// A stroke to commit and publish.
    Commit(Stroke),
    /// Replace the preview overlay with this outline.
    Preview(ShapePreview),
    /// A finished shape: commit it and clear the preview overlay.
    Finish(Stroke),
}

/// Preview outline for a shape drag from `anchor` to `current`.
///
/// Shares the geometry code used for the committed stroke so the preview
/// and the final shape never disagree. Returns `None` for non-shape tools.
pub fn preview_primitive(tool: ToolKind, anchor: Point, current: Point, color: &str, weight: u32) -> Option<ShapePreview> {
    if !tool.is_shape() {
        return None;
    }
    Some(ShapePreview {
        primitive: shape_primitive(tool.stroke_kind(), anchor, current),
        paint: Paint::dashed(color, f64::from(weight)),
    })
}

/// Manages the current tool, its settings and the active gesture.
#[derive(Debug, Clone)]
pub struct ToolManager {
    /// Currently selected tool.
    pub current_tool: ToolKind,
    /// Color applied to new strokes (the eraser ignores it).
    pub color: String,
    /// Width applied to new strokes.
    pub weight: u32,
    /// Current state of the tool.
    pub state: GestureState,
}

impl Default for ToolManager {
    fn default() -> Self {
        Self::new(DEFAULT_COLOR)
    }
}

impl ToolManager {
    /// Create a tool manager drawing in `color`.
    pub fn new(color: impl Into<String>) -> Self {
        Self {
            current_tool: ToolKind::default(),
            color: color.into(),
            weight: DEFAULT_WEIGHT,
            state: GestureState::Idle,
        }
    }

    /// Set the current tool. Any gesture in progress is dropped.
    pub fn set_tool(&mut self, tool: ToolKind) {
        self.current_tool = tool;
        self.state = GestureState::Idle;
    }

    pub fn set_color(&mut self, color: impl Into<String>) {
        self.color = color.into();
    }

    /// Set the stroke width (at least 1).
    pub fn set_weight(&mut self, weight: u32) {
        self.weight = weight.max(1);
    }

    /// Check if a gesture is in progress.
    pub fn is_active(&self) -> bool {
        matches!(self.state, GestureState::Drawing { .. })
    }

    /// Begin a gesture.
    ///
    /// Only the primary button draws. The text tool asks `prompt` for content
    /// right away and commits it without entering the drawing state.
    pub fn pointer_down(&mut self, position: Point, button: MouseButton, prompt: &mut dyn TextPrompt) -> GestureEffect {
        if !button.is_primary() {
            return GestureEffect::Nothing;
        }

        if self.current_tool == ToolKind::Text {
            self.state = GestureState::Idle;
            return match prompt.request_text(position) {
                Some(text) if !text.is_empty() => {
                    GestureEffect::Commit(Stroke::text(position, text, self.color.clone(), self.weight))
                }
                _ => GestureEffect::Nothing,
            };
        }

        self.state = GestureState::Drawing { anchor: position };
        GestureEffect::Nothing
    }

    /// Continue a gesture.
    ///
    /// Freehand tools commit a segment from the last sample on every move
    /// (no distance threshold) and advance the anchor. Shape tools preview
    /// from the fixed anchor.
    pub fn pointer_move(&mut self, position: Point) -> GestureEffect {
        let GestureState::Drawing { anchor } = self.state else {
            return GestureEffect::Nothing;
        };

        if self.current_tool.is_freehand() {
            let stroke = match self.current_tool {
                ToolKind::Eraser => Stroke::eraser(anchor, position, self.weight),
                _ => Stroke::freehand(anchor, position, self.color.clone(), self.weight),
            };
            self.state = GestureState::Drawing { anchor: position };
            return GestureEffect::Commit(stroke);
        }

        match preview_primitive(self.current_tool, anchor, position, &self.color, self.weight) {
            Some(preview) => GestureEffect::Preview(preview),
            None => GestureEffect::Nothing,
        }
    }

    /// End a gesture. Releases anywhere count, but only of the primary button.
    ///
    /// Shape tools commit one stroke from the anchor to `position`; freehand
    /// tools already committed their last segment on the final move.
    pub fn pointer_up(&mut self, position: Point, button: MouseButton) -> GestureEffect {
        if !button.is_primary() {
            return GestureEffect::Nothing;
        }

        let GestureState::Drawing { anchor } = std::mem::take(&mut self.state) else {
            return GestureEffect::Nothing;
        };

        if !self.current_tool.is_shape() {
            return GestureEffect::Nothing;
        }

        match Stroke::two_point(self.current_tool.stroke_kind(), anchor, position, self.color.clone(), self.weight) {
            Some(stroke) => GestureEffect::Finish(stroke),
            None => GestureEffect::Nothing,
        }
    }

    /// Effective color for strokes from the current tool.
    pub fn stroke_color(&self) -> &str {
        match self.current_tool {
            ToolKind::Eraser => ERASER_COLOR,
            _ => &self.color,
        }
    }
}
