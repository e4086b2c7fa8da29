//! Stroke definitions for the shared whiteboard.
//!
//! A [`Stroke`] is one committed drawing action. Strokes are immutable once
//! built: the only way to "change" the board is to move strokes between the
//! committed and undone stacks of the history.

use kurbo::Point;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::render::{Paint, Primitive, shape_primitive};

/// Unique identifier for strokes.
pub type StrokeId = Uuid;

/// Color used by the eraser (same as the board background).
pub const ERASER_COLOR: &str = "#ffffff";

/// Text strokes are drawn at this multiple of the stroke weight.
pub const TEXT_SCALE: f64 = 4.0;

/// Kind of a stroke, without its geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrokeKind {
    Freehand,
    Eraser,
    Line,
    Rectangle,
    Circle,
    Text,
}

impl StrokeKind {
    /// Whether strokes of this kind are two-point shapes (anchor + release).
    pub fn is_shape(self) -> bool {
        matches!(self, StrokeKind::Line | StrokeKind::Rectangle | StrokeKind::Circle)
    }
}

/// Kind-specific geometry of a stroke.
///
/// The `type` tag and camelCase field names match what browser peers send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum StrokeGeometry {
    /// One short brush segment per pointer-move sample.
    #[serde(rename = "brush")]
    Freehand {
        from_x: f64,
        from_y: f64,
        to_x: f64,
        to_y: f64,
    },
    /// One short eraser segment per pointer-move sample.
    #[serde(rename = "eraser")]
    Eraser {
        from_x: f64,
        from_y: f64,
        to_x: f64,
        to_y: f64,
    },
    #[serde(rename = "line")]
    Line {
        start_x: f64,
        start_y: f64,
        end_x: f64,
        end_y: f64,
    },
    #[serde(rename = "rect")]
    Rectangle {
        start_x: f64,
        start_y: f64,
        end_x: f64,
        end_y: f64,
    },
    #[serde(rename = "circle")]
    Circle {
        start_x: f64,
        start_y: f64,
        end_x: f64,
        end_y: f64,
    },
    #[serde(rename = "text")]
    Text { x: f64, y: f64, text: String },
}

impl StrokeGeometry {
    /// The kind of stroke this geometry describes.
    pub fn kind(&self) -> StrokeKind {
        match self {
            StrokeGeometry::Freehand { .. } => StrokeKind::Freehand,
            StrokeGeometry::Eraser { .. } => StrokeKind::Eraser,
            StrokeGeometry::Line { .. } => StrokeKind::Line,
            StrokeGeometry::Rectangle { .. } => StrokeKind::Rectangle,
            StrokeGeometry::Circle { .. } => StrokeKind::Circle,
            StrokeGeometry::Text { .. } => StrokeKind::Text,
        }
    }

    fn two_point(kind: StrokeKind, start: Point, end: Point) -> Option<Self> {
        let (x0, y0, x1, y1) = (start.x, start.y, end.x, end.y);
        let geometry = match kind {
            StrokeKind::Freehand => StrokeGeometry::Freehand { from_x: x0, from_y: y0, to_x: x1, to_y: y1 },
            StrokeKind::Eraser => StrokeGeometry::Eraser { from_x: x0, from_y: y0, to_x: x1, to_y: y1 },
            StrokeKind::Line => StrokeGeometry::Line { start_x: x0, start_y: y0, end_x: x1, end_y: y1 },
            StrokeKind::Rectangle => StrokeGeometry::Rectangle { start_x: x0, start_y: y0, end_x: x1, end_y: y1 },
            StrokeKind::Circle => StrokeGeometry::Circle { start_x: x0, start_y: y0, end_x: x1, end_y: y1 },
            StrokeKind::Text => return None,
        };
        Some(geometry)
    }

    /// Start and end points for segment and shape geometry.
    pub fn endpoints(&self) -> Option<(Point, Point)> {
        match *self {
            StrokeGeometry::Freehand { from_x, from_y, to_x, to_y }
            | StrokeGeometry::Eraser { from_x, from_y, to_x, to_y } => {
                Some((Point::new(from_x, from_y), Point::new(to_x, to_y)))
            }
            StrokeGeometry::Line { start_x, start_y, end_x, end_y }
            | StrokeGeometry::Rectangle { start_x, start_y, end_x, end_y }
            | StrokeGeometry::Circle { start_x, start_y, end_x, end_y } => {
                Some((Point::new(start_x, start_y), Point::new(end_x, end_y)))
            }
            StrokeGeometry::Text { .. } => None,
        }
    }
}

/// An immutable record of one completed drawing action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    id: StrokeId,
    #[serde(flatten)]
    geometry: StrokeGeometry,
    color: String,
    /// Brush/line width. Browser peers call this `size`.
    #[serde(rename = "size", alias = "weight")]
    weight: u32,
}

impl Stroke {
    fn new(geometry: StrokeGeometry, color: impl Into<String>, weight: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            geometry,
            color: color.into(),
            weight: weight.max(1),
        }
    }

    /// A freehand brush segment.
    pub fn freehand(from: Point, to: Point, color: impl Into<String>, weight: u32) -> Self {
        let geometry = StrokeGeometry::Freehand { from_x: from.x, from_y: from.y, to_x: to.x, to_y: to.y };
        Self::new(geometry, color, weight)
    }

    /// An eraser segment, painted in the background color.
    pub fn eraser(from: Point, to: Point, weight: u32) -> Self {
        let geometry = StrokeGeometry::Eraser { from_x: from.x, from_y: from.y, to_x: to.x, to_y: to.y };
        Self::new(geometry, ERASER_COLOR, weight)
    }

    pub fn line(start: Point, end: Point, color: impl Into<String>, weight: u32) -> Self {
        let geometry = StrokeGeometry::Line { start_x: start.x, start_y: start.y, end_x: end.x, end_y: end.y };
        Self::new(geometry, color, weight)
    }

    pub fn rectangle(start: Point, end: Point, color: impl Into<String>, weight: u32) -> Self {
        let geometry = StrokeGeometry::Rectangle { start_x: start.x, start_y: start.y, end_x: end.x, end_y: end.y };
        Self::new(geometry, color, weight)
    }

    /// A circle centered on `start` passing through `end`.
    pub fn circle(start: Point, end: Point, color: impl Into<String>, weight: u32) -> Self {
        let geometry = StrokeGeometry::Circle { start_x: start.x, start_y: start.y, end_x: end.x, end_y: end.y };
        Self::new(geometry, color, weight)
    }

    /// A two-point stroke of the given kind.
    ///
    /// Returns `None` for text, which has no second point. Eraser strokes
    /// ignore `color`.
    pub fn two_point(kind: StrokeKind, start: Point, end: Point, color: impl Into<String>, weight: u32) -> Option<Self> {
        if kind == StrokeKind::Eraser {
            return Some(Self::eraser(start, end, weight));
        }
        StrokeGeometry::two_point(kind, start, end).map(|geometry| Self::new(geometry, color, weight))
    }

    /// A text stroke anchored at `at`.
    pub fn text(at: Point, text: impl Into<String>, color: impl Into<String>, weight: u32) -> Self {
        Self::new(
            StrokeGeometry::Text {
                x: at.x,
                y: at.y,
                text: text.into(),
            },
            color,
            weight,
        )
    }

    pub fn id(&self) -> StrokeId {
        self.id
    }

    pub fn kind(&self) -> StrokeKind {
        self.geometry.kind()
    }

    pub fn geometry(&self) -> &StrokeGeometry {
        &self.geometry
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn weight(&self) -> u32 {
        self.weight
    }

    /// The primitive and paint used to rasterize this stroke.
    pub fn primitive(&self) -> (Primitive, Paint) {
        let paint = Paint::solid(&self.color, f64::from(self.weight));
        let primitive = match &self.geometry {
            StrokeGeometry::Text { x, y, text } => Primitive::Text {
                origin: Point::new(*x, *y),
                text: text.clone(),
                font_size: f64::from(self.weight) * TEXT_SCALE,
            },
            geometry => {
                // Every non-text geometry has endpoints.
                let (start, end) = geometry.endpoints().unwrap_or_default();
                shape_primitive(geometry.kind(), start, end)
            }
        };
        (primitive, paint)
    }
}
