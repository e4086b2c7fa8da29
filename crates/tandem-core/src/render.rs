//! Drawing surface abstraction.
//!
//! The history store owns a [`Surface`] and redraws it from scratch after
//! every change, so the visible board always equals the committed sequence.
//! Rasterization itself lives behind the trait; [`Scene`] is a recording
//! implementation used by headless clients.

use kurbo::{Circle, Line, Point, Rect};
use thiserror::Error;

use crate::stroke::{Stroke, StrokeKind};

/// Dash pattern (on, off) used for shape previews.
pub const PREVIEW_DASH: (f64, f64) = (6.0, 4.0);

/// Surface errors.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("This surface cannot export images")]
    ExportUnsupported,
    #[error("Image encoding failed: {0}")]
    Encode(String),
}

/// A geometric primitive ready for rasterization.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    /// A straight, round-capped segment.
    Segment(Line),
    /// A rectangle outline with normalized (non-negative) extents.
    Rect(Rect),
    /// A circle outline.
    Circle(Circle),
    /// A run of text with its baseline starting at `origin`.
    Text {
        origin: Point,
        text: String,
        font_size: f64,
    },
}

/// How a primitive is painted.
#[derive(Debug, Clone, PartialEq)]
pub struct Paint {
    /// CSS-style color string (`#rgb`, `#rrggbb`, ...).
    pub color: String,
    /// Stroke width in pixels.
    pub width: f64,
    /// Dashed outline (previews only).
    pub dashed: bool,
}

impl Paint {
    pub fn solid(color: &str, width: f64) -> Self {
        Self {
            color: color.to_string(),
            width,
            dashed: false,
        }
    }

    pub fn dashed(color: &str, width: f64) -> Self {
        Self {
            color: color.to_string(),
            width,
            dashed: true,
        }
    }
}

/// Bounding box of two corner points, independent of drag direction.
pub fn normalized_rect(a: Point, b: Point) -> Rect {
    Rect::new(a.x.min(b.x), a.y.min(b.y), a.x.max(b.x), a.y.max(b.y))
}

/// Primitive for a two-point stroke kind.
///
/// Freehand, eraser and line strokes become segments. Rectangles use the
/// normalized bounding box; circles are centered on `start` with a radius
/// equal to the distance to `end`. Text has no two-point form and falls
/// back to a degenerate segment.
pub fn shape_primitive(kind: StrokeKind, start: Point, end: Point) -> Primitive {
    match kind {
        StrokeKind::Rectangle => Primitive::Rect(normalized_rect(start, end)),
        StrokeKind::Circle => Primitive::Circle(Circle::new(start, start.distance(end))),
        StrokeKind::Freehand | StrokeKind::Eraser | StrokeKind::Line => Primitive::Segment(Line::new(start, end)),
        StrokeKind::Text => Primitive::Segment(Line::new(start, start)),
    }
}

/// Trait for drawing surfaces.
///
/// Implementations can rasterize into a pixel buffer, forward to a GPU
/// renderer, or simply record commands.
pub trait Surface {
    /// Clear the whole surface to the background.
    fn clear(&mut self);

    /// Draw one primitive on top of everything drawn so far.
    fn draw(&mut self, primitive: &Primitive, paint: &Paint);

    /// Encode the current contents as a PNG image.
    fn export_png(&self) -> Result<Vec<u8>, SurfaceError> {
        Err(SurfaceError::ExportUnsupported)
    }
}

/// Clear `surface` and draw `strokes` in order (later strokes on top).
pub fn redraw<S: Surface + ?Sized>(surface: &mut S, strokes: &[Stroke]) {
    surface.clear();
    for stroke in strokes {
        let (primitive, paint) = stroke.primitive();
        surface.draw(&primitive, &paint);
    }
}

/// A recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    pub primitive: Primitive,
    pub paint: Paint,
}

/// Surface that records draw calls as a display list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    commands: Vec<DrawCommand>,
    clears: usize,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw calls since the last clear, back to front.
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// How many times the surface has been cleared.
    pub fn clear_count(&self) -> usize {
        self.clears
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Surface for Scene {
    fn clear(&mut self) {
        self.commands.clear();
        self.clears += 1;
    }

    fn draw(&mut self, primitive: &Primitive, paint: &Paint) {
        self.commands.push(DrawCommand {
            primitive: primitive.clone(),
            paint: paint.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangle_direction_independent() {
        let forward = Stroke::rectangle(Point::new(10.0, 10.0), Point::new(50.0, 50.0), "#000", 2);
        let backward = Stroke::rectangle(Point::new(50.0, 50.0), Point::new(10.0, 10.0), "#000", 2);

        assert_eq!(forward.primitive(), backward.primitive());
        assert_eq!(
            forward.primitive().0,
            Primitive::Rect(Rect::new(10.0, 10.0, 50.0, 50.0))
        );
    }

    #[test]
    fn test_circle_radius_is_distance() {
        let stroke = Stroke::circle(Point::new(0.0, 0.0), Point::new(3.0, 4.0), "#000", 1);
        match stroke.primitive().0 {
            Primitive::Circle(circle) => {
                assert_eq!(circle.center, Point::new(0.0, 0.0));
                assert!((circle.radius - 5.0).abs() < f64::EPSILON);
            }
            other => panic!("Expected circle, got {other:?}"),
        }
    }

    #[test]
    fn test_text_font_scales_with_weight() {
        let stroke = Stroke::text(Point::new(5.0, 6.0), "hello", "#123456", 3);
        let (primitive, paint) = stroke.primitive();
        assert_eq!(
            primitive,
            Primitive::Text {
                origin: Point::new(5.0, 6.0),
                text: "hello".to_string(),
                font_size: 12.0,
            }
        );
        assert_eq!(paint, Paint::solid("#123456", 3.0));
    }

    #[test]
    fn test_redraw_replays_in_order() {
        let strokes = vec![
            Stroke::line(Point::ZERO, Point::new(10.0, 0.0), "#000", 1),
            Stroke::rectangle(Point::ZERO, Point::new(5.0, 5.0), "#f00", 2),
        ];
        let mut scene = Scene::new();
        redraw(&mut scene, &strokes);

        assert_eq!(scene.commands().len(), 2);
        assert!(matches!(scene.commands()[0].primitive, Primitive::Segment(_)));
        assert!(matches!(scene.commands()[1].primitive, Primitive::Rect(_)));
    }

    #[test]
    fn test_redraw_is_idempotent() {
        let strokes = vec![
            Stroke::freehand(Point::ZERO, Point::new(1.0, 1.0), "#000", 3),
            Stroke::circle(Point::new(4.0, 4.0), Point::new(8.0, 4.0), "#0f0", 2),
            Stroke::text(Point::new(1.0, 1.0), "x", "#00f", 1),
        ];
        let mut once = Scene::new();
        redraw(&mut once, &strokes);
        let mut twice = Scene::new();
        redraw(&mut twice, &strokes);
        redraw(&mut twice, &strokes);

        assert_eq!(once.commands(), twice.commands());
    }

    #[test]
    fn test_scene_cannot_export() {
        let scene = Scene::new();
        assert!(matches!(scene.export_png(), Err(SurfaceError::ExportUnsupported)));
    }
}
