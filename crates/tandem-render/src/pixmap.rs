//! Software RGBA surface.

use kurbo::{Circle, Line, Point, Rect, Vec2};
use peniko::Color;
use tandem_core::render::{PREVIEW_DASH, Paint, Primitive, Surface, SurfaceError};

use crate::renderer::{RendererError, parse_hex_color};

/// Text placed on the board. Glyph rendering is left to the UI layer, which
/// overlays these labels on top of the raster.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLabel {
    pub origin: Point,
    pub text: String,
    pub font_size: f64,
    pub color: Color,
}

/// An RGBA8 pixel buffer implementing [`Surface`].
///
/// Strokes are drawn with round caps by testing each pixel center against
/// the distance to the primitive, which keeps the output independent of
/// drawing direction.
#[derive(Debug, Clone)]
pub struct Pixmap {
    width: u32,
    height: u32,
    background: [u8; 4],
    data: Vec<u8>,
    labels: Vec<TextLabel>,
}

impl Pixmap {
    /// Create a white pixmap.
    pub fn new(width: u32, height: u32) -> Result<Self, RendererError> {
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4))
            .filter(|&n| n > 0)
            .ok_or(RendererError::InvalidSize { width, height })?;

        let background = [255, 255, 255, 255];
        Ok(Self {
            width,
            height,
            background,
            data: background.repeat(len / 4),
            labels: Vec::new(),
        })
    }

    /// Set the background color used by `clear`.
    pub fn with_background(mut self, color: Color) -> Self {
        self.background = rgba(color);
        self.clear();
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA8 bytes, row-major.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Text drawn since the last clear, back to front.
    pub fn labels(&self) -> &[TextLabel] {
        &self.labels
    }

    /// The pixel at `(x, y)`, or `None` outside the buffer.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.index(x, y);
        Some([self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]])
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    fn blend(&mut self, x: u32, y: u32, color: [u8; 4]) {
        let i = self.index(x, y);
        let alpha = u32::from(color[3]);
        if alpha == 255 {
            self.data[i..i + 4].copy_from_slice(&color);
            return;
        }
        for c in 0..3 {
            let src = u32::from(color[c]);
            let dst = u32::from(self.data[i + c]);
            self.data[i + c] = ((src * alpha + dst * (255 - alpha) + 127) / 255) as u8;
        }
        let dst_alpha = u32::from(self.data[i + 3]);
        self.data[i + 3] = (alpha + dst_alpha * (255 - alpha) / 255) as u8;
    }

    /// Paint every pixel whose center lies within `bounds` and passes `hit`.
    fn fill_where(&mut self, bounds: Rect, color: [u8; 4], hit: impl Fn(Point) -> bool) {
        let x0 = bounds.x0.floor().max(0.0) as u32;
        let y0 = bounds.y0.floor().max(0.0) as u32;
        let x1 = (bounds.x1.ceil().max(0.0) as u32).min(self.width);
        let y1 = (bounds.y1.ceil().max(0.0) as u32).min(self.height);

        for y in y0..y1 {
            for x in x0..x1 {
                let center = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                if hit(center) {
                    self.blend(x, y, color);
                }
            }
        }
    }

    fn stroke_segment(&mut self, line: Line, paint: &Paint) {
        let color = rgba(parse_hex_color(&paint.color));
        let half = half_width(paint.width);
        let bounds = Rect::from_points(line.p0, line.p1).inflate(half, half);
        let dashed = paint.dashed;

        self.fill_where(bounds, color, |p| {
            let (distance, along) = segment_distance(p, line.p0, line.p1);
            distance <= half && (!dashed || dash_on(along))
        });
    }

    fn stroke_rect(&mut self, rect: Rect, paint: &Paint) {
        let corners = [
            Point::new(rect.x0, rect.y0),
            Point::new(rect.x1, rect.y0),
            Point::new(rect.x1, rect.y1),
            Point::new(rect.x0, rect.y1),
        ];
        for i in 0..4 {
            self.stroke_segment(Line::new(corners[i], corners[(i + 1) % 4]), paint);
        }
    }

    fn stroke_circle(&mut self, circle: Circle, paint: &Paint) {
        let color = rgba(parse_hex_color(&paint.color));
        let half = half_width(paint.width);
        let reach = circle.radius + half;
        let bounds = Rect::new(
            circle.center.x - reach,
            circle.center.y - reach,
            circle.center.x + reach,
            circle.center.y + reach,
        );
        let dashed = paint.dashed;

        self.fill_where(bounds, color, |p| {
            let offset = p - circle.center;
            if (offset.hypot() - circle.radius).abs() > half {
                return false;
            }
            // Arc length from the positive x axis.
            let angle = offset.atan2().rem_euclid(std::f64::consts::TAU);
            !dashed || dash_on(angle * circle.radius)
        });
    }

    /// Encode as an 8-bit RGBA PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>, SurfaceError> {
        let mut png_data = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut png_data, self.width, self.height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder
                .write_header()
                .map_err(|e| SurfaceError::Encode(e.to_string()))?;
            writer
                .write_image_data(&self.data)
                .map_err(|e| SurfaceError::Encode(e.to_string()))?;
        }
        Ok(png_data)
    }
}

impl Surface for Pixmap {
    fn clear(&mut self) {
        for px in self.data.chunks_exact_mut(4) {
            px.copy_from_slice(&self.background);
        }
        self.labels.clear();
    }

    fn draw(&mut self, primitive: &Primitive, paint: &Paint) {
        match primitive {
            Primitive::Segment(line) => self.stroke_segment(*line, paint),
            Primitive::Rect(rect) => self.stroke_rect(*rect, paint),
            Primitive::Circle(circle) => self.stroke_circle(*circle, paint),
            Primitive::Text { origin, text, font_size } => self.labels.push(TextLabel {
                origin: *origin,
                text: text.clone(),
                font_size: *font_size,
                color: parse_hex_color(&paint.color),
            }),
        }
    }

    fn export_png(&self) -> Result<Vec<u8>, SurfaceError> {
        self.encode_png()
    }
}

fn rgba(color: Color) -> [u8; 4] {
    let c = color.to_rgba8();
    [c.r, c.g, c.b, c.a]
}

/// Hairlines still cover the pixel they pass through.
fn half_width(width: f64) -> f64 {
    (width / 2.0).max(0.5)
}

/// Distance from `p` to segment `ab`, and how far along the segment the
/// closest point lies.
fn segment_distance(p: Point, a: Point, b: Point) -> (f64, f64) {
    let seg: Vec2 = b - a;
    let pv: Vec2 = p - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return (pv.hypot(), 0.0);
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = a + seg * t;
    (p.distance(proj), t * len_sq.sqrt())
}

fn dash_on(distance: f64) -> bool {
    let (on, off) = PREVIEW_DASH;
    distance.rem_euclid(on + off) < on
}
