//! Coordinate spaces and the conversions between them.
//!
//! Three spaces are reconciled here:
//! - **document space**: page units, origin top-left, y grows downward. This is
//!   what the annotation store keeps and it does not change with zoom.
//! - **canvas space**: document space scaled by the current zoom factor. Pointer
//!   events arrive in this space.
//! - **codec space**: page units, origin bottom-left, y grows upward. Only used
//!   when talking to a [`DocumentCodec`](crate::DocumentCodec).

use serde::{Deserialize, Serialize};

/// A point in document or canvas space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Component-wise difference `self - other`
    pub fn offset_from(&self, other: Point) -> (f32, f32) {
        (self.x - other.x, self.y - other.y)
    }
}

/// Width and height pair
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn scaled(&self, scale: f32) -> Size {
        Size::new(self.width * scale, self.height * scale)
    }
}

/// Axis aligned rectangle in document space (top-left origin).
///
/// Width and height are never negative; use [`Rect::from_corners`] to build
/// one from two arbitrary points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    /// Normalized rectangle spanning two points: top-left is the component-wise
    /// minimum, size is the absolute difference.
    pub fn from_corners(a: Point, b: Point) -> Self {
        let (min_x, min_y, max_x, max_y) = normalize_rect(a.x, a.y, b.x, b.y);
        Self {
            x: min_x,
            y: min_y,
            width: max_x - min_x,
            height: max_y - min_y,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Inclusive containment test with the rectangle grown by `padding` on every side
    pub fn contains_with_padding(&self, p: Point, padding: f32) -> bool {
        p.x >= self.x - padding
            && p.x <= self.right() + padding
            && p.y >= self.y - padding
            && p.y <= self.bottom() + padding
    }

    pub fn contains(&self, p: Point) -> bool {
        self.contains_with_padding(p, 0.0)
    }

    /// Uniformly scale position and size
    pub fn scaled(&self, scale: f32) -> Rect {
        Rect {
            x: self.x * scale,
            y: self.y * scale,
            width: self.width * scale,
            height: self.height * scale,
        }
    }

    /// Move the top-left corner, keeping the size
    pub fn with_origin(&self, origin: Point) -> Rect {
        Rect {
            x: origin.x,
            y: origin.y,
            ..*self
        }
    }

    /// Convert into codec space for a page of the given height.
    pub fn to_codec(&self, page_height: f32) -> CodecRect {
        CodecRect {
            x: self.x,
            y: document_to_codec_y(page_height, self.y, self.height),
            width: self.width,
            height: self.height,
        }
    }
}

/// Rectangle in codec space: `(x, y)` is the bottom-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CodecRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Normalize min/max coordinates from arbitrary start/end points
#[inline]
pub fn normalize_rect(x1: f32, y1: f32, x2: f32, y2: f32) -> (f32, f32, f32, f32) {
    let (min_x, max_x) = if x1 < x2 { (x1, x2) } else { (x2, x1) };
    let (min_y, max_y) = if y1 < y2 { (y1, y2) } else { (y2, y1) };
    (min_x, min_y, max_x, max_y)
}

/// Canvas space to document space: divide both axes by zoom.
#[inline]
pub fn canvas_to_document(p: Point, zoom: f32) -> Point {
    Point::new(p.x / zoom, p.y / zoom)
}

/// Document space to canvas space
#[inline]
pub fn document_to_canvas(p: Point, zoom: f32) -> Point {
    Point::new(p.x * zoom, p.y * zoom)
}

/// Vertical flip into codec space: `page_height - doc_y - element_height`.
#[inline]
pub fn document_to_codec_y(page_height: f32, doc_y: f32, element_height: f32) -> f32 {
    page_height - doc_y - element_height
}

/// Viewer zoom factor, kept inside `[Zoom::MIN, Zoom::MAX]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Zoom(f32);

impl Zoom {
    pub const MIN: f32 = 0.5;
    pub const MAX: f32 = 3.0;
    pub const STEP: f32 = 0.25;
    pub const DEFAULT: f32 = 1.0;

    pub fn new(value: f32) -> Self {
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn value(&self) -> f32 {
        self.0
    }

    pub fn zoom_in(&mut self) {
        *self = Self::new(self.0 + Self::STEP);
    }

    pub fn zoom_out(&mut self) {
        *self = Self::new(self.0 - Self::STEP);
    }

    /// "Fit" resets to the default factor
    pub fn fit(&mut self) {
        self.0 = Self::DEFAULT;
    }
}

impl Default for Zoom {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canvas_to_document_divides_by_zoom() {
        let p = canvas_to_document(Point::new(300.0, 150.0), 1.5);
        assert_eq!(p, Point::new(200.0, 100.0));
        assert_eq!(document_to_canvas(p, 1.5), Point::new(300.0, 150.0));
    }

    #[test]
    fn test_codec_flip() {
        // 792pt letter page, 50pt tall box at y=100 sits 642pt above the bottom
        assert_eq!(document_to_codec_y(792.0, 100.0, 50.0), 642.0);
        let r = Rect::new(100.0, 100.0, 200.0, 50.0).to_codec(792.0);
        assert_eq!(r.x, 100.0);
        assert_eq!(r.y, 642.0);
        assert_eq!(r.width, 200.0);
    }

    #[test]
    fn test_from_corners_normalizes() {
        let r = Rect::from_corners(Point::new(300.0, 150.0), Point::new(100.0, 100.0));
        assert_eq!(r, Rect::new(100.0, 100.0, 200.0, 50.0));
    }

    #[test]
    fn test_negative_size_clamped() {
        let r = Rect::new(0.0, 0.0, -4.0, 3.0);
        assert_eq!(r.width, 0.0);
        assert_eq!(r.height, 3.0);
    }

    #[test]
    fn test_padding_hit() {
        let r = Rect::new(10.0, 10.0, 20.0, 20.0);
        assert!(r.contains_with_padding(Point::new(6.0, 10.0), 5.0));
        assert!(!r.contains_with_padding(Point::new(4.0, 10.0), 5.0));
        assert!(r.contains(Point::new(30.0, 30.0)));
    }

    #[test]
    fn test_zoom_clamps_and_steps() {
        let mut zoom = Zoom::default();
        for _ in 0..20 {
            zoom.zoom_in();
        }
        assert_eq!(zoom.value(), Zoom::MAX);
        for _ in 0..20 {
            zoom.zoom_out();
        }
        assert_eq!(zoom.value(), Zoom::MIN);
        zoom.zoom_in();
        assert_eq!(zoom.value(), 0.75);
        zoom.fit();
        assert_eq!(zoom.value(), 1.0);
        assert_eq!(Zoom::new(9.0).value(), 3.0);
    }
}
