//! Coordinate spaces and the transforms between them.
//!
//! Three spaces are involved:
//! - **Screen**: pixels relative to the top-left corner of the canvas widget.
//! - **Canvas** (drawing): screen + scroll offset. Everything is drawn here,
//!   at world × zoom.
//! - **World**: zoom-independent node positions, the persisted unit.
//!
//! Hit-testing always happens in world space against the *unscaled* node
//! size, so it is exact at every zoom level.

use std::ops::{Add, Div, Mul, Sub};

use crate::model::{Document, WorldPos};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, o: Point) -> Point {
        Point::new(self.x + o.x, self.y + o.y)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, o: Point) -> Point {
        Point::new(self.x - o.x, self.y - o.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;
    fn mul(self, s: f64) -> Point {
        Point::new(self.x * s, self.y * s)
    }
}

impl Div<f64> for Point {
    type Output = Point;
    fn div(self, s: f64) -> Point {
        Point::new(self.x / s, self.y / s)
    }
}

impl From<WorldPos> for Point {
    fn from(p: WorldPos) -> Self {
        Point::new(p.x, p.y)
    }
}

impl From<Point> for WorldPos {
    fn from(p: Point) -> Self {
        WorldPos::new(p.x, p.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn half(&self) -> Size {
        Size::new(self.width / 2.0, self.height / 2.0)
    }
}

impl Mul<f64> for Size {
    type Output = Size;
    fn mul(self, s: f64) -> Size {
        Size::new(self.width * s, self.height * s)
    }
}

/// Axis-aligned rectangle given by its min/max corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Point,
    pub max: Point,
}

impl Rect {
    pub fn from_min_size(min: Point, size: Size) -> Self {
        Self {
            min,
            max: Point::new(min.x + size.width, min.y + size.height),
        }
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
        )
    }

    /// Inclusive on all four edges.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn intersects(&self, o: &Rect) -> bool {
        self.min.x < o.max.x && self.max.x > o.min.x && self.min.y < o.max.y && self.max.y > o.min.y
    }

    pub fn union(&self, o: &Rect) -> Rect {
        Rect {
            min: Point::new(self.min.x.min(o.min.x), self.min.y.min(o.min.y)),
            max: Point::new(self.max.x.max(o.max.x), self.max.y.max(o.max.y)),
        }
    }
}

/// Closed zoom interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomLimits {
    pub min: f64,
    pub max: f64,
}

impl ZoomLimits {
    pub fn contains(&self, zoom: f64) -> bool {
        zoom >= self.min && zoom <= self.max
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Viewport
// ────────────────────────────────────────────────────────────────────────────

/// The visible window onto the canvas: scroll offset, zoom factor, and the
/// size of the widget in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Canvas coordinate shown at the widget's top-left corner.
    pub scroll: Point,
    pub zoom: f64,
    pub size: Size,
}

impl Viewport {
    pub fn new(zoom: f64) -> Self {
        Self {
            scroll: Point::ZERO,
            zoom,
            size: Size::default(),
        }
    }

    pub fn screen_to_canvas(&self, p: Point) -> Point {
        p + self.scroll
    }

    pub fn canvas_to_screen(&self, p: Point) -> Point {
        p - self.scroll
    }

    pub fn canvas_to_world(&self, p: Point) -> Point {
        p / self.zoom
    }

    pub fn world_to_canvas(&self, p: Point) -> Point {
        p * self.zoom
    }

    pub fn screen_to_world(&self, p: Point) -> Point {
        self.canvas_to_world(self.screen_to_canvas(p))
    }

    pub fn world_to_screen(&self, p: Point) -> Point {
        self.canvas_to_screen(self.world_to_canvas(p))
    }

    /// Middle of the widget in screen coordinates.
    pub fn center_screen(&self) -> Point {
        Point::new(self.size.width / 2.0, self.size.height / 2.0)
    }

    /// Width of the visible area measured in world units.
    pub fn world_width(&self) -> f64 {
        self.size.width / self.zoom
    }

    /// Multiply the zoom by `factor`, keeping the world point under `anchor`
    /// (screen coordinates) fixed on screen.
    ///
    /// Steps that would leave `limits` are rejected and `false` is returned;
    /// the viewport is unchanged in that case.
    pub fn zoom_by(&mut self, factor: f64, anchor: Point, limits: ZoomLimits) -> bool {
        let new_zoom = self.zoom * factor;
        if !limits.contains(new_zoom) {
            return false;
        }
        self.set_zoom_around(new_zoom, anchor);
        true
    }

    /// Set an absolute zoom, keeping the world point under `anchor` fixed.
    pub fn set_zoom_around(&mut self, zoom: f64, anchor: Point) {
        let world = self.screen_to_world(anchor);
        self.zoom = zoom;
        self.scroll = world * zoom - anchor;
    }

    /// Return to `initial` zoom with the current view center kept centred.
    pub fn reset_zoom(&mut self, initial: f64) {
        self.set_zoom_around(initial, self.center_screen());
    }

    /// Drag the content by `delta` screen pixels.
    pub fn pan_by(&mut self, delta: Point) {
        self.scroll = self.scroll - delta;
    }

    /// Scroll so that the canvas point `p` sits at the widget's top-left.
    pub fn scroll_to(&mut self, p: Point) {
        self.scroll = p;
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Hit testing and edge clipping
// ────────────────────────────────────────────────────────────────────────────

/// World-space bounding box of a node placed at `pos` with the base size.
pub fn node_world_rect(pos: WorldPos, base: Size) -> Rect {
    Rect::from_min_size(pos.into(), base)
}

/// Find the node under a world-space point.
///
/// Nodes are tested against their unscaled base size. When boxes overlap the
/// node painted last (the topmost one) wins. Nodes without a position are
/// never hit.
pub fn hit_test(document: &Document, world: Point, base: Size) -> Option<&str> {
    document
        .sorted_ids()
        .into_iter()
        .rev()
        .find(|id| {
            document
                .get(id)
                .and_then(|n| n.editor_pos)
                .is_some_and(|pos| node_world_rect(pos, base).contains(world))
        })
}

/// A straight line segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

/// Line from one node center towards another, clipped for drawing.
///
/// The end is pulled back from the target center by the target's half size
/// projected on the line angle; the start is pushed forward by `offset` so the
/// line does not begin inside the source box. All inputs share one space.
pub fn edge_segment(source: Point, target: Point, half: Size, offset: f64) -> Segment {
    let angle = (target.y - source.y).atan2(target.x - source.x);
    let (sin, cos) = angle.sin_cos();
    Segment {
        start: Point::new(source.x + offset * cos, source.y + offset * sin),
        end: Point::new(target.x - half.width * cos, target.y - half.height * sin),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Node;

    const EPS: f64 = 1e-9;

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < EPS && (a.y - b.y).abs() < EPS
    }

    const LIMITS: ZoomLimits = ZoomLimits { min: 0.2, max: 3.0 };

    #[test]
    fn test_transform_roundtrip() {
        let mut vp = Viewport::new(2.0);
        vp.scroll = Point::new(100.0, 40.0);
        let screen = Point::new(20.0, 10.0);
        let world = vp.screen_to_world(screen);
        assert!(close(world, Point::new(60.0, 25.0)));
        assert!(close(vp.world_to_screen(world), screen));
    }

    #[test]
    fn test_zoom_keeps_anchor_fixed() {
        let mut vp = Viewport::new(1.0);
        vp.scroll = Point::new(37.0, -12.0);
        let anchor = Point::new(300.0, 200.0);
        let before = vp.screen_to_world(anchor);
        assert!(vp.zoom_by(1.2, anchor, LIMITS));
        assert!((vp.zoom - 1.2).abs() < EPS);
        assert!(close(vp.screen_to_world(anchor), before));
    }

    #[test]
    fn test_zoom_rejects_out_of_range() {
        let mut vp = Viewport::new(2.9);
        let snapshot = vp;
        assert!(!vp.zoom_by(1.2, Point::ZERO, LIMITS));
        assert_eq!(vp, snapshot);
        let mut vp = Viewport::new(0.21);
        assert!(!vp.zoom_by(0.9, Point::ZERO, LIMITS));
        assert!((vp.zoom - 0.21).abs() < EPS);
    }

    #[test]
    fn test_reset_zoom_keeps_center() {
        let mut vp = Viewport::new(2.5);
        vp.size = Size::new(800.0, 600.0);
        vp.scroll = Point::new(500.0, 300.0);
        let center_world = vp.screen_to_world(vp.center_screen());
        vp.reset_zoom(1.0);
        assert_eq!(vp.zoom, 1.0);
        assert!(close(vp.screen_to_world(vp.center_screen()), center_world));
    }

    #[test]
    fn test_pan_moves_content_with_pointer() {
        let mut vp = Viewport::new(1.5);
        let world = Point::new(10.0, 10.0);
        let before = vp.world_to_screen(world);
        vp.pan_by(Point::new(30.0, -5.0));
        assert!(close(vp.world_to_screen(world), before + Point::new(30.0, -5.0)));
    }

    #[test]
    fn test_hit_test_uses_unscaled_size() {
        let mut doc = Document::new();
        doc.insert("a", Node::new("").with_pos(100.0, 100.0));
        let base = Size::new(180.0, 100.0);
        // At zoom 0.5 the box covers screen 50..140; a click at screen 200
        // maps to world 400 and must miss.
        let mut vp = Viewport::new(0.5);
        assert_eq!(hit_test(&doc, vp.screen_to_world(Point::new(100.0, 60.0)), base), Some("a"));
        assert_eq!(hit_test(&doc, vp.screen_to_world(Point::new(200.0, 60.0)), base), None);
        vp.zoom = 3.0;
        assert_eq!(hit_test(&doc, vp.screen_to_world(Point::new(830.0, 590.0)), base), Some("a"));
        assert_eq!(hit_test(&doc, Point::new(280.0, 200.0), base), Some("a"));
        assert_eq!(hit_test(&doc, Point::new(280.1, 200.0), base), None);
    }

    #[test]
    fn test_hit_test_prefers_topmost() {
        let mut doc = Document::new();
        doc.insert("b", Node::new("").with_pos(50.0, 50.0));
        doc.insert("a", Node::new("").with_pos(0.0, 0.0));
        doc.insert("floating", Node::new(""));
        let base = Size::new(180.0, 100.0);
        assert_eq!(hit_test(&doc, Point::new(60.0, 60.0), base), Some("b"));
        assert_eq!(hit_test(&doc, Point::new(10.0, 10.0), base), Some("a"));
    }

    #[test]
    fn test_edge_segment_horizontal() {
        let seg = edge_segment(
            Point::new(0.0, 0.0),
            Point::new(400.0, 0.0),
            Size::new(90.0, 50.0),
            10.0,
        );
        assert!(close(seg.start, Point::new(10.0, 0.0)));
        assert!(close(seg.end, Point::new(310.0, 0.0)));
    }

    #[test]
    fn test_edge_segment_vertical_uses_half_height() {
        let seg = edge_segment(
            Point::new(0.0, 0.0),
            Point::new(0.0, -300.0),
            Size::new(90.0, 50.0),
            10.0,
        );
        assert!(close(seg.start, Point::new(0.0, -10.0)));
        assert!(close(seg.end, Point::new(0.0, -250.0)));
    }

    #[test]
    fn test_rect_union_and_intersection() {
        let a = Rect::from_min_size(Point::ZERO, Size::new(10.0, 10.0));
        let b = Rect::from_min_size(Point::new(5.0, 20.0), Size::new(10.0, 10.0));
        assert!(!a.intersects(&b));
        let u = a.union(&b);
        assert_eq!(u.min, Point::ZERO);
        assert_eq!(u.max, Point::new(15.0, 30.0));
    }
}
