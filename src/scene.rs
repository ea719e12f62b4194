//! Display list derived from the document and the viewport.
//!
//! [`Scene::build`] turns world-space data into canvas-space shapes. It knows
//! nothing about the drawing toolkit; the egui front end only paints what it
//! finds here, offset by the viewport scroll.

use crate::config::EditorConfig;
use crate::geometry::{Point, Rect, Size, Viewport, edge_segment};
use crate::model::Document;

/// A node box in canvas coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeShape {
    pub id: String,
    pub rect: Rect,
    pub selected: bool,
    pub label: String,
    pub font_size: f64,
    /// Text wraps at this width.
    pub wrap_width: f64,
    pub stroke_width: f64,
}

/// Arrowhead proportions, measured back from the tip along the line:
/// `neck` is where the head meets the shaft, `length` where its trailing
/// corners sit, and `half_width` their distance from the shaft.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrowShape {
    pub neck: f64,
    pub length: f64,
    pub half_width: f64,
}

/// A directed connection in canvas coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeShape {
    pub source: String,
    pub target: String,
    pub start: Point,
    pub end: Point,
    pub width: f64,
    pub arrow: ArrowShape,
}

impl EdgeShape {
    /// Triangle for the arrowhead: tip, then the two trailing corners.
    pub fn arrow_polygon(&self) -> [Point; 3] {
        let dx = self.end.x - self.start.x;
        let dy = self.end.y - self.start.y;
        let len = (dx * dx + dy * dy).sqrt().max(1e-6);
        let (ux, uy) = (dx / len, dy / len);
        let base = Point::new(
            self.end.x - ux * self.arrow.length,
            self.end.y - uy * self.arrow.length,
        );
        let (px, py) = (-uy * self.arrow.half_width, ux * self.arrow.half_width);
        [
            self.end,
            Point::new(base.x + px, base.y + py),
            Point::new(base.x - px, base.y - py),
        ]
    }

    /// Where the shaft should stop so it does not poke through the head.
    pub fn shaft_end(&self) -> Point {
        let dx = self.end.x - self.start.x;
        let dy = self.end.y - self.start.y;
        let len = (dx * dx + dy * dy).sqrt();
        if len <= self.arrow.neck {
            return self.start;
        }
        let t = (len - self.arrow.neck) / len;
        Point::new(self.start.x + dx * t, self.start.y + dy * t)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    /// In drawing order: later nodes paint over earlier ones.
    pub nodes: Vec<NodeShape>,
    pub edges: Vec<EdgeShape>,
}

impl Scene {
    /// Derive the display list. Nodes without a position are left out, and so
    /// are edges touching them or pointing at missing nodes.
    pub fn build(
        document: &Document,
        viewport: &Viewport,
        selected: Option<&str>,
        config: &EditorConfig,
    ) -> Self {
        let zoom = viewport.zoom;
        let size: Size = config.base_size() * zoom;

        let mut nodes = Vec::with_capacity(document.len());
        for id in document.sorted_ids() {
            let Some(pos) = document.get(id).and_then(|n| n.editor_pos) else {
                continue;
            };
            let is_selected = selected == Some(id);
            let stroke_width = if is_selected {
                (3.0 * zoom).floor().max(2.0)
            } else {
                (2.0 * zoom).floor().max(1.0)
            };
            nodes.push(NodeShape {
                id: id.to_string(),
                rect: Rect::from_min_size(viewport.world_to_canvas(pos.into()), size),
                selected: is_selected,
                label: id.to_string(),
                font_size: (config.font_size * zoom).floor(),
                wrap_width: (size.width - 10.0 * zoom).max(1.0),
                stroke_width,
            });
        }

        let s = (config.arrow_size * zoom).floor();
        let arrow = ArrowShape {
            neck: s,
            length: (s * 1.2).floor(),
            half_width: (s * 0.5).floor(),
        };
        let width = (1.5 * zoom).floor().max(1.0);
        let offset = config.edge_offset * zoom;

        let mut edges = Vec::new();
        for (source, target) in document.edges() {
            let (Some(sp), Some(tp)) = (
                document.get(source).and_then(|n| n.editor_pos),
                document.get(target).and_then(|n| n.editor_pos),
            ) else {
                continue;
            };
            let sc = Rect::from_min_size(viewport.world_to_canvas(sp.into()), size).center();
            let tc = Rect::from_min_size(viewport.world_to_canvas(tp.into()), size).center();
            let seg = edge_segment(sc, tc, size.half(), offset);
            edges.push(EdgeShape {
                source: source.to_string(),
                target: target.to_string(),
                start: seg.start,
                end: seg.end,
                width,
                arrow,
            });
        }

        Self { nodes, edges }
    }

    /// Union of all node boxes in canvas coordinates (the scroll region).
    pub fn content_bounds(&self) -> Option<Rect> {
        self.nodes
            .iter()
            .map(|n| n.rect)
            .reduce(|acc, r| acc.union(&r))
    }

    pub fn node(&self, id: &str) -> Option<&NodeShape> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Choice, Interaction, Node};

    fn doc() -> Document {
        let mut d = Document::new();
        d.insert(
            "b",
            Node::new("")
                .with_pos(400.0, 0.0)
                .with_interaction(Interaction::Choices(vec![
                    Choice::new("back", "a"),
                    Choice::new("again", "a"),
                    Choice::new("void", "missing"),
                ])),
        );
        d.insert("a", Node::new("").with_pos(0.0, 0.0));
        d
    }

    #[test]
    fn test_nodes_scale_with_zoom() {
        let cfg = EditorConfig::default();
        let vp = Viewport::new(2.0);
        let scene = Scene::build(&doc(), &vp, Some("b"), &cfg);
        assert_eq!(
            scene.nodes.iter().map(|n| n.id.as_str()).collect::<Vec<_>>(),
            vec!["a", "b"]
        );
        let b = scene.node("b").unwrap();
        assert_eq!(b.rect.min, Point::new(800.0, 0.0));
        assert_eq!(b.rect.width(), 360.0);
        assert_eq!(b.rect.height(), 200.0);
        assert!(b.selected);
        assert_eq!(b.stroke_width, 6.0);
        assert_eq!(b.font_size, 20.0);
        assert_eq!(scene.node("a").unwrap().stroke_width, 4.0);
    }

    #[test]
    fn test_edges_dedup_and_skip_dangling() {
        let cfg = EditorConfig::default();
        let vp = Viewport::new(1.0);
        let scene = Scene::build(&doc(), &vp, None, &cfg);
        assert_eq!(scene.edges.len(), 1);
        let e = &scene.edges[0];
        assert_eq!((e.source.as_str(), e.target.as_str()), ("b", "a"));
        // b center (490, 50) -> a center (90, 50), leftwards
        assert!((e.start.x - 480.0).abs() < 1e-9);
        assert!((e.end.x - 180.0).abs() < 1e-9);
        assert!((e.end.y - 50.0).abs() < 1e-9);
        assert_eq!(e.width, 1.0);
        assert_eq!(e.arrow, ArrowShape { neck: 12.0, length: 14.0, half_width: 6.0 });
    }

    #[test]
    fn test_small_zoom_keeps_minimum_widths() {
        let cfg = EditorConfig::default();
        let vp = Viewport::new(0.2);
        let scene = Scene::build(&doc(), &vp, Some("a"), &cfg);
        assert_eq!(scene.node("a").unwrap().stroke_width, 2.0);
        assert_eq!(scene.node("b").unwrap().stroke_width, 1.0);
        assert_eq!(scene.edges[0].width, 1.0);
    }

    #[test]
    fn test_arrow_polygon_points_at_end() {
        let e = EdgeShape {
            source: "s".into(),
            target: "t".into(),
            start: Point::new(0.0, 0.0),
            end: Point::new(100.0, 0.0),
            width: 1.0,
            arrow: ArrowShape { neck: 12.0, length: 14.0, half_width: 6.0 },
        };
        let [tip, l, r] = e.arrow_polygon();
        assert_eq!(tip, Point::new(100.0, 0.0));
        assert!((l.x - 86.0).abs() < 1e-9 && (l.y - 6.0).abs() < 1e-9);
        assert!((r.x - 86.0).abs() < 1e-9 && (r.y + 6.0).abs() < 1e-9);
        assert!((e.shaft_end().x - 88.0).abs() < 1e-9);
    }

    #[test]
    fn test_content_bounds() {
        let cfg = EditorConfig::default();
        let scene = Scene::build(&doc(), &Viewport::new(1.0), None, &cfg);
        let b = scene.content_bounds().unwrap();
        assert_eq!(b.min, Point::new(0.0, 0.0));
        assert_eq!(b.max, Point::new(580.0, 100.0));
        assert!(Scene::default().content_bounds().is_none());
    }
}
