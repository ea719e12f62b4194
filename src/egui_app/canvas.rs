#![cfg(feature = "egui")]

use eframe::egui::{self, FontId, PointerButton, Pos2, Rect, Sense, Shape, Stroke, StrokeKind, Vec2};

use super::app::ConversationApp;
use super::palette::Palette;
use crate::geometry::{Point, Size};
use crate::scene::Scene;
use crate::state::EditorState;

fn to_point(v: Vec2) -> Point {
    Point::new(v.x as f64, v.y as f64)
}

/// The node canvas: fills the remaining space, forwards pointer input to the
/// editor state and paints the scene.
pub(crate) fn show(app: &mut ConversationApp, ui: &mut egui::Ui) {
    let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
    if app.dialog.is_none() && response.hovered() && ui.input(|i| i.pointer.primary_pressed()) {
        // the press may change the selection and hide the fields being edited
        app.flush_drafts();
    }
    let state = &mut app.state;
    state.set_view_size(Size::new(rect.width() as f64, rect.height() as f64));
    state.ensure_layout();
    if app.dialog.is_none() {
        handle_pointer(state, ui, &response, rect.min);
    }

    let scroll = app.state.viewport.scroll;
    let offset = rect.min.to_vec2() - egui::vec2(scroll.x as f32, scroll.y as f32);
    paint(&ui.painter_at(rect), &app.state.scene(), offset, &app.palette);
}

fn handle_pointer(state: &mut EditorState, ui: &egui::Ui, response: &egui::Response, origin: Pos2) {
    let local = |p: Pos2| to_point(p - origin);
    let (pressed, released, pointer, scroll) = ui.input(|i| {
        (
            i.pointer.primary_pressed(),
            i.pointer.primary_released(),
            i.pointer.interact_pos(),
            i.raw_scroll_delta.y,
        )
    });

    if pressed && response.hovered() {
        if let Some(p) = pointer {
            state.press(local(p));
        }
    }
    if response.dragged_by(PointerButton::Primary) {
        if let Some(p) = pointer {
            state.drag_to(local(p));
        }
    }
    if released {
        state.release();
    }

    let panning = |r: &egui::Response| {
        r.dragged_by(PointerButton::Middle) || r.dragged_by(PointerButton::Secondary)
    };
    if response.drag_started_by(PointerButton::Middle)
        || response.drag_started_by(PointerButton::Secondary)
    {
        state.begin_pan();
    }
    if panning(response) {
        state.pan(to_point(response.drag_delta()));
    }
    if response.drag_stopped() {
        state.end_pan();
    }

    if scroll != 0.0 && response.hovered() {
        if let Some(p) = response.hover_pos() {
            state.wheel(scroll.signum() as f64, local(p));
        }
    }
}

fn paint(painter: &egui::Painter, scene: &Scene, offset: Vec2, palette: &Palette) {
    painter.rect_filled(painter.clip_rect(), 0.0, palette.background);
    let at = |p: Point| Pos2::new(p.x as f32, p.y as f32) + offset;

    for edge in &scene.edges {
        let stroke = Stroke::new(edge.width as f32, palette.line);
        painter.line_segment([at(edge.start), at(edge.shaft_end())], stroke);
        let head = edge.arrow_polygon().map(at).to_vec();
        painter.add(Shape::convex_polygon(head, palette.line, Stroke::NONE));
    }

    for node in &scene.nodes {
        let r = Rect::from_min_max(at(node.rect.min), at(node.rect.max));
        let fill = if node.selected {
            palette.node_selected
        } else {
            palette.node
        };
        painter.rect_filled(r, 0.0, fill);
        painter.rect_stroke(
            r,
            0.0,
            Stroke::new(node.stroke_width as f32, palette.outline),
            StrokeKind::Inside,
        );
        let font = FontId::proportional(node.font_size.max(1.0) as f32);
        let galley = painter.layout(node.label.clone(), font, palette.text, node.wrap_width as f32);
        let pos = r.center() - galley.size() / 2.0;
        painter.galley(pos, galley, palette.text);
    }
}
