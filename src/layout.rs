//! Initial placement for nodes that carry no `editor_pos`.

use crate::geometry::{Rect, Size, node_world_rect};
use crate::model::{Document, WorldPos};

/// Gap between grid cells and the grid's top-left margin, in world units.
pub const GRID_GAP: f64 = 50.0;

/// Column count for a view `view_width` world units wide.
pub fn grid_columns(view_width: f64, base: Size) -> usize {
    if view_width > 2.0 * GRID_GAP {
        (((view_width - 2.0 * GRID_GAP) / (base.width + GRID_GAP)).floor() as usize).max(1)
    } else {
        3
    }
}

/// Give every unplaced node a grid slot, walking ids in sorted order.
///
/// Slots overlapping an already placed node are skipped. Returns the number
/// of nodes that received a position.
pub fn auto_place(document: &mut Document, view_width: f64, base: Size) -> usize {
    let columns = grid_columns(view_width, base);
    let mut occupied: Vec<Rect> = document
        .iter()
        .filter_map(|(_, n)| n.editor_pos.map(|p| node_world_rect(p, base)))
        .collect();
    let unplaced: Vec<String> = document
        .sorted_ids()
        .into_iter()
        .filter(|id| document.get(id).is_some_and(|n| n.editor_pos.is_none()))
        .map(str::to_string)
        .collect();

    let mut slot = 0usize;
    for id in &unplaced {
        let pos = loop {
            let col = slot % columns;
            let row = slot / columns;
            slot += 1;
            let candidate = WorldPos::new(
                GRID_GAP + col as f64 * (base.width + GRID_GAP),
                GRID_GAP + row as f64 * (base.height + GRID_GAP),
            );
            let rect = node_world_rect(candidate, base);
            if !occupied.iter().any(|o| o.intersects(&rect)) {
                occupied.push(rect);
                break candidate;
            }
        };
        if let Some(node) = document.get_mut(id) {
            node.editor_pos = Some(pos);
        }
    }
    if !unplaced.is_empty() {
        log::debug!("placed {} node(s) on a {columns}-column grid", unplaced.len());
    }
    unplaced.len()
}
