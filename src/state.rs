//! Editor state management.
//!
//! [`EditorState`] is the single application-state value: the document, the
//! view, the selection, the current drag gesture, and undo history. Every UI
//! event is a method call on it; none of it depends on the GUI toolkit, so the
//! whole interaction model is unit tested here.

use anyhow::{Result, anyhow};
use camino::{Utf8Path, Utf8PathBuf};

use crate::config::EditorConfig;
use crate::geometry::{Point, Size, Viewport, hit_test};
use crate::history::EditorHistory;
use crate::layout;
use crate::model::{Document, InteractionKind, WorldPos};
use crate::operations::{self, FieldChange, NodeField};
use crate::scene::Scene;
use crate::store;

// ────────────────────────────────────────────────────────────────────────────
// Drag state
// ────────────────────────────────────────────────────────────────────────────

/// What the user is currently dragging.
#[derive(Debug, Clone, Default)]
pub enum DragMode {
    /// Not dragging anything.
    #[default]
    None,
    /// Moving a node. Offsets are kept in world units so the node tracks the
    /// pointer exactly at any zoom.
    Node {
        id: String,
        /// World point where the press happened.
        grab: Point,
        /// Node position when the press happened.
        origin: WorldPos,
        /// Document before the drag, recorded in history on release.
        before: Box<Document>,
        moved: bool,
    },
    /// Panning the canvas.
    Pan,
}

/// Result of [`EditorState::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(Utf8PathBuf),
    /// No file path yet; the caller must ask for one and call
    /// [`EditorState::save_as`].
    NeedsPath,
}

// ────────────────────────────────────────────────────────────────────────────
// EditorState
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct EditorState {
    pub document: Document,
    pub file_path: Option<Utf8PathBuf>,
    pub viewport: Viewport,
    pub selected: Option<String>,
    pub drag_mode: DragMode,
    pub history: EditorHistory,
    /// Whether the document differs from the last loaded or saved one.
    pub dirty: bool,
    pub config: EditorConfig,
    /// One-line message for the status bar.
    pub status: String,
    saved: Document,
}

impl EditorState {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            document: Document::new(),
            file_path: None,
            viewport: Viewport::new(config.zoom.initial),
            selected: None,
            drag_mode: DragMode::None,
            history: EditorHistory::default(),
            dirty: false,
            config,
            status: String::new(),
            saved: Document::new(),
        }
    }

    /// State for a document that counts as saved.
    pub fn with_document(config: EditorConfig, document: Document) -> Self {
        let mut state = Self::new(config);
        state.saved = document.clone();
        state.document = document;
        state
    }

    pub fn base_size(&self) -> Size {
        self.config.base_size()
    }

    pub fn title(&self) -> String {
        store::window_title(self.file_path.as_deref())
    }

    /// Update the widget size (screen pixels) before handling input.
    pub fn set_view_size(&mut self, size: Size) {
        self.viewport.size = size;
    }

    /// Place nodes that have no position. Not recorded as an edit, and a clean
    /// document stays clean.
    pub fn ensure_layout(&mut self) {
        if self.document.has_unplaced() {
            let width = self.viewport.world_width();
            let base = self.config.base_size();
            layout::auto_place(&mut self.document, width, base);
            if !self.dirty {
                self.saved = self.document.clone();
            }
        }
    }

    pub fn scene(&self) -> Scene {
        Scene::build(
            &self.document,
            &self.viewport,
            self.selected.as_deref(),
            &self.config,
        )
    }

    /// Run a document mutation, recording history and the dirty flag only
    /// when the document actually changed.
    fn edit<T>(&mut self, f: impl FnOnce(&mut Document) -> Result<T>) -> Result<T> {
        let before = self.document.clone();
        let out = f(&mut self.document)?;
        self.record(before);
        Ok(out)
    }

    fn record(&mut self, before: Document) {
        if self.document != before {
            self.history.push(before);
            self.update_dirty();
        }
    }

    fn update_dirty(&mut self) {
        self.dirty = self.document != self.saved;
    }

    /// Commit pending text-field edits as one undo step. Drafts that match
    /// the stored text, or whose field no longer exists, are skipped.
    /// Returns the number of fields changed.
    pub fn commit_drafts(
        &mut self,
        drafts: impl IntoIterator<Item = ((String, NodeField), String)>,
    ) -> usize {
        let before = self.document.clone();
        let mut changed = 0;
        for ((id, field), text) in drafts {
            let stored = self
                .document
                .get(&id)
                .and_then(|n| operations::get_field(n, field))
                .unwrap_or("");
            if stored == text {
                continue;
            }
            match operations::set_field(&mut self.document, &id, field, &text) {
                Ok(ch) if ch.changed => changed += 1,
                Ok(_) => {}
                Err(e) => log::debug!("dropping draft for {field:?} of '{id}': {e:#}"),
            }
        }
        self.record(before);
        changed
    }

    fn selected_id(&self) -> Result<String> {
        self.selected
            .clone()
            .ok_or_else(|| anyhow!("no node selected"))
    }

    // ── selection ──────────────────────────────────────────────────────────

    pub fn select(&mut self, id: &str) {
        if self.document.contains(id) {
            self.selected = Some(id.to_string());
        }
    }

    pub fn deselect(&mut self) {
        self.selected = None;
    }

    pub fn selected_node(&self) -> Option<(&str, &crate::model::Node)> {
        let id = self.selected.as_deref()?;
        self.document.get(id).map(|n| (id, n))
    }

    // ── pointer ────────────────────────────────────────────────────────────

    /// Primary button pressed at `screen`. Selects and starts dragging the
    /// node under the pointer, or clears the selection on empty canvas.
    /// Returns the hit node.
    pub fn press(&mut self, screen: Point) -> Option<String> {
        let world = self.viewport.screen_to_world(screen);
        let hit = hit_test(&self.document, world, self.base_size()).map(str::to_string);
        match &hit {
            Some(id) => {
                self.selected = Some(id.clone());
                let origin = self
                    .document
                    .get(id)
                    .and_then(|n| n.editor_pos)
                    .unwrap_or(WorldPos::new(world.x, world.y));
                self.drag_mode = DragMode::Node {
                    id: id.clone(),
                    grab: world,
                    origin,
                    before: Box::new(self.document.clone()),
                    moved: false,
                };
            }
            None => {
                self.selected = None;
                self.drag_mode = DragMode::None;
            }
        }
        hit
    }

    /// Pointer moved to `screen` with the primary button held.
    pub fn drag_to(&mut self, screen: Point) {
        let world = self.viewport.screen_to_world(screen);
        if let DragMode::Node {
            id,
            grab,
            origin,
            moved,
            ..
        } = &mut self.drag_mode
        {
            let pos = WorldPos::new(origin.x + world.x - grab.x, origin.y + world.y - grab.y);
            if operations::move_node(&mut self.document, id, pos).is_ok() {
                *moved = true;
            }
        }
    }

    /// Primary button released: a node drag becomes one undo entry.
    pub fn release(&mut self) {
        if let DragMode::Node {
            before, moved: true, ..
        } = std::mem::take(&mut self.drag_mode)
        {
            self.record(*before);
        }
    }

    pub fn begin_pan(&mut self) {
        self.drag_mode = DragMode::Pan;
    }

    /// Move the content by a screen-space delta.
    pub fn pan(&mut self, delta: Point) {
        self.viewport.pan_by(delta);
    }

    pub fn end_pan(&mut self) {
        if matches!(self.drag_mode, DragMode::Pan) {
            self.drag_mode = DragMode::None;
        }
    }

    // ── zoom ───────────────────────────────────────────────────────────────

    /// Mouse wheel over the canvas: positive `notches` zoom in around the
    /// pointer. Returns whether the zoom changed.
    pub fn wheel(&mut self, notches: f64, screen: Point) -> bool {
        let factor = if notches > 0.0 {
            self.config.zoom.wheel_in
        } else if notches < 0.0 {
            self.config.zoom.wheel_out
        } else {
            return false;
        };
        self.zoom_around(factor, screen)
    }

    pub fn zoom_in(&mut self) -> bool {
        let c = self.viewport.center_screen();
        self.zoom_around(self.config.zoom.step_in, c)
    }

    pub fn zoom_out(&mut self) -> bool {
        let c = self.viewport.center_screen();
        self.zoom_around(self.config.zoom.step_out, c)
    }

    /// Scroll so the top-left of the content sits a grid gap inside the view.
    pub fn scroll_to_content(&mut self) {
        if let Some(bounds) = self.scene().content_bounds() {
            let margin = layout::GRID_GAP * self.viewport.zoom;
            self.viewport
                .scroll_to(bounds.min - Point::new(margin, margin));
        }
    }

    pub fn zoom_reset(&mut self) {
        self.viewport.reset_zoom(self.config.zoom.initial);
        log::debug!("zoom reset to {}", self.viewport.zoom);
    }

    fn zoom_around(&mut self, factor: f64, anchor: Point) -> bool {
        let applied = self
            .viewport
            .zoom_by(factor, anchor, self.config.zoom_limits());
        if applied {
            log::debug!("zoom {:.3}", self.viewport.zoom);
        }
        applied
    }

    // ── node edits ─────────────────────────────────────────────────────────

    /// Add a node with its top-left corner at the world point under the view
    /// center, and select it.
    pub fn add_node_at_center(&mut self, id: &str) -> Result<()> {
        let c = self.viewport.screen_to_world(self.viewport.center_screen());
        self.edit(|doc| operations::add_node(doc, id, WorldPos::new(c.x, c.y)))?;
        self.selected = Some(id.to_string());
        self.status = format!("Added node '{id}'");
        Ok(())
    }

    pub fn delete_selected(&mut self) -> Result<()> {
        let id = self.selected_id()?;
        let cleared = self.edit(|doc| operations::delete_node(doc, &id))?;
        self.selected = None;
        self.status = format!("Deleted node '{id}', cleared {cleared} reference(s)");
        Ok(())
    }

    pub fn rename_selected(&mut self, new_id: &str) -> Result<()> {
        let old = self.selected_id()?;
        let rewritten = self.edit(|doc| operations::rename_node(doc, &old, new_id))?;
        self.selected = Some(new_id.to_string());
        self.status = format!("Renamed '{old}' to '{new_id}', updated {rewritten} reference(s)");
        Ok(())
    }

    pub fn set_field(&mut self, id: &str, field: NodeField, value: &str) -> Result<FieldChange> {
        self.edit(|doc| operations::set_field(doc, id, field, value))
    }

    pub fn convert(&mut self, id: &str, kind: InteractionKind) -> Result<()> {
        self.edit(|doc| operations::convert_node(doc, id, kind))
    }

    pub fn convert_selected(&mut self, kind: InteractionKind) -> Result<()> {
        let id = self.selected_id()?;
        self.convert(&id, kind)
    }

    pub fn add_choice(&mut self, id: &str) -> Result<()> {
        self.edit(|doc| operations::add_choice(doc, id))
    }

    pub fn add_secret(&mut self, id: &str) -> Result<()> {
        self.edit(|doc| operations::add_secret(doc, id))
    }

    pub fn remove_choice(&mut self, id: &str, index: usize) -> Result<()> {
        self.edit(|doc| operations::remove_choice(doc, id, index).map(|_| ()))
    }

    pub fn remove_secret(&mut self, id: &str, index: usize) -> Result<()> {
        self.edit(|doc| operations::remove_secret(doc, id, index).map(|_| ()))
    }

    // ── history ────────────────────────────────────────────────────────────

    pub fn undo(&mut self) -> bool {
        let current = self.document.clone();
        match self.history.undo(current) {
            Some(prev) => {
                self.document = prev;
                self.after_history_step();
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        let current = self.document.clone();
        match self.history.redo(current) {
            Some(next) => {
                self.document = next;
                self.after_history_step();
                true
            }
            None => false,
        }
    }

    fn after_history_step(&mut self) {
        self.update_dirty();
        self.drag_mode = DragMode::None;
        if let Some(id) = &self.selected {
            if !self.document.contains(id) {
                self.selected = None;
            }
        }
    }

    // ── files ──────────────────────────────────────────────────────────────

    /// Replace the document with an empty one.
    pub fn new_document(&mut self) {
        self.replace_document(Document::new(), None);
        self.status = "New document".to_string();
    }

    /// Load `path`. On error the current document is kept.
    pub fn open(&mut self, path: &Utf8Path) -> Result<()> {
        let doc = store::load_document(path)?;
        self.status = format!("Loaded {} node(s) from {}", doc.len(), path);
        self.replace_document(doc, Some(path.to_path_buf()));
        Ok(())
    }

    fn replace_document(&mut self, doc: Document, path: Option<Utf8PathBuf>) {
        self.saved = doc.clone();
        self.document = doc;
        self.file_path = path;
        self.selected = None;
        self.drag_mode = DragMode::None;
        self.history.clear();
        self.dirty = false;
        self.viewport.zoom = self.config.zoom.initial;
        self.viewport.scroll = Point::ZERO;
        self.ensure_layout();
    }

    /// Save to the current path, or report that one is needed.
    pub fn save(&mut self) -> Result<SaveOutcome> {
        match self.file_path.clone() {
            Some(path) => {
                self.save_as(&path)?;
                Ok(SaveOutcome::Saved(path))
            }
            None => Ok(SaveOutcome::NeedsPath),
        }
    }

    pub fn save_as(&mut self, path: &Utf8Path) -> Result<()> {
        store::save_document(path, &self.document)?;
        self.file_path = Some(path.to_path_buf());
        self.saved = self.document.clone();
        self.dirty = false;
        self.status = format!("Saved {}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Choice, Interaction, Node};

    fn state() -> EditorState {
        let mut doc = Document::new();
        doc.insert(
            "a",
            Node::new("A")
                .with_pos(0.0, 0.0)
                .with_interaction(Interaction::Choices(vec![Choice::new("to b", "b")])),
        );
        doc.insert("b", Node::new("B").with_pos(400.0, 300.0));
        let mut s = EditorState::with_document(EditorConfig::default(), doc);
        s.set_view_size(Size::new(800.0, 600.0));
        s
    }

    #[test]
    fn test_press_selects_and_empty_press_deselects() {
        let mut s = state();
        assert_eq!(s.press(Point::new(10.0, 10.0)).as_deref(), Some("a"));
        assert_eq!(s.selected.as_deref(), Some("a"));
        s.release();
        assert_eq!(s.press(Point::new(300.0, 10.0)), None);
        assert!(s.selected.is_none());
        assert!(!s.history.can_undo());
    }

    #[test]
    fn test_drag_moves_in_world_units() {
        let mut s = state();
        s.viewport.zoom = 2.0;
        s.viewport.scroll = Point::new(100.0, 100.0);
        // b sits at canvas (800, 600) -> screen (700, 500)
        assert_eq!(s.press(Point::new(710.0, 510.0)).as_deref(), Some("b"));
        s.drag_to(Point::new(750.0, 490.0));
        s.drag_to(Point::new(770.0, 530.0));
        s.release();
        // 60 px right, 20 px down at zoom 2 is 30, 10 world units
        assert_eq!(
            s.document.get("b").unwrap().editor_pos,
            Some(WorldPos::new(430.0, 310.0))
        );
        assert!(s.dirty);
        assert!(s.undo());
        assert_eq!(
            s.document.get("b").unwrap().editor_pos,
            Some(WorldPos::new(400.0, 300.0))
        );
    }

    #[test]
    fn test_click_without_motion_records_nothing() {
        let mut s = state();
        s.press(Point::new(5.0, 5.0));
        s.release();
        assert!(!s.dirty);
        assert!(!s.history.can_undo());
    }

    #[test]
    fn test_wheel_zoom_keeps_pointer_world_point() {
        let mut s = state();
        let p = Point::new(250.0, 175.0);
        let before = s.viewport.screen_to_world(p);
        assert!(s.wheel(1.0, p));
        assert!((s.viewport.zoom - 1.1).abs() < 1e-9);
        let after = s.viewport.screen_to_world(p);
        assert!((before.x - after.x).abs() < 1e-9 && (before.y - after.y).abs() < 1e-9);
        assert!(!s.wheel(0.0, p));
    }

    #[test]
    fn test_menu_zoom_is_bounded() {
        let mut s = state();
        let mut steps = 0;
        while s.zoom_in() {
            steps += 1;
        }
        // 1.2^6 = 2.98 is the last step under 3.0
        assert_eq!(steps, 6);
        assert!(s.viewport.zoom <= 3.0);
        s.zoom_reset();
        assert_eq!(s.viewport.zoom, 1.0);
        assert!(s.zoom_out());
        assert!((s.viewport.zoom - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_hit_after_zoom_matches_drawing() {
        let mut s = state();
        s.zoom_in();
        s.zoom_in();
        let scene = s.scene();
        let b = scene.node("b").unwrap();
        let inside = s.viewport.canvas_to_screen(b.rect.center());
        assert_eq!(s.press(inside).as_deref(), Some("b"));
    }

    #[test]
    fn test_scroll_to_content() {
        let mut s = state();
        s.viewport.scroll = Point::new(-900.0, 2000.0);
        s.scroll_to_content();
        assert_eq!(s.viewport.scroll, Point::new(-50.0, -50.0));
        let mut empty = EditorState::new(EditorConfig::default());
        empty.scroll_to_content();
        assert_eq!(empty.viewport.scroll, Point::ZERO);
    }

    #[test]
    fn test_add_node_at_center() {
        let mut s = state();
        s.viewport.scroll = Point::new(100.0, 50.0);
        s.add_node_at_center("c").unwrap();
        assert_eq!(s.selected.as_deref(), Some("c"));
        assert_eq!(
            s.document.get("c").unwrap().editor_pos,
            Some(WorldPos::new(500.0, 350.0))
        );
        assert!(s.add_node_at_center("c").is_err());
    }

    #[test]
    fn test_rename_selected_updates_selection_and_links() {
        let mut s = state();
        s.select("b");
        s.rename_selected("bee").unwrap();
        assert_eq!(s.selected.as_deref(), Some("bee"));
        assert_eq!(s.document.get("a").unwrap().targets(), vec!["bee"]);
        assert_eq!(s.scene().edges.len(), 1);
        assert_eq!(s.scene().edges[0].target, "bee");
    }

    #[test]
    fn test_delete_selected_then_undo_restores() {
        let mut s = state();
        s.select("b");
        s.delete_selected().unwrap();
        assert!(s.selected.is_none());
        assert!(s.scene().edges.is_empty());
        assert_eq!(s.document.get("a").unwrap().choices().unwrap()[0].next_node_id, "");
        assert!(s.delete_selected().is_err());
        assert!(s.undo());
        assert!(s.document.contains("b"));
        assert_eq!(s.scene().edges.len(), 1);
        assert!(s.redo());
        assert!(!s.document.contains("b"));
    }

    #[test]
    fn test_convert_selected() {
        let mut s = state();
        assert!(s.convert_selected(InteractionKind::EntryMode).is_err());
        s.select("b");
        s.convert_selected(InteractionKind::EntryMode).unwrap();
        let em = s.document.get("b").unwrap().entry_mode().unwrap();
        assert_eq!(em.prompt_text.as_deref(), Some("Enter..."));
        assert_eq!(em.secrets.len(), 1);
    }

    #[test]
    fn test_undo_drops_stale_selection() {
        let mut s = state();
        s.add_node_at_center("c").unwrap();
        assert!(s.undo());
        assert!(s.selected.is_none());
    }

    #[test]
    fn test_unchanged_edit_is_not_recorded() {
        let mut s = state();
        s.set_field("a", NodeField::SpriteText, "A").unwrap();
        assert!(!s.dirty);
        let ch = s.set_field("a", NodeField::ChoiceNext(0), "a").unwrap();
        assert!(ch.link && ch.changed);
        assert!(s.dirty);
        assert!(s.history.can_undo());
    }

    #[test]
    fn test_undo_back_to_saved_document_is_clean() {
        let mut s = state();
        s.set_field("a", NodeField::SpriteText, "changed").unwrap();
        s.set_field("b", NodeField::SpriteText, "also").unwrap();
        assert!(s.dirty);
        assert!(s.undo());
        assert!(s.dirty);
        assert!(s.undo());
        assert!(!s.dirty);
        assert!(s.redo());
        assert!(s.dirty);
        // an edit that restores the saved text is clean too
        s.set_field("a", NodeField::SpriteText, "A").unwrap();
        assert!(!s.dirty);
    }

    #[test]
    fn test_commit_drafts_is_one_undo_step() {
        let mut s = state();
        let drafts = vec![
            (("a".to_string(), NodeField::SpriteText), "Hello\n".to_string()),
            (("a".to_string(), NodeField::ChoiceText(0)), "to b".to_string()),
            (("a".to_string(), NodeField::ChoiceItem(0)), "key".to_string()),
            (("a".to_string(), NodeField::ChoiceText(4)), "gone".to_string()),
            (("ghost".to_string(), NodeField::SpriteText), "boo".to_string()),
        ];
        assert_eq!(s.commit_drafts(drafts), 2);
        let a = s.document.get("a").unwrap();
        assert_eq!(a.sprite_text, "Hello");
        assert_eq!(a.choices().unwrap()[0].item.as_deref(), Some("key"));
        assert!(!s.document.contains("ghost"));
        assert!(s.dirty);
        assert!(s.undo());
        assert!(!s.history.can_undo());
        assert_eq!(s.document.get("a").unwrap().sprite_text, "A");
        assert!(!s.dirty);
    }

    #[test]
    fn test_commit_drafts_keeps_raw_values_it_does_not_touch() {
        let doc =
            Document::from_json_str(r#"{"n": {"sprite_text": 42, "editor_pos": [0, 0]}}"#).unwrap();
        let mut s = EditorState::with_document(EditorConfig::default(), doc);
        let drafts = vec![(("n".to_string(), NodeField::SpriteText), String::new())];
        assert_eq!(s.commit_drafts(drafts), 0);
        assert!(!s.history.can_undo());
        let raw = s.document.get("n").unwrap().extra.get("sprite_text");
        assert_eq!(raw, Some(&serde_json::Value::from(42)));
    }

    #[test]
    fn test_ensure_layout_fills_positions() {
        let mut doc = Document::new();
        doc.insert("x", Node::new("x"));
        let mut s = EditorState::with_document(EditorConfig::default(), doc);
        s.set_view_size(Size::new(1400.0, 900.0));
        s.ensure_layout();
        assert_eq!(
            s.document.get("x").unwrap().editor_pos,
            Some(WorldPos::new(50.0, 50.0))
        );
        assert!(!s.dirty);
    }

    #[test]
    fn test_save_without_path_needs_path() {
        let mut s = state();
        assert_eq!(s.save().unwrap(), SaveOutcome::NeedsPath);
        assert_eq!(s.title(), "Conversation Editor");
    }
}
