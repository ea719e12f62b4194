#![cfg(feature = "egui")]

use eframe::egui::{self, Button, Key, KeyboardShortcut, Modifiers};

use super::app::{ConversationApp, FileAction};
use super::dialogs::Dialog;

fn command(key: Key) -> KeyboardShortcut {
    KeyboardShortcut::new(Modifiers::COMMAND, key)
}

pub(crate) fn open_add_node(app: &mut ConversationApp) {
    app.dialog = Some(Dialog::AddNode { id: String::new() });
}

pub(crate) fn open_delete(app: &mut ConversationApp) {
    if let Some(id) = app.state.selected.clone() {
        app.dialog = Some(Dialog::ConfirmDelete { id });
    }
}

fn undo(app: &mut ConversationApp) {
    app.flush_drafts();
    if app.state.undo() {
        app.state.status = "Undo".into();
    }
}

fn redo(app: &mut ConversationApp) {
    app.flush_drafts();
    if app.state.redo() {
        app.state.status = "Redo".into();
    }
}

pub(crate) fn menu_bar(app: &mut ConversationApp, ui: &mut egui::Ui) {
    let ctx = ui.ctx().clone();
    egui::MenuBar::new().ui(ui, |ui| {
        ui.menu_button("File", |ui| {
            if ui.button("New").clicked() {
                app.request(&ctx, FileAction::New);
                ui.close();
            }
            if ui.button("Load JSON…").clicked() {
                ui.close();
                app.request(&ctx, FileAction::Open);
            }
            if ui.add(Button::new("Save JSON").shortcut_text("Ctrl+S")).clicked() {
                ui.close();
                app.save();
            }
            if ui.button("Save JSON As…").clicked() {
                ui.close();
                app.save_with_dialog();
            }
            ui.separator();
            if ui.button("Exit").clicked() {
                ui.close();
                app.request(&ctx, FileAction::Exit);
            }
        });
        ui.menu_button("Edit", |ui| {
            if ui.button("Add Node…").clicked() {
                open_add_node(app);
                ui.close();
            }
            let can_undo = app.state.history.can_undo();
            if ui
                .add_enabled(can_undo, Button::new("Undo").shortcut_text("Ctrl+Z"))
                .clicked()
            {
                undo(app);
                ui.close();
            }
            let can_redo = app.state.history.can_redo();
            if ui
                .add_enabled(can_redo, Button::new("Redo").shortcut_text("Ctrl+Y"))
                .clicked()
            {
                redo(app);
                ui.close();
            }
            ui.separator();
            let has_selection = app.state.selected.is_some();
            if ui
                .add_enabled(has_selection, Button::new("Delete Node").shortcut_text("Del"))
                .clicked()
            {
                open_delete(app);
                ui.close();
            }
        });
        ui.menu_button("View", |ui| {
            if ui.add(Button::new("Zoom In").shortcut_text("Ctrl++")).clicked() {
                app.state.zoom_in();
                ui.close();
            }
            if ui.add(Button::new("Zoom Out").shortcut_text("Ctrl+-")).clicked() {
                app.state.zoom_out();
                ui.close();
            }
            if ui.add(Button::new("Reset Zoom").shortcut_text("Ctrl+0")).clicked() {
                app.state.zoom_reset();
                ui.close();
            }
            ui.separator();
            if ui.button("Scroll to Content").clicked() {
                app.state.scroll_to_content();
                ui.close();
            }
        });
    });
}

/// Global keyboard shortcuts. Editing keys are ignored while a text field
/// has focus so they keep their text-editing meaning there.
pub(crate) fn handle_shortcuts(app: &mut ConversationApp, ctx: &egui::Context) {
    if app.dialog.is_some() {
        return;
    }
    let (save, zoom_in, zoom_out, zoom_reset) = ctx.input_mut(|i| {
        (
            i.consume_shortcut(&command(Key::S)),
            i.consume_shortcut(&command(Key::Plus)) || i.consume_shortcut(&command(Key::Equals)),
            i.consume_shortcut(&command(Key::Minus)),
            i.consume_shortcut(&command(Key::Num0)),
        )
    });
    if save {
        app.save();
    }
    if zoom_in {
        app.state.zoom_in();
    }
    if zoom_out {
        app.state.zoom_out();
    }
    if zoom_reset {
        app.state.zoom_reset();
    }

    if ctx.wants_keyboard_input() {
        return;
    }
    let (undo_key, redo_key, delete, escape) = ctx.input_mut(|i| {
        (
            i.consume_shortcut(&command(Key::Z)),
            i.consume_shortcut(&command(Key::Y)),
            i.key_pressed(Key::Delete),
            i.key_pressed(Key::Escape),
        )
    });
    if undo_key {
        undo(app);
    }
    if redo_key {
        redo(app);
    }
    if delete {
        open_delete(app);
    }
    if escape {
        app.flush_drafts();
        app.state.deselect();
    }
}
