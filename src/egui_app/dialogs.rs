#![cfg(feature = "egui")]

use eframe::egui::{self, Color32, Key, RichText};

use super::app::{ConversationApp, FileAction};

/// The window currently blocking the canvas, if any.
#[derive(Debug, Clone, PartialEq)]
pub enum Dialog {
    AddNode { id: String },
    Rename { from: String, to: String },
    ConfirmDelete { id: String },
    ConfirmDiscard(FileAction),
    Notice { title: String, message: String, error: bool },
}

impl Dialog {
    pub fn error(title: &str, message: String) -> Self {
        Dialog::Notice {
            title: title.to_string(),
            message,
            error: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Pending,
    Confirm,
    Cancel,
}

fn window<R>(
    ctx: &egui::Context,
    title: &str,
    add_contents: impl FnOnce(&mut egui::Ui) -> R,
) -> Option<R> {
    egui::Window::new(title)
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, add_contents)
        .and_then(|r| r.inner)
}

fn buttons(ui: &mut egui::Ui, confirm: &str, enter: bool) -> Outcome {
    let mut outcome = Outcome::Pending;
    ui.add_space(6.0);
    ui.horizontal(|ui| {
        if ui.button(confirm).clicked() || enter {
            outcome = Outcome::Confirm;
        }
        if ui.button("Cancel").clicked() || ui.input(|i| i.key_pressed(Key::Escape)) {
            outcome = Outcome::Cancel;
        }
    });
    outcome
}

fn id_field(ui: &mut egui::Ui, text: &mut String) -> bool {
    let resp = ui.text_edit_singleline(text);
    if ui.memory(|m| m.focused().is_none()) {
        resp.request_focus();
    }
    resp.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter))
}

/// Draw the open dialog and act on its buttons.
pub(crate) fn show(app: &mut ConversationApp, ctx: &egui::Context) {
    let Some(mut dialog) = app.dialog.take() else {
        return;
    };
    let outcome = match &mut dialog {
        Dialog::AddNode { id } => window(ctx, "Add Node", |ui| {
            ui.label("Enter a unique ID for the new node:");
            let enter = id_field(ui, id);
            buttons(ui, "Add", enter)
        }),
        Dialog::Rename { from, to } => window(ctx, "Change ID", |ui| {
            ui.label(format!("New ID for '{from}':"));
            let enter = id_field(ui, to);
            buttons(ui, "Rename", enter)
        }),
        Dialog::ConfirmDelete { id } => window(ctx, "Delete Node", |ui| {
            ui.label(format!("Delete node '{id}'?"));
            ui.label("Links pointing to it will be cleared.");
            buttons(ui, "Delete", false)
        }),
        Dialog::ConfirmDiscard(_) => window(ctx, "Unsaved Changes", |ui| {
            ui.label("The document has unsaved changes. Discard them?");
            buttons(ui, "Discard", false)
        }),
        Dialog::Notice {
            title,
            message,
            error,
        } => window(ctx, title.as_str(), |ui| {
            if *error {
                ui.label(RichText::new(message.as_str()).color(Color32::DARK_RED));
            } else {
                ui.label(message.as_str());
            }
            ui.add_space(6.0);
            let ok = ui.button("OK").clicked()
                || ui.input(|i| i.key_pressed(Key::Enter) || i.key_pressed(Key::Escape));
            if ok { Outcome::Confirm } else { Outcome::Pending }
        }),
    }
    .unwrap_or(Outcome::Pending);

    if matches!(outcome, Outcome::Confirm) {
        app.flush_drafts();
    }
    match (dialog, outcome) {
        (dialog, Outcome::Pending) => app.dialog = Some(dialog),
        (_, Outcome::Cancel) | (Dialog::Notice { .. }, _) => {}
        (Dialog::AddNode { id }, Outcome::Confirm) => {
            let result = app.state.add_node_at_center(id.trim());
            app.report("Could not add node", result);
        }
        (Dialog::Rename { from, to }, Outcome::Confirm) => {
            app.state.select(&from);
            let result = app.state.rename_selected(to.trim());
            app.report("Could not change ID", result);
        }
        (Dialog::ConfirmDelete { id }, Outcome::Confirm) => {
            app.state.select(&id);
            let result = app.state.delete_selected();
            app.report("Could not delete node", result);
        }
        (Dialog::ConfirmDiscard(action), Outcome::Confirm) => app.perform(ctx, action),
    }
}
