#![cfg(feature = "egui")]

use std::collections::HashMap;

use eframe::egui::{self, Color32, RichText};

use super::app::ConversationApp;
use super::dialogs::Dialog;
use super::menu;
use crate::model::{Document, Interaction, InteractionKind, Node};
use crate::operations::{NodeField, get_field};

pub const PANEL_WIDTH: f32 = 320.0;

/// Edits requested by the panel during one frame, applied after drawing.
#[derive(Debug, Clone, PartialEq)]
enum PanelAction {
    SetField(NodeField, String),
    AddChoice,
    AddSecret,
    RemoveChoice(usize),
    RemoveSecret(usize),
    Convert(InteractionKind),
    Rename,
    Delete,
}

type Drafts = HashMap<(String, NodeField), String>;

/// Property panel for the selected node.
pub(crate) fn show(app: &mut ConversationApp, ui: &mut egui::Ui) {
    let Some(id) = app.state.selected.clone() else {
        ui.heading("Properties");
        ui.label("Select a node to edit it.");
        ui.add_space(8.0);
        if ui.button("Add Node…").clicked() {
            menu::open_add_node(app);
        }
        return;
    };
    let Some(node) = app.state.document.get(&id) else {
        return;
    };
    let doc = &app.state.document;
    let drafts = &mut app.drafts;
    let mut actions = Vec::new();

    egui::ScrollArea::vertical()
        .auto_shrink([false; 2])
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.heading(&id);
                if ui.small_button("Change ID").clicked() {
                    actions.push(PanelAction::Rename);
                }
            });
            ui.separator();

            ui.label(RichText::new("Sprite text").strong());
            text_field(ui, drafts, &id, node, NodeField::SpriteText, true, &mut actions);
            ui.label(RichText::new("Sprite image").strong());
            text_field(ui, drafts, &id, node, NodeField::SpriteImage, false, &mut actions);
            let pos = node
                .editor_pos
                .map(|p| format!("({:.0}, {:.0})", p.x, p.y))
                .unwrap_or_else(|| "unplaced".into());
            ui.label(format!("Position: {pos}"));
            ui.separator();

            match &node.interaction {
                Interaction::Choices(choices) => {
                    ui.label(RichText::new("Choices").strong());
                    for i in 0..choices.len() {
                        egui::Frame::group(ui.style()).show(ui, |ui| {
                            ui.horizontal(|ui| {
                                ui.label(format!("Choice {}", i + 1));
                                if ui.small_button("Remove").clicked() {
                                    actions.push(PanelAction::RemoveChoice(i));
                                }
                            });
                            ui.label("Text");
                            text_field(ui, drafts, &id, node, NodeField::ChoiceText(i), false, &mut actions);
                            ui.label("Next node");
                            link_field(ui, doc, drafts, &id, node, NodeField::ChoiceNext(i), &mut actions);
                            ui.label("Item");
                            text_field(ui, drafts, &id, node, NodeField::ChoiceItem(i), false, &mut actions);
                            ui.label("Action");
                            text_field(ui, drafts, &id, node, NodeField::ChoiceAction(i), false, &mut actions);
                        });
                    }
                    if ui.button("Add Choice").clicked() {
                        actions.push(PanelAction::AddChoice);
                    }
                }
                Interaction::EntryMode(entry) => {
                    ui.label(RichText::new("Entry mode").strong());
                    ui.label("Prompt");
                    text_field(ui, drafts, &id, node, NodeField::PromptText, false, &mut actions);
                    ui.label("Default next node");
                    link_field(ui, doc, drafts, &id, node, NodeField::DefaultNext, &mut actions);
                    for i in 0..entry.secrets.len() {
                        egui::Frame::group(ui.style()).show(ui, |ui| {
                            ui.horizontal(|ui| {
                                ui.label(format!("Secret {}", i + 1));
                                if ui.small_button("Remove").clicked() {
                                    actions.push(PanelAction::RemoveSecret(i));
                                }
                            });
                            ui.label("Input");
                            text_field(ui, drafts, &id, node, NodeField::SecretInput(i), false, &mut actions);
                            ui.label("Next node");
                            link_field(ui, doc, drafts, &id, node, NodeField::SecretNext(i), &mut actions);
                        });
                    }
                    if ui.button("Add Secret").clicked() {
                        actions.push(PanelAction::AddSecret);
                    }
                }
                Interaction::None => {
                    ui.label("This node has no interaction.");
                    ui.horizontal(|ui| {
                        if ui.button("Convert to Choices").clicked() {
                            actions.push(PanelAction::Convert(InteractionKind::Choices));
                        }
                        if ui.button("Convert to Entry Mode").clicked() {
                            actions.push(PanelAction::Convert(InteractionKind::EntryMode));
                        }
                    });
                }
            }

            ui.separator();
            if ui
                .button(RichText::new("Delete Node").color(Color32::DARK_RED))
                .clicked()
            {
                actions.push(PanelAction::Delete);
            }
        });

    if !actions.is_empty() {
        // structural edits shift field indices, so pending text goes in first
        app.flush_drafts();
    }
    for action in actions {
        apply(app, &id, action);
    }
}

/// A text field backed by a draft. The draft is committed when the field
/// loses focus and re-synced from the document while it is not being edited.
fn text_field(
    ui: &mut egui::Ui,
    drafts: &mut Drafts,
    id: &str,
    node: &Node,
    field: NodeField,
    multiline: bool,
    actions: &mut Vec<PanelAction>,
) {
    let current = get_field(node, field).unwrap_or("");
    let draft = drafts
        .entry((id.to_string(), field))
        .or_insert_with(|| current.to_string());
    let edit = if multiline {
        egui::TextEdit::multiline(draft).desired_rows(4)
    } else {
        egui::TextEdit::singleline(draft)
    };
    let resp = ui.add(edit.id_salt((id, field)).desired_width(f32::INFINITY));
    if resp.lost_focus() {
        if draft.as_str() != current {
            actions.push(PanelAction::SetField(field, draft.clone()));
        }
    } else if !resp.has_focus() && draft.as_str() != current {
        *draft = current.to_string();
    }
}

/// A node-id field with a picker of existing ids and a warning for ids that
/// do not exist.
fn link_field(
    ui: &mut egui::Ui,
    doc: &Document,
    drafts: &mut Drafts,
    id: &str,
    node: &Node,
    field: NodeField,
    actions: &mut Vec<PanelAction>,
) {
    ui.horizontal(|ui| {
        ui.menu_button("▾", |ui| {
            egui::ScrollArea::vertical().max_height(300.0).show(ui, |ui| {
                for target in doc.sorted_ids() {
                    if ui.button(target).clicked() {
                        actions.push(PanelAction::SetField(field, target.to_string()));
                        ui.close();
                    }
                }
            });
        });
        text_field(ui, drafts, id, node, field, false, actions);
    });
    let target = get_field(node, field).unwrap_or("");
    if !target.is_empty() && !doc.contains(target) {
        ui.colored_label(Color32::DARK_RED, format!("No node named '{target}'"));
    }
}

fn apply(app: &mut ConversationApp, id: &str, action: PanelAction) {
    let state = &mut app.state;
    let result = match action {
        PanelAction::SetField(field, value) => state.set_field(id, field, &value).map(|_| ()),
        PanelAction::AddChoice => state.add_choice(id),
        PanelAction::AddSecret => state.add_secret(id),
        PanelAction::RemoveChoice(i) => state.remove_choice(id, i),
        PanelAction::RemoveSecret(i) => state.remove_secret(id, i),
        PanelAction::Convert(kind) => state.convert(id, kind),
        PanelAction::Rename => {
            app.dialog = Some(Dialog::Rename {
                from: id.to_string(),
                to: id.to_string(),
            });
            Ok(())
        }
        PanelAction::Delete => {
            app.dialog = Some(Dialog::ConfirmDelete { id: id.to_string() });
            Ok(())
        }
    };
    app.report("Edit failed", result);
}
