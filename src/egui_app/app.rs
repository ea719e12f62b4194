#![cfg(feature = "egui")]

use std::collections::HashMap;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use eframe::egui::{self, RichText};

use super::dialogs::{self, Dialog};
use super::palette::Palette;
use super::{canvas, menu, panel};
use crate::operations::NodeField;
use crate::state::{EditorState, SaveOutcome};
use crate::store;

/// File-level actions that may throw away unsaved edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    New,
    Open,
    Exit,
}

/// The editor window.
pub struct ConversationApp {
    pub state: EditorState,
    /// In-progress text of property fields, keyed by node and field. A draft
    /// is committed when its text field loses focus, or by
    /// [`ConversationApp::flush_drafts`] before anything that could strand it.
    pub(crate) drafts: HashMap<(String, NodeField), String>,
    pub(crate) dialog: Option<Dialog>,
    pub(crate) palette: Palette,
    title: String,
    allow_close: bool,
}

impl ConversationApp {
    pub fn new(state: EditorState) -> Self {
        let palette = Palette::from_config(&state.config.colors);
        Self {
            state,
            drafts: HashMap::new(),
            dialog: None,
            palette,
            title: String::new(),
            allow_close: false,
        }
    }

    /// Commit every pending field edit and forget the drafts. Runs before
    /// selection changes, saves, history steps and file actions.
    pub(crate) fn flush_drafts(&mut self) {
        if self.drafts.is_empty() {
            return;
        }
        let drafts = std::mem::take(&mut self.drafts);
        let changed = self.state.commit_drafts(drafts);
        if changed > 0 {
            log::debug!("committed {changed} pending field edit(s)");
        }
    }

    /// Show an error window for a failed action. Returns whether it succeeded.
    pub(crate) fn report(&mut self, what: &str, result: anyhow::Result<()>) -> bool {
        match result {
            Ok(()) => true,
            Err(e) => {
                log::error!("{what}: {e:#}");
                self.state.status = format!("{what}: {e}");
                self.dialog = Some(Dialog::error(what, format!("{e:#}")));
                false
            }
        }
    }

    /// Run `action`, asking first when it would drop unsaved changes.
    pub(crate) fn request(&mut self, ctx: &egui::Context, action: FileAction) {
        self.flush_drafts();
        if self.state.dirty {
            self.dialog = Some(Dialog::ConfirmDiscard(action));
        } else {
            self.perform(ctx, action);
        }
    }

    pub(crate) fn perform(&mut self, ctx: &egui::Context, action: FileAction) {
        match action {
            FileAction::New => {
                self.state.new_document();
                self.drafts.clear();
            }
            FileAction::Open => self.open_with_dialog(),
            FileAction::Exit => {
                self.allow_close = true;
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
        }
    }

    fn open_with_dialog(&mut self) {
        let mut dialog = rfd::FileDialog::new().add_filter("JSON", &["json"]);
        if let Some(dir) = self.current_dir() {
            dialog = dialog.set_directory(dir);
        }
        let Some(path) = dialog.pick_file() else {
            return;
        };
        let result = utf8_path(path).and_then(|p| self.state.open(&p));
        self.drafts.clear();
        self.report("Load failed", result);
    }

    pub(crate) fn save(&mut self) {
        self.flush_drafts();
        match self.state.save() {
            Ok(SaveOutcome::Saved(_)) => {}
            Ok(SaveOutcome::NeedsPath) => self.save_with_dialog(),
            Err(e) => {
                self.report("Save failed", Err(e));
            }
        }
    }

    pub(crate) fn save_with_dialog(&mut self) {
        self.flush_drafts();
        let name = self
            .state
            .file_path
            .as_ref()
            .and_then(|p| p.file_name())
            .unwrap_or(store::AUTOLOAD_FILE)
            .to_string();
        let mut dialog = rfd::FileDialog::new()
            .add_filter("JSON", &["json"])
            .set_file_name(name);
        if let Some(dir) = self.current_dir() {
            dialog = dialog.set_directory(dir);
        }
        let Some(path) = dialog.save_file() else {
            return;
        };
        let result = utf8_path(path).and_then(|p| self.state.save_as(&p));
        self.report("Save failed", result);
    }

    fn current_dir(&self) -> Option<Utf8PathBuf> {
        self.state
            .file_path
            .as_ref()
            .and_then(|p| p.parent())
            .filter(|d| !d.as_str().is_empty())
            .map(|d| d.to_path_buf())
    }

    fn status_bar(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(&self.state.status);
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("{:.0}%", self.state.viewport.zoom * 100.0));
                ui.separator();
                ui.label(format!("{} node(s)", self.state.document.len()));
                if self.state.dirty {
                    ui.separator();
                    ui.label(RichText::new("modified").italics());
                }
            });
        });
    }

    fn sync_title(&mut self, ctx: &egui::Context) {
        let mut title = self.state.title();
        if self.state.dirty {
            title.push_str(" *");
        }
        if title != self.title {
            ctx.send_viewport_cmd(egui::ViewportCommand::Title(title.clone()));
            self.title = title;
        }
    }
}

fn utf8_path(path: PathBuf) -> anyhow::Result<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(path)
        .map_err(|p| anyhow::anyhow!("path is not valid UTF-8: {}", p.display()))
}

impl eframe::App for ConversationApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if ctx.input(|i| i.viewport().close_requested()) && !self.allow_close {
            self.flush_drafts();
            if self.state.dirty {
                ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
                self.dialog = Some(Dialog::ConfirmDiscard(FileAction::Exit));
            }
        }

        menu::handle_shortcuts(self, ctx);

        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| menu::menu_bar(self, ui));
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| self.status_bar(ui));
        egui::SidePanel::right("properties")
            .resizable(true)
            .default_width(panel::PANEL_WIDTH)
            .show(ctx, |ui| panel::show(self, ui));
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| canvas::show(self, ui));

        dialogs::show(self, ctx);
        self.sync_title(ctx);
    }
}
