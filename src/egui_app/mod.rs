//! Desktop window for the conversation editor (feature = "egui").
//!
//! All editing goes through [`crate::state::EditorState`]; this module only
//! translates egui input into handler calls and paints the derived
//! [`crate::scene::Scene`].

#![cfg(feature = "egui")]

mod app;
mod canvas;
mod dialogs;
mod menu;
mod palette;
mod panel;

use anyhow::Result;
use eframe::egui;

use crate::state::EditorState;

pub use app::ConversationApp;
pub use palette::{Palette, to_color32};

/// Open the editor window and block until it closes.
pub fn run(state: EditorState) -> Result<()> {
    let size = state.viewport.size;
    let width = size.width.max(640.0) as f32 + panel::PANEL_WIDTH;
    let height = size.height.max(480.0) as f32;
    let viewport = egui::ViewportBuilder::default()
        .with_title(state.title())
        .with_inner_size([width, height]);
    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };
    eframe::run_native(
        crate::store::APP_TITLE,
        options,
        Box::new(|cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::light());
            // Ctrl+Plus/Minus/0 zoom the canvas, not the UI.
            cc.egui_ctx.options_mut(|o| o.zoom_with_keyboard = false);
            Ok(Box::new(ConversationApp::new(state)))
        }),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))?;
    Ok(())
}
