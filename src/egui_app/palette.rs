#![cfg(feature = "egui")]

use eframe::egui::Color32;

use crate::color::Rgb;
use crate::config::ColorConfig;

pub fn to_color32(c: Rgb) -> Color32 {
    Color32::from_rgb(c.0, c.1, c.2)
}

/// Canvas colours resolved from the configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub node: Color32,
    pub node_selected: Color32,
    pub outline: Color32,
    pub text: Color32,
    pub line: Color32,
    pub background: Color32,
}

impl Palette {
    pub fn from_config(colors: &ColorConfig) -> Self {
        let defaults = ColorConfig::default();
        let pick = |value: &str, fallback: &str| to_color32(ColorConfig::resolve(value, fallback));
        Self {
            node: pick(&colors.node, &defaults.node),
            node_selected: pick(&colors.node_selected, &defaults.node_selected),
            outline: pick(&colors.outline, &defaults.outline),
            text: pick(&colors.text, &defaults.text),
            line: pick(&colors.line, &defaults.line),
            background: pick(&colors.background, &defaults.background),
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::from_config(&ColorConfig::default())
    }
}
