//! Editor configuration: node geometry, zoom behaviour, and colours.
//!
//! Every field has a default, so a config file only needs to name what it
//! changes:
//!
//! ```json
//! { "zoom": { "max": 5.0 }, "colors": { "node": "#ffeeaa" } }
//! ```

use anyhow::{Context, Result, bail};
use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::color::{Rgb, parse_color};
use crate::geometry::{Size, ZoomLimits};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Node box width in world units (drawn at `node_width * zoom`).
    pub node_width: f64,
    pub node_height: f64,
    /// Label font size at zoom 1.
    pub font_size: f64,
    /// Arrowhead length at zoom 1.
    pub arrow_size: f64,
    /// Distance an edge starts away from its source center, in world units.
    pub edge_offset: f64,
    pub zoom: ZoomConfig,
    pub colors: ColorConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            node_width: 180.0,
            node_height: 100.0,
            font_size: 10.0,
            arrow_size: 12.0,
            edge_offset: 10.0,
            zoom: ZoomConfig::default(),
            colors: ColorConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    pub initial: f64,
    pub min: f64,
    pub max: f64,
    /// Factor for View > Zoom In.
    pub step_in: f64,
    /// Factor for View > Zoom Out.
    pub step_out: f64,
    /// Factor per wheel notch towards the user.
    pub wheel_in: f64,
    pub wheel_out: f64,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            initial: 1.0,
            min: 0.2,
            max: 3.0,
            step_in: 1.2,
            step_out: 0.8,
            wheel_in: 1.1,
            wheel_out: 0.9,
        }
    }
}

/// Colours as names (`"lightblue"`), `#rrggbb`, or `[r, g, b]` in 0..=1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub node: String,
    pub node_selected: String,
    pub outline: String,
    pub text: String,
    pub line: String,
    pub background: String,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            node: "lightblue".into(),
            node_selected: "deepskyblue".into(),
            outline: "black".into(),
            text: "black".into(),
            line: "gray".into(),
            background: "white".into(),
        }
    }
}

impl ColorConfig {
    /// Resolve a configured colour, falling back to `fallback` (itself a colour
    /// string from the defaults) when it does not parse.
    pub fn resolve(value: &str, fallback: &str) -> Rgb {
        parse_color(value).unwrap_or_else(|| {
            log::warn!("unrecognised colour {value:?}, using {fallback}");
            parse_color(fallback).unwrap_or(Rgb(0, 0, 0))
        })
    }
}

impl EditorConfig {
    /// Read a JSON config file. Missing fields keep their defaults.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let text =
            std::fs::read_to_string(path).with_context(|| format!("Read config {}", path))?;
        let cfg: EditorConfig =
            serde_json::from_str(&text).with_context(|| format!("Parse config {}", path))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.node_width > 0.0 && self.node_height > 0.0) {
            bail!(
                "node size must be positive, got {}x{}",
                self.node_width,
                self.node_height
            );
        }
        let z = &self.zoom;
        if !(z.min > 0.0 && z.min <= z.max) {
            bail!("invalid zoom range [{}, {}]", z.min, z.max);
        }
        if !self.zoom_limits().contains(z.initial) {
            bail!("initial zoom {} outside [{}, {}]", z.initial, z.min, z.max);
        }
        for (name, f) in [
            ("step_in", z.step_in),
            ("step_out", z.step_out),
            ("wheel_in", z.wheel_in),
            ("wheel_out", z.wheel_out),
        ] {
            if f <= 0.0 {
                bail!("zoom {name} must be positive, got {f}");
            }
        }
        Ok(())
    }

    /// Unscaled node size: the world-space extent used for hit-testing.
    pub fn base_size(&self) -> Size {
        Size::new(self.node_width, self.node_height)
    }

    pub fn zoom_limits(&self) -> ZoomLimits {
        ZoomLimits {
            min: self.zoom.min,
            max: self.zoom.max,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = EditorConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.base_size(), Size::new(180.0, 100.0));
        assert_eq!(cfg.zoom_limits(), ZoomLimits { min: 0.2, max: 3.0 });
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let cfg: EditorConfig =
            serde_json::from_str(r#"{"zoom": {"max": 5.0}, "colors": {"node": "pink"}}"#).unwrap();
        assert_eq!(cfg.zoom.max, 5.0);
        assert_eq!(cfg.zoom.min, 0.2);
        assert_eq!(cfg.colors.node, "pink");
        assert_eq!(cfg.colors.line, "gray");
        assert_eq!(cfg.node_width, 180.0);
    }

    #[test]
    fn test_validate_rejects_bad_ranges() {
        let mut cfg = EditorConfig::default();
        cfg.zoom.min = 4.0;
        assert!(cfg.validate().is_err());

        let mut cfg = EditorConfig::default();
        cfg.zoom.initial = 10.0;
        assert!(cfg.validate().unwrap_err().to_string().contains("initial zoom"));

        let mut cfg = EditorConfig::default();
        cfg.node_height = 0.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_resolve_falls_back() {
        assert_eq!(ColorConfig::resolve("nope", "white"), Rgb(255, 255, 255));
        assert_eq!(ColorConfig::resolve("#010203", "white"), Rgb(1, 2, 3));
    }
}
