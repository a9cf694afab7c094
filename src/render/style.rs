//! Style configuration: palette, layer visibility and cache epoch keys.
//!
//! The tile pipeline never interprets colour values itself; it only uses
//! the epoch key history to version cached bitmaps and the lookups below
//! to gate drawing inside the layer painters.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tiny_skia::Color;

use crate::section::StyleRef;

/// How many prior style epochs `draw_tile` may fall back to before
/// degrading to a coarser level, so a recolour does not flash blank while
/// tiles re-render in the background.
pub const STYLE_KEY_HISTORY: usize = 4;

/// Palette entries known out of the box, from the stock sector styling.
pub const DEFAULT_PALETTE: &[(&str, &str)] = &[
    ("COAST", "#272727"),
    ("PIER", "#002412"),
    ("DANGER", "#443402"),
    ("RESTRICT", "#242300"),
    ("PROHIBIT", "#310c02"),
    ("TAXI_CENTER", "#0d0"),
    ("TAXIWAY", "#00ea75"),
    ("RUNWAY", "#2d1c2c"),
    ("RUNWAYCENTER", "#9aa3f1"),
    ("STOPBAR", "#b30000"),
    ("BUILDING", "#a0a0a0"),
    ("APRON", "#2c1c2c"),
    ("AIRPORTLABEL", "#282828"),
    ("FIXLABEL", "#404040"),
    ("STOPLINE", "white"),
    ("GRASS", "green"),
    ("DYN_ACC_BKGND", "transparent"),
    ("DYN_ACC_CONTOUR", "transparent"),
    ("ILSDRAW", "white"),
    ("APTMARK", "red"),
    ("APPRON", "gray"),
    ("RWYFILL", "gray"),
    ("RWYEDGE", "gray"),
    ("APRFILL", "gray"),
    ("APREDGE", "gray"),
    ("TAXI_CENTER_BLUE", "blue"),
    ("ILSGATE", "green"),
    ("YELLOW", "yellow"),
    ("LIGHTGREY", "lightgrey"),
    ("DARKGREY", "darkgrey"),
    ("MIDDLEGREY", "gray"),
    ("PILOT", "#3b6fd5"),
];

/// Layers visible unless the configuration says otherwise. Anything not
/// listed here is hidden until explicitly enabled.
pub const DEFAULT_LAYERS: &[&str] = &[
    "RUNWAYS",
    "GROUND",
    "LABELS",
    "PILOTS",
    "COAST",
    "PIER",
    "DANGER",
    "RESTRICT",
    "PROHIBIT",
    "TAXI_CENTER",
    "TAXIWAY",
    "RUNWAY",
    "RUNWAYCENTER",
    "STOPBAR",
    "BUILDING",
    "APRON",
    "AIRPORTLABEL",
    "FIXLABEL",
];

/// User-adjustable style overrides. Stored in ordered maps so the epoch
/// hash is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleConfig {
    pub palette: BTreeMap<String, String>,
    pub layers_visible: BTreeMap<String, bool>,
}

/// The live style state handed to the renderer every frame.
///
/// `keys` is the rolling epoch history, most-recent-first and bounded at
/// [`STYLE_KEY_HISTORY`]; replacing the configuration pushes a fresh epoch
/// to the front without discarding cached tiles of recent epochs.
pub struct StyleContext {
    config: StyleConfig,
    keys: Vec<Arc<str>>,
}

impl StyleContext {
    pub fn new(config: StyleConfig) -> Self {
        let epoch = Self::epoch(&config);
        Self {
            config,
            keys: vec![epoch],
        }
    }

    /// Epoch hash history, most-recent-first.
    pub fn keys(&self) -> &[Arc<str>] {
        &self.keys
    }

    pub fn current_key(&self) -> Arc<str> {
        self.keys[0].clone()
    }

    pub fn config(&self) -> &StyleConfig {
        &self.config
    }

    /// Replaces the configuration, rolling the epoch history forward.
    pub fn set_config(&mut self, config: StyleConfig) {
        let epoch = Self::epoch(&config);
        self.config = config;
        if self.keys.first() != Some(&epoch) {
            self.keys.insert(0, epoch);
            self.keys.truncate(STYLE_KEY_HISTORY);
        }
    }

    /// Resolves a palette name through overrides and defaults. `None` means
    /// the name is unknown.
    pub fn colour(&self, name: &str) -> Option<Color> {
        let value = self
            .config
            .palette
            .get(name)
            .map(String::as_str)
            .or_else(|| {
                DEFAULT_PALETTE
                    .iter()
                    .find(|(key, _)| *key == name)
                    .map(|(_, value)| *value)
            })?;
        parse_colour(value)
    }

    pub fn show_layer(&self, name: &str) -> bool {
        self.config
            .layers_visible
            .get(name)
            .copied()
            .unwrap_or_else(|| DEFAULT_LAYERS.contains(&name))
    }

    /// Resolves a section style reference to a drawable colour. Literal
    /// colours always draw; named entries are gated by layer visibility.
    /// An unknown name is logged and skipped (a bad style must not take
    /// the whole tile down).
    pub fn resolve(&self, style: &StyleRef) -> Option<Color> {
        match style {
            StyleRef::Rgb(value) => Some(colour_from_number(*value)),
            StyleRef::Name(name) => match self.colour(name) {
                Some(colour) if self.show_layer(name) => Some(colour),
                Some(_) => None,
                None => {
                    log::warn!("missing style {name}");
                    None
                }
            },
        }
    }

    fn epoch(config: &StyleConfig) -> Arc<str> {
        let canonical = serde_json::to_string(config).unwrap_or_default();
        Arc::from(format!("{:016x}", fxhash::hash64(&canonical)))
    }
}

impl Default for StyleContext {
    fn default() -> Self {
        Self::new(StyleConfig::default())
    }
}

/// Converts a packed `0xRRGGBB` value.
pub fn colour_from_number(value: u32) -> Color {
    Color::from_rgba8(
        ((value >> 16) & 0xff) as u8,
        ((value >> 8) & 0xff) as u8,
        (value & 0xff) as u8,
        255,
    )
}

/// Parses `#rgb`, `#rrggbb`, `#rrggbbaa` and the handful of CSS colour
/// names the stock palette uses.
pub fn parse_colour(value: &str) -> Option<Color> {
    if let Some(hex) = value.strip_prefix('#') {
        return parse_hex(hex);
    }

    let named = match value {
        "white" => (255, 255, 255, 255),
        "black" => (0, 0, 0, 255),
        "red" => (255, 0, 0, 255),
        "green" => (0, 128, 0, 255),
        "blue" => (0, 0, 255, 255),
        "yellow" => (255, 255, 0, 255),
        "gray" | "grey" => (128, 128, 128, 255),
        "lightgrey" | "lightgray" => (211, 211, 211, 255),
        "darkgrey" | "darkgray" => (169, 169, 169, 255),
        "transparent" => (0, 0, 0, 0),
        _ => return None,
    };
    Some(Color::from_rgba8(named.0, named.1, named.2, named.3))
}

fn parse_hex(hex: &str) -> Option<Color> {
    let nibble = |i: usize| u8::from_str_radix(hex.get(i..i + 1)?, 16).ok();
    let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();

    match hex.len() {
        3 => {
            let (r, g, b) = (nibble(0)?, nibble(1)?, nibble(2)?);
            Some(Color::from_rgba8(r * 17, g * 17, b * 17, 255))
        }
        6 => Some(Color::from_rgba8(byte(0)?, byte(2)?, byte(4)?, 255)),
        8 => Some(Color::from_rgba8(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_colour_forms() {
        assert_eq!(
            parse_colour("#272727"),
            Some(Color::from_rgba8(0x27, 0x27, 0x27, 255))
        );
        assert_eq!(
            parse_colour("#0d0"),
            Some(Color::from_rgba8(0, 0xdd, 0, 255))
        );
        assert_eq!(parse_colour("white"), Some(Color::from_rgba8(255, 255, 255, 255)));
        assert_eq!(parse_colour("transparent"), Some(Color::from_rgba8(0, 0, 0, 0)));
        assert_eq!(parse_colour("#nothex"), None);
        assert_eq!(parse_colour("mauve"), None);
    }

    #[test]
    fn test_epoch_rolls_forward_on_change() {
        let mut style = StyleContext::default();
        let first = style.current_key();

        let mut config = StyleConfig::default();
        config.palette.insert("COAST".to_string(), "#123456".to_string());
        style.set_config(config.clone());

        assert_ne!(style.current_key(), first);
        assert_eq!(style.keys().len(), 2);
        assert_eq!(style.keys()[1], first);

        // Re-applying the same config must not roll the history.
        style.set_config(config);
        assert_eq!(style.keys().len(), 2);
    }

    #[test]
    fn test_epoch_history_is_bounded() {
        let mut style = StyleContext::default();
        for i in 0..10 {
            let mut config = StyleConfig::default();
            config.palette.insert("COAST".to_string(), format!("#{i:06x}"));
            style.set_config(config);
        }
        assert_eq!(style.keys().len(), STYLE_KEY_HISTORY);
    }

    #[test]
    fn test_resolve_gates_on_visibility() {
        let mut config = StyleConfig::default();
        config.layers_visible.insert("COAST".to_string(), false);
        let style = StyleContext::new(config);

        assert!(style.resolve(&StyleRef::Name("COAST".to_string())).is_none());
        // Literal colours bypass visibility.
        assert!(style.resolve(&StyleRef::Rgb(0xff0000)).is_some());
    }

    #[test]
    fn test_overrides_win_over_defaults() {
        let mut config = StyleConfig::default();
        config.palette.insert("COAST".to_string(), "#ffffff".to_string());
        let style = StyleContext::new(config);
        assert_eq!(
            style.colour("COAST"),
            Some(Color::from_rgba8(255, 255, 255, 255))
        );
    }
}
