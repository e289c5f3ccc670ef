// src/config.rs

//! Defines the configuration structures for `sixterm`.
//!
//! The configuration is a tree of serde structs, each with `#[serde(default)]`
//! so a file only needs to mention the settings it changes. Files are JSON.
//! The process-wide configuration is available as `CONFIG`, loaded on first use
//! from the path in the `SIXTERM_CONFIG` environment variable.

use std::path::Path;

use anyhow::{Context, Result};
use log::{info, warn};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::color::{Color, NamedColor};
use crate::sixel::{
    DecodeLimits, DEFAULT_MAX_EXPANDED, DEFAULT_MAX_HEIGHT, DEFAULT_MAX_PAYLOAD_BYTES,
    DEFAULT_MAX_REPEAT, DEFAULT_MAX_WIDTH,
};

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "SIXTERM_CONFIG";

/// The global configuration, loaded lazily.
pub static CONFIG: Lazy<Config> = Lazy::new(Config::load_or_default);

// --- Top-Level Configuration Structure ---

/// The complete configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub appearance: AppearanceConfig,
    pub colors: ColorScheme,
    pub font: FontConfig,
    pub sixel: SixelConfig,
    pub performance: PerformanceConfig,
}

impl Config {
    /// Reads and parses a JSON configuration file.
    pub fn load(path: &Path) -> Result<Config> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Loads the file named by `SIXTERM_CONFIG`, falling back to defaults.
    pub fn load_or_default() -> Config {
        let Some(path) = std::env::var_os(CONFIG_PATH_ENV) else {
            info!("{} not set, using default configuration", CONFIG_PATH_ENV);
            return Config::default();
        };
        match Config::load(Path::new(&path)) {
            Ok(config) => {
                info!("Loaded configuration from {:?}", path);
                config
            }
            Err(e) => {
                warn!("{:#}. Using default configuration.", e);
                Config::default()
            }
        }
    }
}

// --- Appearance Configuration ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppearanceConfig {
    /// Initial number of columns, before the first resize.
    pub columns: usize,
    /// Initial number of rows, before the first resize.
    pub rows: usize,
    /// Number of lines kept above the screen once they scroll off.
    pub scrollback_lines: usize,
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        AppearanceConfig {
            columns: 80,
            rows: 24,
            scrollback_lines: 1000,
        }
    }
}

// --- Color Scheme Configuration ---

/// Colors the compositor applies on top of the cell attributes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ColorScheme {
    /// Foreground given to newly written text.
    pub foreground: Color,
    /// Background of empty and synthetic cells.
    pub background: Color,
    /// Background of the cell under a visible cursor.
    pub cursor: Color,
    /// Background of selected cells.
    pub selection: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        ColorScheme {
            foreground: NamedColor::White.to_color(),
            background: NamedColor::Black.to_color(),
            cursor: NamedColor::BrightWhite.to_color(),
            selection: NamedColor::Blue.to_color(),
        }
    }
}

// --- Font Configuration ---

/// Glyph metrics reported by the headless driver. Real drivers measure their font.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FontConfig {
    pub cell_width_px: f64,
    pub ascent_px: f64,
    pub descent_px: f64,
}

impl Default for FontConfig {
    fn default() -> Self {
        FontConfig {
            cell_width_px: 8.0,
            ascent_px: 13.0,
            descent_px: 3.0,
        }
    }
}

// --- Sixel Configuration ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SixelConfig {
    /// Payloads larger than this are discarded.
    pub max_payload_bytes: usize,
    /// Longest silence tolerated inside a payload before it is abandoned.
    pub payload_timeout_ms: u64,
    pub max_repeat: usize,
    /// Upper bound on the payload after repeat expansion, in characters.
    pub max_expanded: usize,
    pub max_width: usize,
    pub max_height: usize,
}

impl Default for SixelConfig {
    fn default() -> Self {
        SixelConfig {
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            payload_timeout_ms: 5_000,
            max_repeat: DEFAULT_MAX_REPEAT,
            max_expanded: DEFAULT_MAX_EXPANDED,
            max_width: DEFAULT_MAX_WIDTH,
            max_height: DEFAULT_MAX_HEIGHT,
        }
    }
}

impl SixelConfig {
    pub fn decode_limits(&self) -> DecodeLimits {
        DecodeLimits {
            max_repeat: self.max_repeat,
            max_expanded: self.max_expanded,
            max_width: self.max_width,
            max_height: self.max_height,
        }
    }
}

// --- Performance Configuration ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Time between render ticks.
    pub frame_interval_ms: u64,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        PerformanceConfig {
            frame_interval_ms: 16,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: Config =
            serde_json::from_str(r#"{ "colors": { "cursor": [1.0, 0.0, 0.0] } }"#).unwrap();
        assert_eq!(config.colors.cursor, Color::new(1.0, 0.0, 0.0));
        assert_eq!(config.colors.background, ColorScheme::default().background);
        assert_eq!(config.appearance, AppearanceConfig::default());
    }

    #[test]
    fn sixel_limits_follow_config() {
        let config: Config =
            serde_json::from_str(r#"{ "sixel": { "max_width": 64, "max_repeat": 10 } }"#).unwrap();
        let limits = config.sixel.decode_limits();
        assert_eq!(limits.max_width, 64);
        assert_eq!(limits.max_repeat, 10);
        assert_eq!(limits.max_height, DEFAULT_MAX_HEIGHT);
        assert_eq!(limits.max_expanded, DEFAULT_MAX_EXPANDED);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(Config::load(Path::new("/nonexistent/sixterm.json")).is_err());
    }
}
