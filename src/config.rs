// ============================================================================
// WIDGET CONFIGURATION
// ============================================================================

use std::fs;
use std::path::{Path, PathBuf};

use bon::Builder;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::geometry::Margins;

pub const ARC_MARGIN: f32 = 65.0;
pub const ARC_ROTATION_ANGLE: f32 = 70.0;
pub const STROKE_WIDTH: f32 = 24.0;
pub const TEXT_SIZE: f32 = 200.0;
pub const TEXT_VALUE: i32 = 10;
pub const ANIMATION_DURATION_MS: u32 = 1000;
pub const SWEEP_ANGLE: f32 = 300.0;
/// Where the arc stroke begins before any rotation, in degrees clockwise from 3 o'clock
pub const START_ANGLE: f32 = 330.0;
pub const SCALE_PERCENT: u32 = 16;
pub const FULL_TURN: f32 = 360.0;
pub const COLOR: Color = Color::new(0x00, 0x00, 0x00);

/// Errors raised while reading widget attributes
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read attribute file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse attributes: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid color '{0}', expected #RRGGBB or #AARRGGBB")]
    InvalidColor(String),
}

/// Color representation for widget elements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#RRGGBB` or `#AARRGGBB`; the alpha byte is ignored
    pub fn parse_hex(text: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidColor(text.to_string());
        let digits = text.trim().strip_prefix('#').ok_or_else(invalid)?;
        let rgb = match digits.len() {
            6 => digits,
            8 => digits.get(2..).ok_or_else(invalid)?,
            _ => return Err(invalid()),
        };
        let channel = |range: std::ops::Range<usize>| {
            rgb.get(range)
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(invalid)
        };
        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

#[derive(Debug, Clone, Builder)]
pub struct ForwardConfig {
    #[builder(default = "Forward".to_string())]
    pub title: String,

    // Appearance
    #[builder(default = COLOR)]
    pub color: Color,
    #[builder(default = Color::new(0xff, 0xff, 0xff))]
    pub background_color: Color,
    #[builder(default = STROKE_WIDTH)]
    pub stroke_width: f32,
    #[builder(default = TEXT_SIZE)]
    pub text_size: f32,
    #[builder(default = TEXT_VALUE)]
    pub text_value: i32,
    #[builder(default = SWEEP_ANGLE)]
    pub sweep_angle: f32,
    #[builder(default = ARC_MARGIN)]
    pub arc_margin: f32,

    // Animation
    #[builder(default = ANIMATION_DURATION_MS)]
    pub animation_duration_ms: u32,
    #[builder(default = ARC_ROTATION_ANGLE)]
    pub arc_rotation_angle: f32,
    /// How far the arc shrinks at the bottom of the animation, 0 to 100
    #[builder(default = SCALE_PERCENT)]
    pub scale_percent: u32,

    // Window configuration
    #[builder(default = 720)]
    pub window_width: usize,
    #[builder(default = 360)]
    pub window_height: usize,
    #[builder(default = 60.0)]
    pub max_framerate: f64,

    /// TrueType/OpenType bytes for the labels; labels are skipped without one
    pub font_data: Option<Vec<u8>>,
}

impl Default for ForwardConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ForwardConfig {
    pub fn arrow_margin(&self) -> f32 {
        self.arc_margin * 10.0 / 13.0
    }

    pub fn margins(&self) -> Margins {
        Margins {
            arc: self.arc_margin,
            arrow: self.arrow_margin(),
        }
    }

    /// The configured duration scaled down to the unit all stages divide
    pub fn base_duration_ms(&self) -> u64 {
        self.animation_duration_ms as u64 * 10 / 27
    }

    pub fn end_scale(&self) -> f32 {
        self.scale_percent as f32 / 100.0
    }

    pub fn center_label(&self) -> String {
        self.text_value.to_string()
    }

    pub fn shifting_label(&self) -> String {
        format!("+{}", self.text_value)
    }

    /// Resolves loaded attributes, replacing each invalid value with its default
    pub fn from_attributes(attributes: &Attributes) -> Self {
        let mut config = Self::default();

        if let Some(title) = &attributes.title {
            config.title = title.clone();
        }
        if let Some(color) = &attributes.color {
            match Color::parse_hex(color) {
                Ok(parsed) => config.color = parsed,
                Err(e) => warn!("{e}; using default color"),
            }
        }
        if let Some(color) = &attributes.background_color {
            match Color::parse_hex(color) {
                Ok(parsed) => config.background_color = parsed,
                Err(e) => warn!("{e}; using default background"),
            }
        }

        config.stroke_width = non_negative("stroke_width", attributes.stroke_width, STROKE_WIDTH);
        config.text_size = positive("text_size", attributes.text_size, TEXT_SIZE);
        config.arc_margin = non_negative("arc_margin", attributes.arc_margin, ARC_MARGIN);
        config.sweep_angle = sweep("sweep_angle", attributes.sweep_angle, SWEEP_ANGLE);
        config.arc_rotation_angle = turn(
            "arc_rotation_angle",
            attributes.arc_rotation_angle,
            ARC_ROTATION_ANGLE,
        );
        config.text_value = attributes.text_value.unwrap_or(TEXT_VALUE);

        if let Some(duration) = attributes.animation_duration {
            match u32::try_from(duration) {
                Ok(duration) => config.animation_duration_ms = duration,
                Err(_) => warn!(duration, "animation_duration out of range; using default"),
            }
        }
        if let Some(percent) = attributes.scale_percent {
            match u32::try_from(percent) {
                Ok(percent) if percent <= 100 => config.scale_percent = percent,
                _ => warn!(percent, "scale_percent must be within 0..=100; using default"),
            }
        }

        if let Some(width) = attributes.window_width.filter(|w| *w > 0) {
            config.window_width = width;
        }
        if let Some(height) = attributes.window_height.filter(|h| *h > 0) {
            config.window_height = height;
        }

        if let Some(path) = &attributes.font_path {
            match fs::read(path) {
                Ok(bytes) => config.font_data = Some(bytes),
                Err(e) => warn!(path = %path.display(), "could not read font: {e}"),
            }
        }

        config
    }

    /// Loads attributes from a TOML file, falling back to defaults on any error
    pub fn load_or_default(path: &Path) -> Self {
        match Attributes::load(path) {
            Ok(attributes) => Self::from_attributes(&attributes),
            Err(e) => {
                warn!("{e}; using default configuration");
                Self::default()
            }
        }
    }
}

fn non_negative(name: &str, value: Option<f32>, default: f32) -> f32 {
    match value {
        Some(v) if v.is_finite() && v >= 0.0 => v,
        Some(v) => {
            warn!(attribute = name, value = v, "negative size; using default");
            default
        }
        None => default,
    }
}

/// A full turn either way; wider sweeps are clamped
fn sweep(name: &str, value: Option<f32>, default: f32) -> f32 {
    match value {
        Some(v) if v.is_finite() && v.abs() <= FULL_TURN => v,
        Some(v) if v.is_finite() => {
            warn!(attribute = name, value = v, "angle beyond a full turn; clamping");
            v.clamp(-FULL_TURN, FULL_TURN)
        }
        Some(v) => {
            warn!(attribute = name, value = v, "angle must be finite; using default");
            default
        }
        None => default,
    }
}

fn turn(name: &str, value: Option<f32>, default: f32) -> f32 {
    match value {
        Some(v) if v.is_finite() && v.abs() <= FULL_TURN => v,
        Some(v) => {
            warn!(attribute = name, value = v, "angle out of range; using default");
            default
        }
        None => default,
    }
}

fn positive(name: &str, value: Option<f32>, default: f32) -> f32 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v,
        Some(v) => {
            warn!(attribute = name, value = v, "size must be positive; using default");
            default
        }
        None => default,
    }
}

// ============================================================================
// ATTRIBUTE FILES
// ============================================================================

/// Raw widget attributes as written in a TOML file; every key is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Attributes {
    pub title: Option<String>,
    pub color: Option<String>,
    pub background_color: Option<String>,
    pub stroke_width: Option<f32>,
    pub text_size: Option<f32>,
    pub text_value: Option<i32>,
    pub animation_duration: Option<i64>,
    pub arc_rotation_angle: Option<f32>,
    pub arc_margin: Option<f32>,
    pub sweep_angle: Option<f32>,
    pub scale_percent: Option<i64>,
    pub window_width: Option<usize>,
    pub window_height: Option<usize>,
    pub font_path: Option<PathBuf>,
}

impl Attributes {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_widget_constants() {
        let config = ForwardConfig::default();
        assert_eq!(config.arc_margin, 65.0);
        assert_eq!(config.arrow_margin(), 50.0);
        assert_eq!(config.base_duration_ms(), 370);
        assert_eq!(config.end_scale(), 0.16);
        assert_eq!(config.center_label(), "10");
        assert_eq!(config.shifting_label(), "+10");
        assert!(config.font_data.is_none());
    }

    #[test]
    fn builder_overrides_selected_fields() {
        let config = ForwardConfig::builder()
            .text_value(30)
            .animation_duration_ms(2700)
            .build();
        assert_eq!(config.shifting_label(), "+30");
        assert_eq!(config.base_duration_ms(), 1000);
        assert_eq!(config.sweep_angle, SWEEP_ANGLE);
    }

    #[test]
    fn parses_hex_colors() {
        assert_eq!(Color::parse_hex("#ff8000").unwrap(), Color::new(0xff, 0x80, 0x00));
        assert_eq!(Color::parse_hex("#80102030").unwrap(), Color::new(0x10, 0x20, 0x30));
        assert!(Color::parse_hex("ff8000").is_err());
        assert!(Color::parse_hex("#ff80").is_err());
        assert!(Color::parse_hex("#gg0000").is_err());
    }

    #[test]
    fn attributes_resolve_onto_defaults() {
        let attributes = Attributes::from_toml_str(
            r##"
            color = "#336699"
            text_value = 30
            animation_duration = 2000
            scale_percent = 25
            arc_margin = 40.0
            "##,
        )
        .unwrap();
        let config = ForwardConfig::from_attributes(&attributes);
        assert_eq!(config.color, Color::new(0x33, 0x66, 0x99));
        assert_eq!(config.text_value, 30);
        assert_eq!(config.base_duration_ms(), 740);
        assert_eq!(config.end_scale(), 0.25);
        assert_eq!(config.arc_margin, 40.0);
        assert_eq!(config.stroke_width, STROKE_WIDTH);
    }

    #[test]
    fn malformed_values_fall_back_individually() {
        let attributes = Attributes::from_toml_str(
            r##"
            color = "black"
            stroke_width = -3.0
            text_size = 0.0
            scale_percent = 140
            animation_duration = -5
            text_value = 5
            "##,
        )
        .unwrap();
        let config = ForwardConfig::from_attributes(&attributes);
        assert_eq!(config.color, COLOR);
        assert_eq!(config.stroke_width, STROKE_WIDTH);
        assert_eq!(config.text_size, TEXT_SIZE);
        assert_eq!(config.scale_percent, SCALE_PERCENT);
        assert_eq!(config.animation_duration_ms, ANIMATION_DURATION_MS);
        assert_eq!(config.text_value, 5);
    }

    #[test]
    fn huge_sweep_is_clamped_to_a_full_turn() {
        let attributes = Attributes::from_toml_str("sweep_angle = 1e12").unwrap();
        assert_eq!(ForwardConfig::from_attributes(&attributes).sweep_angle, 360.0);

        let attributes = Attributes::from_toml_str("sweep_angle = -1e12").unwrap();
        assert_eq!(ForwardConfig::from_attributes(&attributes).sweep_angle, -360.0);
    }

    #[test]
    fn non_finite_angles_fall_back() {
        for text in ["sweep_angle = inf", "sweep_angle = nan", "sweep_angle = -inf"] {
            let attributes = Attributes::from_toml_str(text).unwrap();
            assert_eq!(ForwardConfig::from_attributes(&attributes).sweep_angle, SWEEP_ANGLE);
        }

        let attributes = Attributes::from_toml_str(
            "arc_rotation_angle = nan\nsweep_angle = 180.0",
        )
        .unwrap();
        let config = ForwardConfig::from_attributes(&attributes);
        assert_eq!(config.arc_rotation_angle, ARC_ROTATION_ANGLE);
        assert_eq!(config.sweep_angle, 180.0);

        let attributes = Attributes::from_toml_str("arc_rotation_angle = 1e9").unwrap();
        assert_eq!(
            ForwardConfig::from_attributes(&attributes).arc_rotation_angle,
            ARC_ROTATION_ANGLE
        );
    }

    #[test]
    fn unparsable_file_is_an_error() {
        let result = Attributes::from_toml_str("stroke_width = \"thick\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn missing_file_loads_defaults() {
        let config = ForwardConfig::load_or_default(Path::new("/nonexistent/forward.toml"));
        assert_eq!(config.text_value, TEXT_VALUE);
        assert_eq!(config.base_duration_ms(), 370);
    }
}
