//! Render configuration: the immutable value describing one render request.
//!
//! Every field has a default, and `#[serde(default)]` lets a partial JSON
//! document overlay those defaults:
//!
//! ```rust
//! use qrcanvas::config::{ModuleStyle, RenderConfig};
//!
//! let json = r#"{ "payload": "hello", "moduleStyle": "dot" }"#;
//! let config = RenderConfig::from_json_str(json).unwrap();
//! assert_eq!(config.module_style, ModuleStyle::Dot);
//! assert_eq!(config.pixel_size.width, 300);
//! ```

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use image::Rgba;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Payload rendered when the configured one is empty.
pub const PLACEHOLDER_PAYLOAD: &str = "https://example.com";

/// An RGBA color. Alpha 0 is the `transparent` sentinel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const TRANSPARENT: Color = Color { r: 0, g: 0, b: 0, a: 0 };

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }

    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, self.a])
    }

    /// Linear interpolation per channel, `t` clamped to `[0, 1]`.
    pub fn lerp(self, other: Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Color {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }
}

impl FromStr for Color {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("transparent") {
            return Ok(Color::TRANSPARENT);
        }
        let invalid = || ConfigError::InvalidColor(s.to_string());
        let hex = s.strip_prefix('#').ok_or_else(invalid)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        let nibble = |i: usize| {
            u8::from_str_radix(&hex[i..i + 1], 16)
                .map(|v| v * 17)
                .map_err(|_| invalid())
        };
        match hex.len() {
            3 => Ok(Color::rgb(nibble(0)?, nibble(1)?, nibble(2)?)),
            6 => Ok(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Ok(Color { r: byte(0)?, g: byte(2)?, b: byte(4)?, a: byte(6)? }),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.a {
            0 => f.write_str("transparent"),
            255 => write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b),
            a => write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, a),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// QR error correction level, from lowest (L, ~7%) to highest (H, ~30%) recovery.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EccLevel {
    L,
    M,
    Q,
    #[default]
    H,
}

impl From<EccLevel> for qrcode::EcLevel {
    fn from(level: EccLevel) -> Self {
        match level {
            EccLevel::L => qrcode::EcLevel::L,
            EccLevel::M => qrcode::EcLevel::M,
            EccLevel::Q => qrcode::EcLevel::Q,
            EccLevel::H => qrcode::EcLevel::H,
        }
    }
}

impl FromStr for EccLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "L" => Ok(EccLevel::L),
            "M" => Ok(EccLevel::M),
            "Q" => Ok(EccLevel::Q),
            "H" => Ok(EccLevel::H),
            _ => Err(ConfigError::UnknownVariant {
                kind: "error correction level",
                value: s.to_string(),
            }),
        }
    }
}

/// Shape drawn for every dark module.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleStyle {
    #[default]
    Square,
    Rounded,
    Dot,
    Liquid,
}

impl ModuleStyle {
    pub const ALL: [ModuleStyle; 4] = [
        ModuleStyle::Square,
        ModuleStyle::Rounded,
        ModuleStyle::Dot,
        ModuleStyle::Liquid,
    ];
}

impl FromStr for ModuleStyle {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "square" => Ok(ModuleStyle::Square),
            "rounded" => Ok(ModuleStyle::Rounded),
            "dot" => Ok(ModuleStyle::Dot),
            "liquid" => Ok(ModuleStyle::Liquid),
            _ => Err(ConfigError::UnknownVariant { kind: "module style", value: s.to_string() }),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    pub const fn square(side: u32) -> Self {
        Self { width: side, height: side }
    }
}

impl Default for PixelSize {
    fn default() -> Self {
        Self::square(300)
    }
}

/// Logo overlay. `image_bytes` holds an encoded image (PNG, JPEG, ...) and
/// serializes as base64.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LogoConfig {
    #[serde(with = "base64_bytes")]
    pub image_bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub margin: u32,
    pub corner_radius: u32,
    pub background_color: Color,
}

impl Default for LogoConfig {
    fn default() -> Self {
        Self {
            image_bytes: Vec::new(),
            width: 60,
            height: 60,
            margin: 5,
            corner_radius: 8,
            background_color: Color::WHITE,
        }
    }
}

impl LogoConfig {
    pub fn new(image_bytes: Vec<u8>) -> Self {
        Self { image_bytes, ..Self::default() }
    }
}

/// One render request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderConfig {
    pub payload: String,
    pub pixel_size: PixelSize,
    /// Quiet zone, in modules.
    pub margin: u32,
    pub color_dark: Color,
    pub color_light: Color,
    pub gradient_enabled: bool,
    pub gradient_start: Color,
    pub gradient_end: Color,
    pub error_correction_level: EccLevel,
    pub module_style: ModuleStyle,
    pub logo: Option<LogoConfig>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            payload: PLACEHOLDER_PAYLOAD.to_string(),
            pixel_size: PixelSize::default(),
            margin: 2,
            color_dark: Color::BLACK,
            color_light: Color::WHITE,
            gradient_enabled: false,
            gradient_start: Color::rgb(0x63, 0x66, 0xf1),
            gradient_end: Color::rgb(0x8b, 0x5c, 0xf6),
            error_correction_level: EccLevel::H,
            module_style: ModuleStyle::Square,
            logo: None,
        }
    }
}

/// The fields that alone determine module geometry.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GeometryKey {
    payload: String,
    pixel_size: PixelSize,
    margin: u32,
    level: EccLevel,
}

impl RenderConfig {
    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = payload.into();
        self
    }

    /// The text actually encoded; falls back to the placeholder when empty.
    pub fn effective_payload(&self) -> &str {
        if self.payload.is_empty() {
            PLACEHOLDER_PAYLOAD
        } else {
            &self.payload
        }
    }

    /// Whether the raw encoder raster must be redrawn by the style renderer.
    pub fn needs_styling(&self) -> bool {
        self.gradient_enabled || self.module_style != ModuleStyle::Square || self.logo.is_some()
    }

    pub fn geometry_key(&self) -> GeometryKey {
        GeometryKey {
            payload: self.effective_payload().to_string(),
            pixel_size: self.pixel_size,
            margin: self.margin,
            level: self.error_correction_level,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        // Accept data URLs as produced by browsers' FileReader.
        let encoded = match encoded.split_once(";base64,") {
            Some((_, data)) => data,
            None => encoded.as_str(),
        };
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}
