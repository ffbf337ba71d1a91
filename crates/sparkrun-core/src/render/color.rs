use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// RGBA color with components in `0.0..=1.0`.
///
/// Serializes as a `#rrggbbaa` hex string so colors read naturally in TOML.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::rgb(1.0, 1.0, 1.0);
    pub const TRANSPARENT: Rgba = Rgba::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// Build from 8-bit channels.
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    /// Parse `#rgb`, `#rrggbb`, or `#rrggbbaa` (leading `#` optional).
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        let digits = s.trim().trim_start_matches('#');
        let bad = || CoreError::InvalidColor(s.to_string());
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(bad());
        }
        let byte = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| bad());
        match digits.len() {
            3 => {
                let nib = |i: usize| {
                    u8::from_str_radix(&digits[i..i + 1], 16)
                        .map(|v| v * 17)
                        .map_err(|_| bad())
                };
                Ok(Self::from_rgb8(nib(0)?, nib(1)?, nib(2)?))
            },
            6 => Ok(Self::from_rgb8(byte(0)?, byte(2)?, byte(4)?)),
            8 => Ok(Self::from_rgb8(byte(0)?, byte(2)?, byte(4)?)
                .with_alpha(byte(6)? as f32 / 255.0)),
            _ => Err(bad()),
        }
    }

    /// Build from hue (degrees, wrapped), saturation and lightness in `0..=1`.
    pub fn from_hsl(hue: f32, saturation: f32, lightness: f32) -> Self {
        let h = hue.rem_euclid(360.0) / 60.0;
        let s = saturation.clamp(0.0, 1.0);
        let l = lightness.clamp(0.0, 1.0);
        let chroma = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let x = chroma * (1.0 - (h % 2.0 - 1.0).abs());
        let (r, g, b) = match h as u32 {
            0 => (chroma, x, 0.0),
            1 => (x, chroma, 0.0),
            2 => (0.0, chroma, x),
            3 => (0.0, x, chroma),
            4 => (x, 0.0, chroma),
            _ => (chroma, 0.0, x),
        };
        let m = l - chroma / 2.0;
        Self::rgb(r + m, g + m, b + m)
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }

    fn to_u8(c: f32) -> u8 {
        (c.clamp(0.0, 1.0) * 255.0).round() as u8
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::WHITE
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{:02x}{:02x}{:02x}{:02x}",
            Self::to_u8(self.r),
            Self::to_u8(self.g),
            Self::to_u8(self.b),
            Self::to_u8(self.a)
        )
    }
}

impl TryFrom<String> for Rgba {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s)
    }
}

impl From<Rgba> for String {
    fn from(c: Rgba) -> Self {
        c.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Rgba, b: Rgba) -> bool {
        (a.r - b.r).abs() < 0.01
            && (a.g - b.g).abs() < 0.01
            && (a.b - b.b).abs() < 0.01
            && (a.a - b.a).abs() < 0.01
    }

    #[test]
    fn parses_hex_forms() {
        assert!(close(Rgba::from_hex("#fff").unwrap(), Rgba::WHITE));
        assert!(close(
            Rgba::from_hex("#ff0000").unwrap(),
            Rgba::rgb(1.0, 0.0, 0.0)
        ));
        assert!(close(
            Rgba::from_hex("00ff0080").unwrap(),
            Rgba::new(0.0, 1.0, 0.0, 0.5)
        ));
    }

    #[test]
    fn rejects_garbage() {
        assert!(Rgba::from_hex("#12345").is_err());
        assert!(Rgba::from_hex("#gggggg").is_err());
        assert!(Rgba::from_hex("").is_err());
    }

    #[test]
    fn hsl_primaries() {
        assert!(close(Rgba::from_hsl(0.0, 1.0, 0.5), Rgba::rgb(1.0, 0.0, 0.0)));
        assert!(close(Rgba::from_hsl(120.0, 1.0, 0.5), Rgba::rgb(0.0, 1.0, 0.0)));
        assert!(close(Rgba::from_hsl(240.0, 1.0, 0.5), Rgba::rgb(0.0, 0.0, 1.0)));
        assert!(close(Rgba::from_hsl(360.0, 1.0, 0.5), Rgba::rgb(1.0, 0.0, 0.0)));
    }

    #[test]
    fn display_is_parseable() {
        let c = Rgba::new(0.2, 0.4, 0.6, 1.0);
        let back = Rgba::from_hex(&c.to_string()).unwrap();
        assert!(close(c, back));
    }

    #[test]
    fn deserializes_from_json_string() {
        let c: Rgba = serde_json::from_str("\"#4caf50\"").unwrap();
        assert!(close(c, Rgba::from_rgb8(0x4c, 0xaf, 0x50)));
        assert!(serde_json::from_str::<Rgba>("\"teal\"").is_err());
    }
}
