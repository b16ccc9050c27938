//! Color parsing and composition.
//!
//! A pure color parser with no environment dependency: hex forms plus the
//! small named palette the coloring UI exposes. Brush opacity is baked into
//! the color's alpha channel so strokes compose correctly with the eraser's
//! alpha-subtracting blend.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// An 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel (255 = opaque).
    pub a: u8,
}

/// Named colors available on the coloring palette.
const NAMED_COLORS: &[(&str, Rgba)] = &[
    ("black", Rgba::new(0, 0, 0, 255)),
    ("white", Rgba::new(255, 255, 255, 255)),
    ("red", Rgba::new(255, 0, 0, 255)),
    ("green", Rgba::new(0, 128, 0, 255)),
    ("blue", Rgba::new(0, 0, 255, 255)),
    ("yellow", Rgba::new(255, 255, 0, 255)),
    ("orange", Rgba::new(255, 165, 0, 255)),
    ("purple", Rgba::new(128, 0, 128, 255)),
    ("pink", Rgba::new(255, 192, 203, 255)),
    ("brown", Rgba::new(165, 42, 42, 255)),
    ("gray", Rgba::new(128, 128, 128, 255)),
    ("grey", Rgba::new(128, 128, 128, 255)),
    ("cyan", Rgba::new(0, 255, 255, 255)),
    ("magenta", Rgba::new(255, 0, 255, 255)),
    ("lime", Rgba::new(0, 255, 0, 255)),
    ("navy", Rgba::new(0, 0, 128, 255)),
    ("teal", Rgba::new(0, 128, 128, 255)),
    ("gold", Rgba::new(255, 215, 0, 255)),
    ("skyblue", Rgba::new(135, 206, 235, 255)),
    ("violet", Rgba::new(238, 130, 238, 255)),
];

impl Rgba {
    /// Opaque black.
    pub const BLACK: Self = Self::new(0, 0, 0, 255);
    /// Opaque white.
    pub const WHITE: Self = Self::new(255, 255, 255, 255);
    /// Fully transparent.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    /// Create a color from channel values.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a color string: a hex form (`#rgb`, `#rgba`, `#rrggbb`,
    /// `#rrggbbaa`) or a palette name such as `"skyblue"`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidColor`] if the string is neither a valid
    /// hex color nor a known palette name.
    pub fn parse(s: &str) -> CoreResult<Self> {
        let trimmed = s.trim();
        if trimmed.starts_with('#') {
            return Self::from_hex(trimmed);
        }
        let lower = trimmed.to_ascii_lowercase();
        NAMED_COLORS
            .iter()
            .find(|(name, _)| *name == lower)
            .map(|&(_, color)| color)
            .ok_or_else(|| CoreError::InvalidColor(s.to_string()))
    }

    /// Parse a CSS-style hex color.
    ///
    /// Accepts 3-digit (`#rgb`), 4-digit (`#rgba`), 6-digit (`#rrggbb`),
    /// and 8-digit (`#rrggbbaa`) forms.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidColor`] on malformed input.
    pub fn from_hex(s: &str) -> CoreResult<Self> {
        let invalid = || CoreError::InvalidColor(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;

        let nibble = |ch: char| -> CoreResult<u8> {
            ch.to_digit(16)
                .map(|n| {
                    // A hex digit is at most 15.
                    #[allow(clippy::cast_possible_truncation)]
                    {
                        n as u8
                    }
                })
                .ok_or_else(invalid)
        };

        match hex.len() {
            // Short form: each digit is doubled (#f0a -> #ff00aa).
            3 | 4 => {
                let mut channels = [255u8; 4];
                for (i, ch) in hex.chars().enumerate() {
                    channels[i] = nibble(ch)? * 17;
                }
                Ok(Self::new(channels[0], channels[1], channels[2], channels[3]))
            }
            6 | 8 => {
                let byte = |range: std::ops::Range<usize>| -> CoreResult<u8> {
                    u8::from_str_radix(&hex[range], 16).map_err(|_| invalid())
                };
                let a = if hex.len() == 8 { byte(6..8)? } else { 255 };
                Ok(Self::new(byte(0..2)?, byte(2..4)?, byte(4..6)?, a))
            }
            _ => Err(invalid()),
        }
    }

    /// Bake an opacity factor into the alpha channel.
    ///
    /// This is the only place stroke opacity is applied; the rasterizer never
    /// applies a second global-alpha pass on top.
    #[must_use]
    pub fn with_opacity(self, opacity: f32) -> Self {
        let factor = opacity.clamp(0.0, 1.0);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let a = (f32::from(self.a) * factor).round() as u8;
        Self { a, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_long_hex() {
        assert_eq!(Rgba::from_hex("#FF6B6B").unwrap(), Rgba::new(255, 107, 107, 255));
        assert_eq!(Rgba::from_hex("#00000080").unwrap(), Rgba::new(0, 0, 0, 128));
    }

    #[test]
    fn test_parse_short_hex() {
        assert_eq!(Rgba::from_hex("#fff").unwrap(), Rgba::WHITE);
        assert_eq!(Rgba::from_hex("#f00").unwrap(), Rgba::new(255, 0, 0, 255));
        assert_eq!(Rgba::from_hex("#f008").unwrap(), Rgba::new(255, 0, 0, 136));
    }

    #[test]
    fn test_parse_named() {
        assert_eq!(Rgba::parse("skyblue").unwrap(), Rgba::new(135, 206, 235, 255));
        assert_eq!(Rgba::parse("  Purple ").unwrap(), Rgba::new(128, 0, 128, 255));
        assert_eq!(Rgba::parse("grey").unwrap(), Rgba::parse("gray").unwrap());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Rgba::parse("#12345").is_err());
        assert!(Rgba::parse("#zzz").is_err());
        assert!(Rgba::parse("chartreuse-ish").is_err());
        assert!(Rgba::parse("").is_err());
    }

    #[test]
    fn test_with_opacity_bakes_alpha() {
        let c = Rgba::new(10, 20, 30, 255).with_opacity(0.5);
        assert_eq!(c, Rgba::new(10, 20, 30, 128));
        // Opacity composes with an existing alpha channel.
        let c = Rgba::new(10, 20, 30, 128).with_opacity(0.5);
        assert_eq!(c.a, 64);
        // Out-of-range factors clamp.
        assert_eq!(Rgba::BLACK.with_opacity(7.0).a, 255);
        assert_eq!(Rgba::BLACK.with_opacity(-1.0).a, 0);
    }
}
