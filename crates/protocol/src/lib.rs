//! Shared protocol crate for blob-arena.
//!
//! This crate contains:
//! - JSON message definitions for both wire directions
//! - Shared types (Color, Position)

mod error;
pub mod messages;

pub use error::ProtocolError;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// RGB color used for avatars and food pellets.
///
/// Carried on the wire as a CSS-style `rgb(r,g,b)` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({},{},{})", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = ProtocolError;

    /// Accepts `rgb(r,g,b)` and `#rrggbb` literals.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ProtocolError::InvalidColor(s.to_string());
        let s = s.trim();

        if let Some(hex) = s.strip_prefix('#') {
            if hex.len() != 6 {
                return Err(invalid());
            }
            let r = u8::from_str_radix(&hex[0..2], 16).map_err(|_| invalid())?;
            let g = u8::from_str_radix(&hex[2..4], 16).map_err(|_| invalid())?;
            let b = u8::from_str_radix(&hex[4..6], 16).map_err(|_| invalid())?;
            return Ok(Self::new(r, g, b));
        }

        let body = s
            .strip_prefix("rgb(")
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(|| invalid())?;
        let mut channels = body.split(',').map(|part| part.trim().parse::<u8>());
        match (channels.next(), channels.next(), channels.next(), channels.next()) {
            (Some(Ok(r)), Some(Ok(g)), Some(Ok(b)), None) => Ok(Self::new(r, g, b)),
            _ => Err(invalid()),
        }
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Represents a 2D position using glam's f64 vector.
pub type Position = glam::DVec2;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rgb_literal() {
        let color: Color = "rgb(12, 200,7)".parse().unwrap();
        assert_eq!(color, Color::new(12, 200, 7));
    }

    #[test]
    fn parses_hex_literal() {
        let color: Color = "#ff00a0".parse().unwrap();
        assert_eq!(color, Color::new(255, 0, 160));
    }

    #[test]
    fn rejects_garbage() {
        assert!("blue".parse::<Color>().is_err());
        assert!("rgb(300,0,0)".parse::<Color>().is_err());
        assert!("rgb(1,2)".parse::<Color>().is_err());
        assert!("#12345".parse::<Color>().is_err());
    }

    #[test]
    fn display_round_trips() {
        let color = Color::new(50, 120, 255);
        let parsed: Color = color.to_string().parse().unwrap();
        assert_eq!(parsed, color);
    }
}
