//! Text formatting vocabulary for PPTX paragraphs and runs.

use phf::phf_map;
use serde::{Deserialize, Serialize};

/// Horizontal paragraph alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    /// Value of the `algn` attribute on `a:pPr`.
    pub fn to_algn(self) -> &'static str {
        match self {
            Self::Left => "l",
            Self::Center => "ctr",
            Self::Right => "r",
            Self::Justify => "just",
        }
    }

    pub fn from_algn(value: &str) -> Option<Self> {
        match value {
            "l" => Some(Self::Left),
            "ctr" => Some(Self::Center),
            "r" => Some(Self::Right),
            "just" => Some(Self::Justify),
            _ => None,
        }
    }
}

/// Theme slot names accepted in payloads, mapped to `a:schemeClr` values.
static THEME_COLORS: phf::Map<&'static str, &'static str> = phf_map! {
    "ACCENT_1" => "accent1",
    "ACCENT_2" => "accent2",
    "ACCENT_3" => "accent3",
    "ACCENT_4" => "accent4",
    "ACCENT_5" => "accent5",
    "ACCENT_6" => "accent6",
    "BACKGROUND_1" => "bg1",
    "BACKGROUND_2" => "bg2",
    "DARK_1" => "dk1",
    "DARK_2" => "dk2",
    "LIGHT_1" => "lt1",
    "LIGHT_2" => "lt2",
    "TEXT_1" => "tx1",
    "TEXT_2" => "tx2",
    "HYPERLINK" => "hlink",
    "FOLLOWED_HYPERLINK" => "folHlink",
};

/// `a:schemeClr` value for a theme slot name such as `ACCENT_1`.
pub fn scheme_color_for(theme_name: &str) -> Option<&'static str> {
    THEME_COLORS.get(theme_name).copied()
}

/// Theme slot name for an `a:schemeClr` value, the inverse of [`scheme_color_for`].
pub fn theme_name_for(scheme_value: &str) -> Option<&'static str> {
    THEME_COLORS
        .entries()
        .find(|(_, v)| **v == scheme_value)
        .map(|(k, _)| *k)
}

/// An sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    /// Parse `RRGGBB` with an optional leading `#`.
    pub fn from_hex(value: &str) -> Option<Self> {
        let hex = value.trim_start_matches('#');
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }

    /// Uppercase hex form used by `a:srgbClr/@val`.
    pub fn to_hex(self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}
