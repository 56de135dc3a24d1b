use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{XlError, XlErrorKind, XlResult};

/// A fill color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// The packed form used by spreadsheet object models: `r + g * 256 + b * 65536`.
    pub fn packed(self) -> u32 {
        let Rgb(r, g, b) = self;
        u32::from(r) + u32::from(g) * 256 + u32::from(b) * 256 * 256
    }

    pub fn from_packed(number: u32) -> Self {
        let r = number % 256;
        let g = (number / 256) % 256;
        let b = (number / (256 * 256)) % 256;
        // Every component is reduced modulo 256
        Rgb(r as u8, g as u8, b as u8)
    }

    /// The `0xRRGGBB` form used by xlsx writers.
    pub fn hex(self) -> u32 {
        let Rgb(r, g, b) = self;
        (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
    }
}

impl From<NamedColor> for Rgb {
    fn from(color: NamedColor) -> Self {
        color.rgb()
    }
}

/// The colors used to mark migration outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedColor {
    Blue,
    Green,
    Wheat,
    Tomato,
    Sky,
    Purple,
    Navy,
}

impl NamedColor {
    pub fn rgb(self) -> Rgb {
        match self {
            NamedColor::Blue => Rgb(79, 129, 189),
            NamedColor::Green => Rgb(155, 87, 189),
            NamedColor::Wheat => Rgb(247, 150, 70),
            NamedColor::Tomato => Rgb(192, 80, 77),
            NamedColor::Sky => Rgb(75, 172, 198),
            NamedColor::Purple => Rgb(128, 100, 162),
            NamedColor::Navy => Rgb(31, 73, 125),
        }
    }
}

impl FromStr for NamedColor {
    type Err = XlError;

    fn from_str(name: &str) -> XlResult<Self> {
        match name {
            "blue" => Ok(Self::Blue),
            "green" => Ok(Self::Green),
            "wheat" => Ok(Self::Wheat),
            "tomato" => Ok(Self::Tomato),
            "sky" => Ok(Self::Sky),
            "purple" => Ok(Self::Purple),
            "navy" => Ok(Self::Navy),
            _ => Err(XlErrorKind::InvalidArguments(format!("unknown color: \"{name}\"")).into()),
        }
    }
}

impl Display for NamedColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            NamedColor::Blue => "blue",
            NamedColor::Green => "green",
            NamedColor::Wheat => "wheat",
            NamedColor::Tomato => "tomato",
            NamedColor::Sky => "sky",
            NamedColor::Purple => "purple",
            NamedColor::Navy => "navy",
        })
    }
}
