//! Bivariate color palettes.

use crate::{Result, StyleError};

/// The nine bivariate codes in export order.
pub const CODES: [u8; 9] = [11, 12, 13, 21, 22, 23, 31, 32, 33];

const LEVELS: [&str; 3] = ["Low", "Medium", "High"];

/// An RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a `#RRGGBB` hex color. The leading `#` is added when
    /// missing; case is ignored.
    pub fn from_hex(input: &str) -> Result<Self> {
        let trimmed = input.trim().to_uppercase();
        let with_hash = if trimmed.starts_with('#') {
            trimmed
        } else {
            format!("#{trimmed}")
        };

        if with_hash.len() != 7 {
            return Err(StyleError::Validation(format!(
                "Invalid hex code: {with_hash}. Each color must be in format #RRGGBB (e.g. #E9E9EB)"
            )));
        }
        if !with_hash[1..].bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(StyleError::Validation(format!(
                "Invalid hex code: {with_hash}. Use only hexadecimal characters (0-9, A-F)"
            )));
        }

        let parse = |range| u8::from_str_radix(&with_hash[range], 16).expect("validated hex");
        Ok(Self {
            r: parse(1..3),
            g: parse(3..5),
            b: parse(5..7),
        })
    }

    /// Render as `#RRGGBB`.
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// One palette row: a bivariate code, its display label and color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteEntry {
    pub code: u8,
    pub label: String,
    pub color: Rgb,
}

/// A nine-color bivariate palette.
///
/// The two built-in variants are static lookup data; a custom palette is
/// the same record shape constructed at runtime from user-supplied hex
/// codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Palette {
    PurpleBlue,
    OrangeGreen,
    Custom([Rgb; 9]),
}

const PURPLE_BLUE: [Rgb; 9] = [
    Rgb::new(0xE8, 0xE8, 0xE8),
    Rgb::new(0xAD, 0xE2, 0xE5),
    Rgb::new(0x5A, 0xC8, 0xC9),
    Rgb::new(0xDE, 0xB0, 0xD5),
    Rgb::new(0xA4, 0xAD, 0xD1),
    Rgb::new(0x53, 0x99, 0xB8),
    Rgb::new(0xBE, 0x64, 0xAC),
    Rgb::new(0x8C, 0x62, 0xAA),
    Rgb::new(0x3A, 0x48, 0x93),
];

const ORANGE_GREEN: [Rgb; 9] = [
    Rgb::new(0xD3, 0xD3, 0xD3),
    Rgb::new(0x7F, 0xBB, 0xD2),
    Rgb::new(0x14, 0x9E, 0xD0),
    Rgb::new(0xD9, 0xA3, 0x86),
    Rgb::new(0x81, 0x90, 0x84),
    Rgb::new(0x14, 0x78, 0x84),
    Rgb::new(0xDE, 0x69, 0x2A),
    Rgb::new(0x85, 0x5E, 0x28),
    Rgb::new(0x16, 0x4E, 0x28),
];

impl Palette {
    /// Build a custom palette from exactly nine comma-separated hex
    /// colors in code order `11,12,13,21,22,23,31,32,33`.
    pub fn parse_custom(input: &str) -> Result<Self> {
        let parts: Vec<&str> = input.split(',').collect();
        if parts.len() != 9 {
            return Err(StyleError::Validation(format!(
                "Expected 9 hex codes, but got {}. Provide exactly 9 colors separated by commas.",
                parts.len()
            )));
        }

        let mut colors = [Rgb::new(0, 0, 0); 9];
        for (slot, part) in colors.iter_mut().zip(&parts) {
            *slot = Rgb::from_hex(part)?;
        }
        Ok(Palette::Custom(colors))
    }

    fn colors(&self) -> &[Rgb; 9] {
        match self {
            Palette::PurpleBlue => &PURPLE_BLUE,
            Palette::OrangeGreen => &ORANGE_GREEN,
            Palette::Custom(colors) => colors,
        }
    }

    /// The nine (code, label, color) entries in export order.
    pub fn entries(&self) -> Vec<PaletteEntry> {
        CODES
            .iter()
            .zip(self.colors())
            .map(|(&code, &color)| {
                let a_level = LEVELS[(code / 10 - 1) as usize];
                let b_level = LEVELS[(code % 10 - 1) as usize];
                PaletteEntry {
                    code,
                    label: format!("{a_level} A, {b_level} B"),
                    color,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_palette_has_nine_ordered_entries() {
        let entries = Palette::PurpleBlue.entries();
        assert_eq!(entries.len(), 9);
        let codes: Vec<u8> = entries.iter().map(|e| e.code).collect();
        assert_eq!(codes, CODES);

        assert_eq!(entries[0].label, "Low A, Low B");
        assert_eq!(entries[0].color.to_hex(), "#E8E8E8");
        assert_eq!(entries[4].label, "Medium A, Medium B");
        assert_eq!(entries[8].label, "High A, High B");
        assert_eq!(entries[8].color.to_hex(), "#3A4893");
    }

    #[test]
    fn custom_palette_accepts_nine_colors() {
        let palette = Palette::parse_custom(
            "#E9E9EB, #A3C6DA, #55A5C7, #ECD088, #A6B37E, #579574, #F5B903, #AEA003, #5D8103",
        )
        .unwrap();
        let entries = palette.entries();
        assert_eq!(entries[0].color.to_hex(), "#E9E9EB");
        assert_eq!(entries[8].color.to_hex(), "#5D8103");
    }

    #[test]
    fn missing_hash_and_lowercase_are_normalized() {
        assert_eq!(Rgb::from_hex("a3c6da").unwrap().to_hex(), "#A3C6DA");
        assert_eq!(Rgb::from_hex(" #ff0000 ").unwrap().to_hex(), "#FF0000");
    }

    #[test]
    fn wrong_color_count_is_rejected() {
        let eight = "#E9E9EB, #A3C6DA, #55A5C7, #ECD088, #A6B37E, #579574, #F5B903, #AEA003";
        let err = Palette::parse_custom(eight).unwrap_err();
        assert!(err.to_string().contains("got 8"));

        let ten = format!("{eight}, #5D8103, #000000");
        let err = Palette::parse_custom(&ten).unwrap_err();
        assert!(err.to_string().contains("got 10"));
    }

    #[test]
    fn malformed_hex_is_rejected() {
        assert!(Rgb::from_hex("#12345").is_err());
        assert!(Rgb::from_hex("#1234567").is_err());
        assert!(Rgb::from_hex("#GGHHII").is_err());

        let bad = "#E9E9EB, #A3C6DA, #55A5C7, #ECD088, #A6B37E, #579574, #F5B903, #AEA003, #XYZXYZ";
        assert!(matches!(
            Palette::parse_custom(bad),
            Err(StyleError::Validation(_))
        ));
    }
}
