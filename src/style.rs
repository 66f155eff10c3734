//! Static, read-only style registry
//!
//! Every design choice in `PostSettings` is a key into one of these tables.
//! Nothing here is mutable; the renderer looks values up by key.

use serde::{Deserialize, Serialize};

/// An sRGB color with straight (non-premultiplied) alpha
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    /// Fill used behind the avatar initial when no image is set
    pub const AVATAR_PLACEHOLDER: Color = Color::rgb(0x4b, 0x55, 0x63);
    pub const VERIFIED_BLUE: Color = Color::rgb(0x1d, 0x9b, 0xf0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b, a: 255 }
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa` (the leading `#` is optional).
    pub fn parse_hex(s: &str) -> Option<Color> {
        let s = s.trim().trim_start_matches('#');
        let expanded;
        let s = if s.len() == 3 {
            expanded = s.chars().flat_map(|c| [c, c]).collect::<String>();
            expanded.as_str()
        } else {
            s
        };
        if s.len() != 6 && s.len() != 8 {
            return None;
        }
        let b = hex::decode(s).ok()?;
        Some(Color {
            r: b[0],
            g: b[1],
            b: b[2],
            a: b.get(3).copied().unwrap_or(255),
        })
    }

    /// Parse a user color, falling back to `fallback` for anything unparseable.
    pub fn parse_or(s: &str, fallback: Color) -> Color {
        Color::parse_hex(s).unwrap_or(fallback)
    }

    /// Multiply alpha by `opacity` (clamped to 0..=1)
    pub fn with_opacity(self, opacity: f32) -> Color {
        let o = opacity.clamp(0.0, 1.0);
        Color {
            a: (self.a as f32 * o).round() as u8,
            ..self
        }
    }

    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl Serialize for Color {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Typeface choices offered to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FontFamily {
    DmSans,
    Sora,
    Playfair,
    Instrument,
    Jetbrains,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    Regular,
    Medium,
    Semibold,
    Bold,
}

impl FontWeight {
    pub fn is_heavy(self) -> bool {
        matches!(self, FontWeight::Semibold | FontWeight::Bold)
    }
}

/// Concrete font description resolved from a `FontFamily`
#[derive(Debug, Clone, Copy)]
pub struct FontDescriptor {
    pub name: &'static str,
    /// Candidate TTF file names, most specific first
    pub regular_files: &'static [&'static str],
    pub bold_files: &'static [&'static str],
    /// Average advance width as a fraction of the font size
    pub advance_factor: f32,
}

impl FontFamily {
    pub const ALL: [FontFamily; 5] = [
        FontFamily::DmSans,
        FontFamily::Sora,
        FontFamily::Playfair,
        FontFamily::Instrument,
        FontFamily::Jetbrains,
    ];

    pub fn descriptor(self) -> FontDescriptor {
        match self {
            FontFamily::DmSans => FontDescriptor {
                name: "DM Sans",
                regular_files: &["DMSans-Regular.ttf", "DejaVuSans.ttf"],
                bold_files: &["DMSans-Bold.ttf", "DejaVuSans-Bold.ttf"],
                advance_factor: 0.55,
            },
            FontFamily::Sora => FontDescriptor {
                name: "Sora",
                regular_files: &["Sora-Regular.ttf", "DejaVuSans.ttf"],
                bold_files: &["Sora-Bold.ttf", "DejaVuSans-Bold.ttf"],
                advance_factor: 0.58,
            },
            FontFamily::Playfair => FontDescriptor {
                name: "Playfair",
                regular_files: &["PlayfairDisplay-Regular.ttf", "DejaVuSerif.ttf"],
                bold_files: &["PlayfairDisplay-Bold.ttf", "DejaVuSerif-Bold.ttf"],
                advance_factor: 0.52,
            },
            FontFamily::Instrument => FontDescriptor {
                name: "Instrument",
                regular_files: &["InstrumentSans-Regular.ttf", "DejaVuSansCondensed.ttf"],
                bold_files: &["InstrumentSans-Bold.ttf", "DejaVuSansCondensed-Bold.ttf"],
                advance_factor: 0.5,
            },
            FontFamily::Jetbrains => FontDescriptor {
                name: "JetBrains",
                regular_files: &["JetBrainsMono-Regular.ttf", "DejaVuSansMono.ttf"],
                bold_files: &["JetBrainsMono-Bold.ttf", "DejaVuSansMono-Bold.ttf"],
                advance_factor: 0.6,
            },
        }
    }

    pub fn is_monospace(self) -> bool {
        matches!(self, FontFamily::Jetbrains)
    }
}

/// Two-stop 135° gradient presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GradientPreset {
    Sunset,
    Ocean,
    Forest,
    Midnight,
    Coral,
    Slate,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Gradient {
    pub name: &'static str,
    pub from: Color,
    pub to: Color,
    /// CSS angle in degrees
    pub angle: f32,
}

impl GradientPreset {
    pub const ALL: [GradientPreset; 6] = [
        GradientPreset::Sunset,
        GradientPreset::Ocean,
        GradientPreset::Forest,
        GradientPreset::Midnight,
        GradientPreset::Coral,
        GradientPreset::Slate,
    ];

    pub fn gradient(self) -> Gradient {
        let (name, from, to) = match self {
            GradientPreset::Sunset => ("Sunset", Color::rgb(0xff, 0x6b, 0x6b), Color::rgb(0xfe, 0xca, 0x57)),
            GradientPreset::Ocean => ("Ocean", Color::rgb(0x66, 0x7e, 0xea), Color::rgb(0x76, 0x4b, 0xa2)),
            GradientPreset::Forest => ("Forest", Color::rgb(0x11, 0x99, 0x8e), Color::rgb(0x38, 0xef, 0x7d)),
            GradientPreset::Midnight => ("Midnight", Color::rgb(0x23, 0x25, 0x26), Color::rgb(0x41, 0x43, 0x45)),
            GradientPreset::Coral => ("Coral", Color::rgb(0xff, 0x9a, 0x9e), Color::rgb(0xfe, 0xcf, 0xef)),
            GradientPreset::Slate => ("Slate", Color::rgb(0x53, 0x69, 0x76), Color::rgb(0x29, 0x2e, 0x49)),
        };
        Gradient {
            name,
            from,
            to,
            angle: 135.0,
        }
    }
}

/// A named swatch offered by a picker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Swatch {
    pub name: &'static str,
    pub value: &'static str,
}

pub const SOLID_COLORS: &[Swatch] = &[
    Swatch { name: "Pure Black", value: "#000000" },
    Swatch { name: "Charcoal", value: "#1a1a2e" },
    Swatch { name: "Navy", value: "#16213e" },
    Swatch { name: "Deep Purple", value: "#2d1b4e" },
    Swatch { name: "Forest", value: "#1b3a2f" },
    Swatch { name: "Burgundy", value: "#4a1c2c" },
    Swatch { name: "Slate", value: "#2c3e50" },
    Swatch { name: "Soft White", value: "#f8f9fa" },
    Swatch { name: "Cream", value: "#fef9e7" },
    Swatch { name: "Light Blue", value: "#e8f4f8" },
];

pub const TEXT_COLORS: &[Swatch] = &[
    Swatch { name: "White", value: "#ffffff" },
    Swatch { name: "Light Gray", value: "#e0e0e0" },
    Swatch { name: "Warm White", value: "#f5f5dc" },
    Swatch { name: "Black", value: "#000000" },
    Swatch { name: "Dark Gray", value: "#333333" },
    Swatch { name: "Navy", value: "#1a1a2e" },
];

pub const HIGHLIGHT_COLORS: &[Swatch] = &[
    Swatch { name: "Yellow", value: "#FACC15" },
    Swatch { name: "Cyan", value: "#22D3EE" },
    Swatch { name: "Green", value: "#4ADE80" },
    Swatch { name: "Pink", value: "#F472B6" },
    Swatch { name: "Orange", value: "#FB923C" },
    Swatch { name: "Blue", value: "#60A5FA" },
];

/// Opacity applied to secondary text roles
pub mod opacity {
    pub const LIST_MARKER: f32 = 0.6;
    pub const THREAD_GLYPH: f32 = 0.4;
    pub const SUBTITLE: f32 = 0.8;
    pub const POINTER: f32 = 0.7;
    pub const HANDLE: f32 = 0.6;
    pub const PLACEHOLDER: f32 = 0.4;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_and_long_hex() {
        assert_eq!(Color::parse_hex("#fff"), Some(Color::WHITE));
        assert_eq!(Color::parse_hex("FACC15"), Some(Color::rgb(0xfa, 0xcc, 0x15)));
        assert_eq!(Color::parse_hex("#00000080").map(|c| c.a), Some(0x80));
        assert_eq!(Color::parse_hex("#12345"), None);
        assert_eq!(Color::parse_hex("#gggggg"), None);
    }

    #[test]
    fn invalid_color_falls_back() {
        assert_eq!(Color::parse_or("not a color", Color::BLACK), Color::BLACK);
    }

    #[test]
    fn every_palette_value_parses() {
        for s in SOLID_COLORS.iter().chain(TEXT_COLORS).chain(HIGHLIGHT_COLORS) {
            assert!(Color::parse_hex(s.value).is_some(), "{} does not parse", s.name);
        }
    }

    #[test]
    fn every_family_has_font_candidates() {
        for f in FontFamily::ALL {
            let d = f.descriptor();
            assert!(!d.regular_files.is_empty());
            assert!(!d.bold_files.is_empty());
            assert!(d.advance_factor > 0.0);
        }
    }
}
