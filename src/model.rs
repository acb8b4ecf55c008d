//! # Page Model
//!
//! Page geometry, colours and document metadata shared by the layout engine
//! and the PDF serializer. All lengths are PDF points (1/72 inch).

use serde::{Deserialize, Serialize};

/// Standard page sizes in points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    A4,
    A3,
    A5,
    Letter,
    Custom {
        width: f64,
        height: f64,
    },
}

impl PageSize {
    /// Returns (width, height) in points, portrait orientation.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::A3 => (841.89, 1190.55),
            PageSize::A5 => (419.53, 595.28),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }

    fn label(&self) -> String {
        match self {
            PageSize::A4 => "A4".to_string(),
            PageSize::A3 => "A3".to_string(),
            PageSize::A5 => "A5".to_string(),
            PageSize::Letter => "Letter".to_string(),
            PageSize::Custom { width, height } => {
                format!("{:.0}x{:.0}mm", width / MM, height / MM)
            }
        }
    }
}

/// Points per millimetre.
pub const MM: f64 = 72.0 / 25.4;

/// Edge values (top, right, bottom, left) used for page margins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Edges {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Edges {
    pub fn uniform(v: f64) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

/// Page size, orientation and margins for every page of the portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageSetup {
    pub size: PageSize,
    pub landscape: bool,
    pub margin: Edges,
}

impl Default for PageSetup {
    fn default() -> Self {
        Self {
            size: PageSize::A4,
            landscape: false,
            margin: Edges {
                top: 80.0,
                right: 50.0,
                bottom: 60.0,
                left: 50.0,
            },
        }
    }
}

impl PageSetup {
    /// (width, height) in points with orientation applied.
    pub fn dimensions(&self) -> (f64, f64) {
        let (w, h) = self.size.dimensions();
        if self.landscape {
            (w.max(h), w.min(h))
        } else {
            (w, h)
        }
    }

    /// Width of the content frame inside the margins.
    pub fn content_width(&self) -> f64 {
        self.dimensions().0 - self.margin.horizontal()
    }

    /// Height of the content frame inside the margins.
    pub fn content_height(&self) -> f64 {
        self.dimensions().1 - self.margin.vertical()
    }

    /// Short name used in output file names, e.g. `A4_Portrait`.
    pub fn name(&self) -> String {
        match self.size {
            PageSize::Custom { .. } => self.size.label(),
            _ => format!(
                "{}_{}",
                self.size.label(),
                if self.landscape { "Landscape" } else { "Portrait" }
            ),
        }
    }

    /// Parse a command-line page size: `a4`, `a4-landscape`, `letter`,
    /// `a3`, `a5`, or a custom `170x240mm`. Margins stay at their defaults.
    pub fn parse(text: &str) -> Result<Self, String> {
        let lower = text.trim().to_ascii_lowercase();
        let (base, landscape) = match lower.strip_suffix("-landscape") {
            Some(base) => (base, true),
            None => (lower.strip_suffix("-portrait").unwrap_or(&lower), false),
        };

        let size = match base {
            "a4" => PageSize::A4,
            "a3" => PageSize::A3,
            "a5" => PageSize::A5,
            "letter" => PageSize::Letter,
            custom => {
                let dims = custom
                    .strip_suffix("mm")
                    .ok_or_else(|| format!("Unknown page size '{}'", text))?;
                let (w, h) = dims
                    .split_once('x')
                    .ok_or_else(|| format!("Custom page size '{}' must look like 170x240mm", text))?;
                let width: f64 = w
                    .parse()
                    .map_err(|_| format!("Invalid page width in '{}'", text))?;
                let height: f64 = h
                    .parse()
                    .map_err(|_| format!("Invalid page height in '{}'", text))?;
                if width <= 0.0 || height <= 0.0 {
                    return Err(format!("Page dimensions must be positive: '{}'", text));
                }
                PageSize::Custom {
                    width: width * MM,
                    height: height * MM,
                }
            }
        };

        Ok(Self {
            size,
            landscape,
            ..Self::default()
        })
    }
}

/// An RGB colour with components in 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Parse a hex colour string: "#RGB" or "#RRGGBB".
    pub fn hex(hex: &str) -> Self {
        let hex = hex.trim_start_matches('#');
        let parse = |s: &str| u8::from_str_radix(s, 16).unwrap_or(0) as f64 / 255.0;

        match hex.len() {
            3 => {
                let r = parse(&hex[0..1].repeat(2));
                let g = parse(&hex[1..2].repeat(2));
                let b = parse(&hex[2..3].repeat(2));
                Self::rgb(r, g, b)
            }
            6 => {
                let r = parse(&hex[0..2]);
                let g = parse(&hex[2..4]);
                let b = parse(&hex[4..6]);
                Self::rgb(r, g, b)
            }
            _ => Self::BLACK,
        }
    }
}

/// Document metadata embedded in the PDF Info dictionary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_setup_content_area() {
        let setup = PageSetup::default();
        assert!((setup.content_width() - 495.28).abs() < 1e-9);
        assert!((setup.content_height() - 701.89).abs() < 1e-9);
        assert_eq!(setup.name(), "A4_Portrait");
    }

    #[test]
    fn landscape_swaps_dimensions() {
        let setup = PageSetup::parse("a4-landscape").unwrap();
        let (w, h) = setup.dimensions();
        assert!(w > h);
        assert_eq!(setup.name(), "A4_Landscape");
    }

    #[test]
    fn custom_millimetre_size() {
        let setup = PageSetup::parse("170x240mm").unwrap();
        let (w, h) = setup.dimensions();
        assert!((w - 170.0 * MM).abs() < 1e-9);
        assert!((h - 240.0 * MM).abs() < 1e-9);
        assert_eq!(setup.name(), "170x240mm");
    }

    #[test]
    fn rejects_unknown_size() {
        assert!(PageSetup::parse("b5").is_err());
        assert!(PageSetup::parse("0x240mm").is_err());
        assert!(PageSetup::parse("170by240mm").is_err());
    }

    #[test]
    fn hex_colors() {
        let c = Color::hex("#333333");
        assert!((c.r - 0.2).abs() < 1e-9);
        assert_eq!(Color::hex("#fff"), Color::WHITE);
        assert_eq!(Color::hex("nonsense"), Color::BLACK);
    }
}
