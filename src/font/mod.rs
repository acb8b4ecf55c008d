//! # Font Management
//!
//! Fonts available to the layout engine and the PDF writer.
//!
//! The standard PDF fonts (Helvetica family, Courier) need no embedding and
//! are always registered. TrueType fonts found on the machine are parsed
//! with ttf-parser for measurement and embedded whole by the PDF writer.
//! [`Typography`] picks the faces used for headings, body text, page
//! decorations and CJK/Pinyin runs.

pub mod metrics;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

pub use metrics::StandardFontMetrics;

use crate::config::FontConfig;
use crate::error::PortfolioError;

#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct FontKey {
    pub family: String,
    pub weight: u32,
    pub italic: bool,
}

impl FontKey {
    pub fn new(family: &str, weight: u32, italic: bool) -> Self {
        Self {
            family: family.to_string(),
            weight,
            italic,
        }
    }

    pub fn helvetica() -> Self {
        Self::new("Helvetica", 400, false)
    }

    pub fn helvetica_bold() -> Self {
        Self::new("Helvetica", 700, false)
    }

    pub fn courier() -> Self {
        Self::new("Courier", 400, false)
    }

    /// The same family with bold and/or italic applied.
    pub fn styled(&self, bold: bool, italic: bool) -> Self {
        Self {
            family: self.family.clone(),
            weight: if bold { 700 } else { self.weight },
            italic: italic || self.italic,
        }
    }
}

#[derive(Debug, Clone)]
pub enum FontData {
    /// One of the standard PDF fonts. No embedding needed.
    Standard(StandardFont),
    /// A TrueType font embedded in full.
    Custom {
        data: Arc<Vec<u8>>,
        path: PathBuf,
        metrics: CustomFontMetrics,
    },
}

/// Parsed metrics from a TrueType font via ttf-parser.
#[derive(Debug, Clone)]
pub struct CustomFontMetrics {
    pub units_per_em: u16,
    pub advance_widths: HashMap<char, u16>,
    pub default_advance: u16,
    pub ascender: i16,
    pub descender: i16,
    /// Maps characters to their glyph IDs in the font.
    pub glyph_ids: HashMap<char, u16>,
}

impl CustomFontMetrics {
    /// Get the advance width of a character in points.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        let w = self
            .advance_widths
            .get(&ch)
            .copied()
            .unwrap_or(self.default_advance);
        (w as f64 / self.units_per_em as f64) * font_size
    }

    pub fn from_face(face: &ttf_parser::Face) -> Self {
        let units_per_em = face.units_per_em();
        let mut advance_widths = HashMap::new();
        let mut glyph_ids = HashMap::new();
        let mut default_advance = 0u16;

        // Basic Multilingual Plane covers Latin, Pinyin and CJK ideographs.
        for code in 32u32..=0xFFFF {
            let Some(ch) = char::from_u32(code) else { continue };
            if let Some(glyph_id) = face.glyph_index(ch) {
                let advance = face.glyph_hor_advance(glyph_id).unwrap_or(0);
                advance_widths.insert(ch, advance);
                glyph_ids.insert(ch, glyph_id.0);
                if ch == ' ' {
                    default_advance = advance;
                }
            }
        }

        if default_advance == 0 {
            default_advance = units_per_em / 2;
        }

        CustomFontMetrics {
            units_per_em,
            advance_widths,
            default_advance,
            ascender: face.ascender(),
            descender: face.descender(),
            glyph_ids,
        }
    }
}

/// The standard PDF fonts used by the portfolio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    Courier,
}

impl StandardFont {
    /// The PDF name for this font.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::HelveticaOblique => "Helvetica-Oblique",
            Self::HelveticaBoldOblique => "Helvetica-BoldOblique",
            Self::Courier => "Courier",
        }
    }
}

/// A font registry that maps font family + weight + style to font data.
pub struct FontRegistry {
    fonts: HashMap<FontKey, FontData>,
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FontRegistry {
    pub fn new() -> Self {
        let standard_mappings = [
            (("Helvetica", 400, false), StandardFont::Helvetica),
            (("Helvetica", 700, false), StandardFont::HelveticaBold),
            (("Helvetica", 400, true), StandardFont::HelveticaOblique),
            (("Helvetica", 700, true), StandardFont::HelveticaBoldOblique),
            (("Courier", 400, false), StandardFont::Courier),
        ];

        let fonts = standard_mappings
            .into_iter()
            .map(|((family, weight, italic), font)| {
                (FontKey::new(family, weight, italic), FontData::Standard(font))
            })
            .collect();

        Self { fonts }
    }

    /// Look up a font, returning the key it is registered under.
    ///
    /// Weights snap to 400/700. A missing bold or italic variant of a
    /// registered family falls back to that family's regular face, then to
    /// the matching Helvetica.
    pub fn resolve(&self, key: &FontKey) -> (&FontKey, &FontData) {
        let snapped = if key.weight >= 600 { 700 } else { 400 };
        let candidates = [
            FontKey::new(&key.family, snapped, key.italic),
            FontKey::new(&key.family, 400, false),
            FontKey::new("Helvetica", snapped, key.italic),
        ];
        for candidate in &candidates {
            if let Some(entry) = self.fonts.get_key_value(candidate) {
                return entry;
            }
        }
        self.fonts
            .get_key_value(&FontKey::helvetica())
            .expect("Helvetica must be registered")
    }

    /// Register a parsed TrueType font.
    pub fn register(&mut self, key: FontKey, data: FontData) {
        self.fonts.insert(key, data);
    }

    pub fn contains(&self, key: &FontKey) -> bool {
        self.fonts.contains_key(key)
    }

    /// Iterate over all registered fonts.
    pub fn iter(&self) -> impl Iterator<Item = (&FontKey, &FontData)> {
        self.fonts.iter()
    }
}

/// Shared font context used by layout and PDF serialization.
/// Provides text measurement with real glyph metrics.
#[derive(Default)]
pub struct FontContext {
    registry: FontRegistry,
}

impl FontContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a TrueType font file and register it as `family` (regular).
    ///
    /// Only single-face fonts with TrueType (`glyf`) outlines can be
    /// embedded; collections and CFF-flavoured OpenType are rejected.
    pub fn register_file(&mut self, family: &str, path: &Path) -> Result<FontKey, PortfolioError> {
        let data = std::fs::read(path).map_err(|e| PortfolioError::io(path, e))?;
        self.register_bytes(family, path, data)
    }

    pub fn register_bytes(
        &mut self,
        family: &str,
        path: &Path,
        data: Vec<u8>,
    ) -> Result<FontKey, PortfolioError> {
        if data.starts_with(b"ttcf") {
            return Err(PortfolioError::Font(format!(
                "'{}' is a font collection; only single .ttf fonts can be embedded",
                path.display()
            )));
        }
        let face = ttf_parser::Face::parse(&data, 0).map_err(|e| {
            PortfolioError::Font(format!("Failed to parse '{}': {}", path.display(), e))
        })?;
        if face.tables().glyf.is_none() {
            return Err(PortfolioError::Font(format!(
                "'{}' has no TrueType outlines",
                path.display()
            )));
        }
        let metrics = CustomFontMetrics::from_face(&face);
        debug!(
            family,
            path = %path.display(),
            glyphs = metrics.glyph_ids.len(),
            "registered font"
        );

        let key = FontKey::new(family, 400, false);
        self.registry.register(
            key.clone(),
            FontData::Custom {
                data: Arc::new(data),
                path: path.to_path_buf(),
                metrics,
            },
        );
        Ok(key)
    }

    /// Get the advance width of a single character in points.
    pub fn char_width(&self, ch: char, key: &FontKey, font_size: f64) -> f64 {
        match self.registry.resolve(key).1 {
            FontData::Standard(std_font) => std_font.metrics().char_width(ch, font_size),
            FontData::Custom { metrics, .. } => metrics.char_width(ch, font_size),
        }
    }

    /// Measure the width of a string in points.
    pub fn measure_string(&self, text: &str, key: &FontKey, font_size: f64) -> f64 {
        match self.registry.resolve(key).1 {
            FontData::Standard(std_font) => std_font.metrics().measure_string(text, font_size, 0.0),
            FontData::Custom { metrics, .. } => {
                text.chars().map(|ch| metrics.char_width(ch, font_size)).sum()
            }
        }
    }

    /// Resolve a requested key to the registered key and its data.
    pub fn resolve(&self, key: &FontKey) -> (&FontKey, &FontData) {
        self.registry.resolve(key)
    }

    /// Access the underlying font registry.
    pub fn registry(&self) -> &FontRegistry {
        &self.registry
    }
}

/// The faces used for each part of the portfolio.
#[derive(Debug, Clone, PartialEq)]
pub struct Typography {
    pub heading: FontKey,
    pub body: FontKey,
    /// Page header and footer.
    pub header: FontKey,
    /// CJK ideographs and toned Pinyin.
    pub cjk: FontKey,
}

impl Default for Typography {
    fn default() -> Self {
        Self {
            heading: FontKey::helvetica_bold(),
            body: FontKey::helvetica(),
            header: FontKey::helvetica(),
            cjk: FontKey::helvetica(),
        }
    }
}

impl Typography {
    /// Register the first usable font of each candidate list.
    ///
    /// Falls back to Helvetica-Bold for headings, Helvetica for body text
    /// and decorations, and the body face for CJK text.
    pub fn discover(config: &FontConfig, ctx: &mut FontContext) -> Self {
        let defaults = Typography::default();
        let heading = first_usable("heading", &config.heading, ctx).unwrap_or(defaults.heading);
        let body = first_usable("body", &config.body, ctx).unwrap_or(defaults.body);
        let header = first_usable("header", &config.header, ctx).unwrap_or(defaults.header);
        let cjk = first_usable("CJK", &config.cjk, ctx).unwrap_or_else(|| {
            info!("no CJK font found; Chinese text uses the body font");
            body.clone()
        });

        Self {
            heading,
            body,
            header,
            cjk,
        }
    }
}

fn first_usable(role: &str, candidates: &[PathBuf], ctx: &mut FontContext) -> Option<FontKey> {
    for path in candidates {
        if !path.exists() {
            continue;
        }
        let family = family_name(path);
        match ctx.register_file(&family, path) {
            Ok(key) => {
                info!(role, font = %path.display(), "using font");
                return Some(key);
            }
            Err(e) => warn!(role, "skipping font: {}", e),
        }
    }
    None
}

/// A PDF-safe family name derived from the file name.
fn family_name(path: &Path) -> String {
    let stem: String = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if stem.is_empty() {
        "CustomFont".to_string()
    } else {
        stem
    }
}
