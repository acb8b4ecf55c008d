//! # PDF Serializer
//!
//! Takes laid-out pages and writes a PDF 1.7 file from scratch.
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- catalog, page tree, fonts, images, pages, streams
//! ...
//! xref                <- byte offset of every object
//! trailer             <- root and info references
//! %%EOF
//! ```
//!
//! Standard fonts are plain Type1 references with WinAnsiEncoding. TrueType
//! fonts are embedded whole as CIDFontType2 with Identity-H encoding, five
//! objects per font: FontFile2, FontDescriptor, CIDFont, ToUnicode CMap and
//! the Type0 root. Glyph IDs are written as CIDs (`/CIDToGIDMap /Identity`).
//!
//! Every distinct image is written once as an XObject and referenced from
//! each page that draws it.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Write as FmtWrite;
use std::io::Write as IoWrite;
use std::sync::Arc;

use miniz_oxide::deflate::compress_to_vec_zlib;
use tracing::debug;

use crate::error::PortfolioError;
use crate::font::{CustomFontMetrics, FontContext, FontData, FontKey};
use crate::image_loader::{ImagePixelData, JpegColorSpace, LoadedImage};
use crate::layout::{DrawCommand, LayoutElement, LayoutPage, TextLine};
use crate::model::Metadata;

const PRODUCER: &str = concat!("autfolio ", env!("CARGO_PKG_VERSION"));

pub struct PdfWriter;

/// Tracks allocated PDF objects during writing.
struct PdfBuilder {
    objects: Vec<Vec<u8>>,
    /// Resolved font key -> Type0 or Type1 object id, in /F index order.
    font_objects: Vec<(FontKey, usize)>,
    /// Character to glyph id for each embedded TrueType font.
    custom_glyphs: HashMap<FontKey, HashMap<char, u16>>,
    /// XObject id of each distinct image, indexed as /Im0, /Im1, ...
    image_objects: Vec<usize>,
    /// Image identity (Arc pointer) -> index into `image_objects`.
    image_index: HashMap<usize, usize>,
}

impl PdfBuilder {
    fn new() -> Self {
        // 0 = placeholder (objects are 1-indexed), 1 = Catalog, 2 = Pages.
        Self {
            objects: vec![Vec::new(), Vec::new(), Vec::new()],
            font_objects: Vec::new(),
            custom_glyphs: HashMap::new(),
            image_objects: Vec::new(),
            image_index: HashMap::new(),
        }
    }

    fn push(&mut self, data: Vec<u8>) -> usize {
        self.objects.push(data);
        self.objects.len() - 1
    }

    /// Add a stream object with the given extra dictionary entries.
    fn push_stream(&mut self, dict_entries: &str, payload: &[u8]) -> usize {
        let mut data = Vec::with_capacity(payload.len() + 64);
        let _ = write!(data, "<< /Length {}{} >>\nstream\n", payload.len(), dict_entries);
        data.extend_from_slice(payload);
        data.extend_from_slice(b"\nendstream");
        self.push(data)
    }

    fn font_index(&self, key: &FontKey) -> usize {
        self.font_objects
            .iter()
            .position(|(k, _)| k == key)
            .unwrap_or(0)
    }
}

fn image_id(image: &Arc<LoadedImage>) -> usize {
    Arc::as_ptr(image) as usize
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write laid-out pages to a PDF byte vector.
    pub fn write(
        &self,
        pages: &[LayoutPage],
        metadata: &Metadata,
        font_context: &FontContext,
    ) -> Result<Vec<u8>, PortfolioError> {
        let mut builder = PdfBuilder::new();

        self.register_fonts(&mut builder, pages, font_context)?;
        self.register_images(&mut builder, pages);

        let font_resources = Self::build_font_resource_dict(&builder.font_objects);
        let mut page_obj_ids = Vec::with_capacity(pages.len());

        for page in pages {
            let content = self.build_content_stream(page, &builder, font_context);
            let compressed = compress_to_vec_zlib(content.as_bytes(), 6);
            let content_obj_id = builder.push_stream(" /Filter /FlateDecode", &compressed);

            let xobjects = Self::build_xobject_resource_dict(page, &builder);
            let resources = if xobjects.is_empty() {
                format!("/Font << {} >>", font_resources)
            } else {
                format!("/Font << {} >> /XObject << {} >>", font_resources, xobjects)
            };
            let page_dict = format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Contents {} 0 R /Resources << {} >> >>",
                page.width, page.height, content_obj_id, resources
            );
            page_obj_ids.push(builder.push(page_dict.into_bytes()));
        }

        builder.objects[1] = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();
        let kids = page_obj_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        builder.objects[2] = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids,
            page_obj_ids.len()
        )
        .into_bytes();

        let mut info = String::from("<< ");
        if let Some(title) = &metadata.title {
            let _ = write!(info, "/Title {} ", Self::pdf_text_string(title));
        }
        if let Some(author) = &metadata.author {
            let _ = write!(info, "/Author {} ", Self::pdf_text_string(author));
        }
        let _ = write!(info, "/Producer ({}) /Creator (autfolio) >>", PRODUCER);
        let info_obj_id = builder.push(info.into_bytes());

        debug!(
            pages = pages.len(),
            fonts = builder.font_objects.len(),
            images = builder.image_objects.len(),
            objects = builder.objects.len() - 1,
            "serialized PDF"
        );
        Ok(Self::serialize(&builder, info_obj_id))
    }

    /// PDF operators for one page. Coordinates are flipped to PDF's
    /// bottom-left origin here.
    fn build_content_stream(
        &self,
        page: &LayoutPage,
        builder: &PdfBuilder,
        font_context: &FontContext,
    ) -> String {
        let mut stream = String::new();
        for element in &page.elements {
            self.write_element(&mut stream, element, page.height, builder, font_context);
        }
        stream
    }

    fn write_element(
        &self,
        stream: &mut String,
        element: &LayoutElement,
        page_height: f64,
        builder: &PdfBuilder,
        font_context: &FontContext,
    ) {
        let y = page_height - element.y - element.height;
        match &element.draw {
            DrawCommand::Rect { color } => {
                let _ = write!(
                    stream,
                    "q\n{:.3} {:.3} {:.3} rg\n{:.2} {:.2} {:.2} {:.2} re\nf\nQ\n",
                    color.r, color.g, color.b, element.x, y, element.width, element.height
                );
            }
            DrawCommand::Text { line, color } => {
                if line.glyphs.is_empty() {
                    return;
                }
                let _ = write!(stream, "BT\n{:.3} {:.3} {:.3} rg\n", color.r, color.g, color.b);
                self.write_text_line(stream, line, page_height, builder, font_context);
                stream.push_str("ET\n");
            }
            DrawCommand::Image { image } => {
                let Some(&idx) = builder.image_index.get(&image_id(image)) else {
                    return;
                };
                let _ = write!(
                    stream,
                    "q\n{:.4} 0 0 {:.4} {:.2} {:.2} cm\n/Im{} Do\nQ\n",
                    element.width, element.height, element.x, y, idx
                );
            }
        }
    }

    /// One `Tf`/`Tm`/`Tj` group per run of glyphs sharing a font and size.
    fn write_text_line(
        &self,
        stream: &mut String,
        line: &TextLine,
        page_height: f64,
        builder: &PdfBuilder,
        font_context: &FontContext,
    ) {
        let pdf_y = page_height - line.y;
        let mut start = 0;
        while start < line.glyphs.len() {
            let first = &line.glyphs[start];
            let key = font_context.resolve(&first.font).0;
            let end = line.glyphs[start..]
                .iter()
                .position(|g| g.font_size != first.font_size || font_context.resolve(&g.font).0 != key)
                .map_or(line.glyphs.len(), |n| start + n);

            let _ = write!(
                stream,
                "/F{} {:.1} Tf\n1 0 0 1 {:.2} {:.2} Tm\n",
                builder.font_index(key),
                first.font_size,
                line.x + first.x_offset,
                pdf_y
            );

            let text: String = line.glyphs[start..end].iter().map(|g| g.ch).collect();
            match builder.custom_glyphs.get(key) {
                Some(glyphs) => {
                    let mut hex = String::with_capacity(text.len() * 4);
                    for ch in text.chars() {
                        let gid = glyphs.get(&ch).copied().unwrap_or(0);
                        let _ = write!(hex, "{:04X}", gid);
                    }
                    let _ = writeln!(stream, "<{}> Tj", hex);
                }
                None => {
                    let _ = writeln!(stream, "({}) Tj", Self::encode_winansi(&text));
                }
            }
            start = end;
        }
    }

    fn register_fonts(
        &self,
        builder: &mut PdfBuilder,
        pages: &[LayoutPage],
        font_context: &FontContext,
    ) -> Result<(), PortfolioError> {
        // Resolved key -> characters drawn with it.
        let mut font_chars: BTreeMap<FontKey, BTreeSet<char>> = BTreeMap::new();
        for page in pages {
            for element in &page.elements {
                if let DrawCommand::Text { line, .. } = &element.draw {
                    for glyph in &line.glyphs {
                        let key = font_context.resolve(&glyph.font).0.clone();
                        font_chars.entry(key).or_default().insert(glyph.ch);
                    }
                }
            }
        }
        if font_chars.is_empty() {
            font_chars.insert(FontKey::helvetica(), BTreeSet::new());
        }

        for (key, chars) in &font_chars {
            let obj_id = match font_context.resolve(key).1 {
                FontData::Standard(std_font) => builder.push(
                    format!(
                        "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                        std_font.pdf_name()
                    )
                    .into_bytes(),
                ),
                FontData::Custom { data, metrics, .. } => {
                    Self::write_custom_font_objects(builder, key, data, metrics, chars)?
                }
            };
            builder.font_objects.push((key.clone(), obj_id));
        }
        Ok(())
    }

    /// Write the five CIDFont objects for an embedded TrueType font.
    /// Returns the id of the Type0 root dictionary.
    fn write_custom_font_objects(
        builder: &mut PdfBuilder,
        key: &FontKey,
        ttf_data: &[u8],
        metrics: &CustomFontMetrics,
        used_chars: &BTreeSet<char>,
    ) -> Result<usize, PortfolioError> {
        let face = ttf_parser::Face::parse(ttf_data, 0).map_err(|e| {
            PortfolioError::Font(format!("Failed to parse TTF data for '{}': {}", key.family, e))
        })?;

        let char_to_gid: HashMap<char, u16> = used_chars
            .iter()
            .filter_map(|ch| metrics.glyph_ids.get(ch).map(|&gid| (*ch, gid)))
            .collect();
        let pdf_font_name = Self::sanitize_font_name(&key.family, key.weight, key.italic);
        let scale = 1000.0 / metrics.units_per_em as f64;

        // 1. FontFile2
        let compressed_ttf = compress_to_vec_zlib(ttf_data, 6);
        let fontfile2_id = builder.push_stream(
            &format!(" /Length1 {} /Filter /FlateDecode", ttf_data.len()),
            &compressed_ttf,
        );

        // 2. FontDescriptor
        let bbox = face.global_bounding_box();
        let cap_height = face.capital_height().unwrap_or(metrics.ascender) as f64 * scale;
        let descriptor = format!(
            "<< /Type /FontDescriptor /FontName /{} /Flags 4 \
             /FontBBox [{} {} {} {}] /ItalicAngle {} \
             /Ascent {} /Descent {} /CapHeight {} /StemV {} \
             /FontFile2 {} 0 R >>",
            pdf_font_name,
            (bbox.x_min as f64 * scale) as i32,
            (bbox.y_min as f64 * scale) as i32,
            (bbox.x_max as f64 * scale) as i32,
            (bbox.y_max as f64 * scale) as i32,
            if key.italic { -12 } else { 0 },
            (metrics.ascender as f64 * scale) as i32,
            (metrics.descender as f64 * scale) as i32,
            cap_height as i32,
            if key.weight >= 700 { 120 } else { 80 },
            fontfile2_id,
        );
        let descriptor_id = builder.push(descriptor.into_bytes());

        // 3. CIDFont
        let default_width = face
            .glyph_hor_advance(ttf_parser::GlyphId(0))
            .map(|adv| (adv as f64 * scale) as u32)
            .unwrap_or(1000);
        let cidfont = format!(
            "<< /Type /Font /Subtype /CIDFontType2 /BaseFont /{} \
             /CIDSystemInfo << /Registry (Adobe) /Ordering (Identity) /Supplement 0 >> \
             /FontDescriptor {} 0 R /DW {} /W {} /CIDToGIDMap /Identity >>",
            pdf_font_name,
            descriptor_id,
            default_width,
            Self::build_w_array(&char_to_gid, metrics),
        );
        let cidfont_id = builder.push(cidfont.into_bytes());

        // 4. ToUnicode
        let cmap = Self::build_tounicode_cmap(&char_to_gid, &pdf_font_name);
        let compressed_cmap = compress_to_vec_zlib(cmap.as_bytes(), 6);
        let tounicode_id = builder.push_stream(" /Filter /FlateDecode", &compressed_cmap);

        // 5. Type0
        let type0 = format!(
            "<< /Type /Font /Subtype /Type0 /BaseFont /{} /Encoding /Identity-H \
             /DescendantFonts [{} 0 R] /ToUnicode {} 0 R >>",
            pdf_font_name, cidfont_id, tounicode_id,
        );
        let type0_id = builder.push(type0.into_bytes());

        debug!(font = %pdf_font_name, glyphs = char_to_gid.len(), "embedded TrueType font");
        builder.custom_glyphs.insert(key.clone(), char_to_gid);
        Ok(type0_id)
    }

    /// `/W` entries `gid [width]` in glyph order, widths in 1/1000 em.
    fn build_w_array(char_to_gid: &HashMap<char, u16>, metrics: &CustomFontMetrics) -> String {
        let scale = 1000.0 / metrics.units_per_em as f64;
        let widths: BTreeMap<u16, u32> = char_to_gid
            .iter()
            .map(|(ch, &gid)| {
                let advance = metrics
                    .advance_widths
                    .get(ch)
                    .copied()
                    .unwrap_or(metrics.default_advance);
                (gid, (advance as f64 * scale) as u32)
            })
            .collect();

        let mut result = String::from("[");
        for (gid, width) in &widths {
            let _ = write!(result, " {} [{}]", gid, width);
        }
        result.push_str(" ]");
        result
    }

    /// A ToUnicode CMap so text can be copied out of the PDF.
    fn build_tounicode_cmap(char_to_gid: &HashMap<char, u16>, font_name: &str) -> String {
        let gid_to_unicode: BTreeMap<u16, u32> = char_to_gid
            .iter()
            .map(|(&ch, &gid)| (gid, ch as u32))
            .collect();
        let entries: Vec<(u16, u32)> = gid_to_unicode.into_iter().collect();

        let mut cmap = String::new();
        cmap.push_str("/CIDInit /ProcSet findresource begin\n12 dict begin\nbegincmap\n");
        cmap.push_str("/CIDSystemInfo\n<< /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n");
        let _ = writeln!(cmap, "/CMapName /{}-UTF16 def", font_name);
        cmap.push_str("/CMapType 2 def\n1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n");

        // At most 100 entries per bfchar block.
        for chunk in entries.chunks(100) {
            let _ = writeln!(cmap, "{} beginbfchar", chunk.len());
            for &(gid, unicode) in chunk {
                let _ = writeln!(cmap, "<{:04X}> <{:04X}>", gid, unicode);
            }
            cmap.push_str("endbfchar\n");
        }

        cmap.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
        cmap
    }

    /// Write each distinct image once.
    fn register_images(&self, builder: &mut PdfBuilder, pages: &[LayoutPage]) {
        for page in pages {
            for element in &page.elements {
                if let DrawCommand::Image { image } = &element.draw {
                    let id = image_id(image);
                    if builder.image_index.contains_key(&id) {
                        continue;
                    }
                    let xobj_id = Self::write_image_xobject(builder, image);
                    builder.image_index.insert(id, builder.image_objects.len());
                    builder.image_objects.push(xobj_id);
                }
            }
        }
    }

    /// Write an image as one XObject (plus an SMask for decoded images
    /// with alpha). Returns the main XObject id.
    fn write_image_xobject(builder: &mut PdfBuilder, image: &LoadedImage) -> usize {
        let dims = format!(
            " /Type /XObject /Subtype /Image /Width {} /Height {} /BitsPerComponent 8",
            image.width_px, image.height_px
        );
        match &image.pixel_data {
            ImagePixelData::Jpeg { data, color_space } => {
                let color_space = match color_space {
                    JpegColorSpace::DeviceRGB => "/DeviceRGB",
                    JpegColorSpace::DeviceGray => "/DeviceGray",
                };
                builder.push_stream(
                    &format!("{} /ColorSpace {} /Filter /DCTDecode", dims, color_space),
                    data,
                )
            }
            ImagePixelData::Decoded { rgb, alpha } => {
                let smask_ref = alpha
                    .as_ref()
                    .map(|alpha| {
                        let smask_id = builder.push_stream(
                            &format!("{} /ColorSpace /DeviceGray /Filter /FlateDecode", dims),
                            &compress_to_vec_zlib(alpha, 6),
                        );
                        format!(" /SMask {} 0 R", smask_id)
                    })
                    .unwrap_or_default();
                builder.push_stream(
                    &format!(
                        "{} /ColorSpace /DeviceRGB /Filter /FlateDecode{}",
                        dims, smask_ref
                    ),
                    &compress_to_vec_zlib(rgb, 6),
                )
            }
        }
    }

    fn build_xobject_resource_dict(page: &LayoutPage, builder: &PdfBuilder) -> String {
        let indices: BTreeSet<usize> = page
            .elements
            .iter()
            .filter_map(|el| match &el.draw {
                DrawCommand::Image { image } => builder.image_index.get(&image_id(image)).copied(),
                _ => None,
            })
            .collect();
        indices
            .iter()
            .map(|&idx| format!("/Im{} {} 0 R", idx, builder.image_objects[idx]))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn build_font_resource_dict(font_objects: &[(FontKey, usize)]) -> String {
        font_objects
            .iter()
            .enumerate()
            .map(|(i, (_, obj_id))| format!("/F{} {} 0 R", i, obj_id))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// A PDF name for an embedded font: alphanumerics of the family plus
    /// weight and style suffixes.
    fn sanitize_font_name(family: &str, weight: u32, italic: bool) -> String {
        let mut name: String = family
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .collect();
        if name.is_empty() {
            name = "CustomFont".to_string();
        }
        if weight >= 700 {
            name.push_str("-Bold");
        }
        if italic {
            name.push_str("-Italic");
        }
        name
    }

    fn escape_pdf_string(s: &str) -> String {
        s.replace('\\', "\\\\").replace('(', "\\(").replace(')', "\\)")
    }

    /// A text string for the Info dictionary: literal when ASCII, UTF-16BE
    /// hex with a byte order mark otherwise.
    fn pdf_text_string(s: &str) -> String {
        if s.is_ascii() {
            return format!("({})", Self::escape_pdf_string(s));
        }
        let mut hex = String::from("<FEFF");
        for unit in s.encode_utf16() {
            let _ = write!(hex, "{:04X}", unit);
        }
        hex.push('>');
        hex
    }

    /// Encode text for a standard font string operand. Characters outside
    /// WinAnsiEncoding become `?`.
    fn encode_winansi(text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for ch in text.chars() {
            match Self::unicode_to_winansi(ch).unwrap_or(b'?') {
                b'\\' => out.push_str("\\\\"),
                b'(' => out.push_str("\\("),
                b')' => out.push_str("\\)"),
                b @ 0x20..=0x7E => out.push(b as char),
                b => {
                    let _ = write!(out, "\\{:03o}", b);
                }
            }
        }
        out
    }

    /// Map a Unicode codepoint to its Windows-1252 (WinAnsiEncoding) byte.
    fn unicode_to_winansi(ch: char) -> Option<u8> {
        let cp = ch as u32;
        if (0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp) {
            return Some(cp as u8);
        }
        let byte = match cp {
            0x20AC => 0x80,
            0x201A => 0x82,
            0x0192 => 0x83,
            0x201E => 0x84,
            0x2026 => 0x85,
            0x2020 => 0x86,
            0x2021 => 0x87,
            0x02C6 => 0x88,
            0x2030 => 0x89,
            0x0160 => 0x8A,
            0x2039 => 0x8B,
            0x0152 => 0x8C,
            0x017D => 0x8E,
            0x2018 => 0x91,
            0x2019 => 0x92,
            0x201C => 0x93,
            0x201D => 0x94,
            0x2022 => 0x95,
            0x2013 => 0x96,
            0x2014 => 0x97,
            0x02DC => 0x98,
            0x2122 => 0x99,
            0x0161 => 0x9A,
            0x203A => 0x9B,
            0x0153 => 0x9C,
            0x017E => 0x9E,
            0x0178 => 0x9F,
            _ => return None,
        };
        Some(byte)
    }

    /// Lay out the objects, the xref table and the trailer.
    fn serialize(builder: &PdfBuilder, info_obj_id: usize) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets = vec![0usize; builder.objects.len()];

        output.extend_from_slice(b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n");

        for (i, obj) in builder.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let _ = write!(output, "{} 0 obj\n", i);
            output.extend_from_slice(obj);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n0000000000 65535 f \n", builder.objects.len());
        for offset in offsets.iter().skip(1) {
            let _ = write!(output, "{:010} 00000 n \n", offset);
        }
        let _ = write!(
            output,
            "trailer\n<< /Size {} /Root 1 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            builder.objects.len(),
            info_obj_id,
            xref_offset
        );
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::PositionedGlyph;
    use crate::model::Color;

    fn blank_page() -> LayoutPage {
        LayoutPage {
            width: 595.28,
            height: 841.89,
            elements: vec![],
        }
    }

    fn text_element(text: &str, font: FontKey) -> LayoutElement {
        let glyphs = text
            .chars()
            .enumerate()
            .map(|(i, ch)| PositionedGlyph {
                ch,
                x_offset: i as f64 * 6.0,
                font: font.clone(),
                font_size: 12.0,
            })
            .collect();
        LayoutElement {
            x: 50.0,
            y: 80.0,
            width: 100.0,
            height: 16.0,
            draw: DrawCommand::Text {
                line: TextLine {
                    x: 50.0,
                    y: 92.0,
                    glyphs,
                    width: 100.0,
                },
                color: Color::WHITE,
            },
        }
    }

    fn image_element(image: &Arc<LoadedImage>) -> LayoutElement {
        LayoutElement {
            x: 50.0,
            y: 80.0,
            width: 200.0,
            height: 100.0,
            draw: DrawCommand::Image {
                image: Arc::clone(image),
            },
        }
    }

    fn count(haystack: &[u8], needle: &[u8]) -> usize {
        haystack.windows(needle.len()).filter(|w| *w == needle).count()
    }

    #[test]
    fn test_escape_pdf_string() {
        assert_eq!(PdfWriter::escape_pdf_string("Hello (World)"), "Hello \\(World\\)");
        assert_eq!(PdfWriter::escape_pdf_string("back\\slash"), "back\\\\slash");
    }

    #[test]
    fn empty_document_produces_valid_pdf() {
        let bytes = PdfWriter::new()
            .write(&[blank_page()], &Metadata::default(), &FontContext::new())
            .unwrap();
        assert!(bytes.starts_with(b"%PDF-1.7"));
        assert!(bytes.ends_with(b"%%EOF\n"));
        assert_eq!(count(&bytes, b"xref"), 2); // "xref" and "startxref"
        assert_eq!(count(&bytes, b"/Type /Page "), 1);
        assert_eq!(count(&bytes, b"/Count 1"), 1);
    }

    #[test]
    fn one_page_object_per_page() {
        let pages = vec![blank_page(), blank_page(), blank_page()];
        let bytes = PdfWriter::new()
            .write(&pages, &Metadata::default(), &FontContext::new())
            .unwrap();
        assert_eq!(count(&bytes, b"/Type /Page "), 3);
        assert_eq!(count(&bytes, b"/Count 3"), 1);
    }

    #[test]
    fn metadata_in_info_dictionary() {
        let metadata = Metadata {
            title: Some("Winter (2025)".to_string()),
            author: Some("Ryan".to_string()),
        };
        let bytes = PdfWriter::new()
            .write(&[blank_page()], &metadata, &FontContext::new())
            .unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Title (Winter \\(2025\\))"));
        assert!(text.contains("/Author (Ryan)"));
        assert!(text.contains("/Producer (autfolio"));
        assert!(text.contains("/Info "));
    }

    #[test]
    fn non_ascii_title_is_utf16() {
        assert_eq!(PdfWriter::pdf_text_string("北"), "<FEFF5317>");
        assert_eq!(PdfWriter::pdf_text_string("ok"), "(ok)");
    }

    #[test]
    fn regular_and_bold_are_separate_fonts() {
        let mut page = blank_page();
        page.elements.push(text_element("A", FontKey::helvetica()));
        page.elements.push(text_element("B", FontKey::helvetica_bold()));
        let bytes = PdfWriter::new()
            .write(&[page], &Metadata::default(), &FontContext::new())
            .unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/BaseFont /Helvetica /Encoding"));
        assert!(text.contains("/BaseFont /Helvetica-Bold "));
        assert!(text.contains("/Type1"));
        assert!(!text.contains("CIDFontType2"));
    }

    #[test]
    fn content_stream_flips_y_and_splits_font_runs() {
        let ctx = FontContext::new();
        let mut builder = PdfBuilder::new();
        let mut page = blank_page();
        let mut el = text_element("ab", FontKey::helvetica());
        if let DrawCommand::Text { line, .. } = &mut el.draw {
            line.glyphs[1].font = FontKey::helvetica_bold();
        }
        page.elements.push(el);

        let writer = PdfWriter::new();
        writer
            .register_fonts(&mut builder, std::slice::from_ref(&page), &ctx)
            .unwrap();
        let stream = writer.build_content_stream(&page, &builder, &ctx);

        assert!(stream.contains("/F0 12.0 Tf\n1 0 0 1 50.00 749.89 Tm\n(a) Tj"));
        assert!(stream.contains("/F1 12.0 Tf\n1 0 0 1 56.00 749.89 Tm\n(b) Tj"));
        assert!(stream.starts_with("BT\n1.000 1.000 1.000 rg\n"));
    }

    #[test]
    fn identical_images_are_embedded_once() {
        let image = Arc::new(LoadedImage {
            pixel_data: ImagePixelData::Decoded {
                rgb: vec![255, 0, 0, 0, 255, 0],
                alpha: Some(vec![255, 128]),
            },
            width_px: 2,
            height_px: 1,
        });
        let mut first = blank_page();
        first.elements.push(image_element(&image));
        first.elements.push(image_element(&image));
        let mut second = blank_page();
        second.elements.push(image_element(&image));

        let bytes = PdfWriter::new()
            .write(&[first, second], &Metadata::default(), &FontContext::new())
            .unwrap();
        assert_eq!(count(&bytes, b"/ColorSpace /DeviceRGB"), 1);
        assert_eq!(count(&bytes, b"/ColorSpace /DeviceGray"), 1);
        assert_eq!(count(&bytes, b"/SMask "), 1);
        assert_eq!(count(&bytes, b"/XObject << /Im0 "), 2);
    }

    #[test]
    fn jpeg_passes_through_with_dctdecode() {
        let image = Arc::new(LoadedImage {
            pixel_data: ImagePixelData::Jpeg {
                data: vec![0xFF, 0xD8, 0xFF, 0xD9],
                color_space: JpegColorSpace::DeviceGray,
            },
            width_px: 1,
            height_px: 1,
        });
        let mut page = blank_page();
        page.elements.push(image_element(&image));
        let bytes = PdfWriter::new()
            .write(&[page], &Metadata::default(), &FontContext::new())
            .unwrap();
        assert_eq!(count(&bytes, b"/Filter /DCTDecode"), 1);
        assert_eq!(count(&bytes, b"\xFF\xD8\xFF\xD9"), 1);
    }

    #[test]
    fn winansi_encoding() {
        assert_eq!(PdfWriter::encode_winansi("a(b)"), "a\\(b\\)");
        assert_eq!(PdfWriter::encode_winansi("\u{2022} é"), "\\225 \\351");
        assert_eq!(PdfWriter::encode_winansi("北"), "?");
    }

    #[test]
    fn test_sanitize_font_name() {
        assert_eq!(PdfWriter::sanitize_font_name("BebasKai", 400, false), "BebasKai");
        assert_eq!(PdfWriter::sanitize_font_name("Futura", 700, true), "Futura-Bold-Italic");
        assert_eq!(PdfWriter::sanitize_font_name("Arial Unicode", 400, false), "ArialUnicode");
        assert_eq!(PdfWriter::sanitize_font_name("北京", 400, false), "CustomFont");
    }

    #[test]
    fn test_tounicode_cmap_format() {
        let char_to_gid = HashMap::from([('A', 36u16), ('北', 1200u16)]);
        let cmap = PdfWriter::build_tounicode_cmap(&char_to_gid, "TestFont");
        assert!(cmap.contains("<0000> <FFFF>"));
        assert!(cmap.contains("2 beginbfchar"));
        assert!(cmap.contains("<0024> <0041>"));
        assert!(cmap.contains("<04B0> <5317>"));
        assert!(cmap.contains("/CMapName /TestFont-UTF16 def"));
    }
}
