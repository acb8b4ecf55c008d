//! # Page Flow
//!
//! Places the document's blocks onto fixed-size pages.
//!
//! Blocks flow top to bottom inside the content frame. Paragraphs are
//! broken into lines and may split across pages (with orphan and widow
//! control); collage units are unbreakable and are centred horizontally.
//! Vertical space is not carried over a page break.
//!
//! Coordinates on a [`LayoutPage`] are in points from the top-left corner of
//! the page. The PDF writer flips them.
//!
//! Page decorations (background, header, footer, page numbers) are added by
//! [`LayoutEngine::decorate`] once the total page count is known.

pub mod page_break;

use std::sync::Arc;

use tracing::debug;

use crate::collage::LayoutUnit;
use crate::font::{FontContext, FontKey};
use crate::image_loader::LoadedImage;
use crate::model::{Color, PageSetup};
use crate::style::{style_text, ParagraphStyle, TextAlign};
use crate::text::{break_lines, StyledChar};

use page_break::{decide_break, BreakDecision};

const MIN_ORPHAN_LINES: usize = 2;
const MIN_WIDOW_LINES: usize = 2;

/// A styled paragraph ready to be broken into lines.
#[derive(Debug, Clone)]
pub struct Paragraph {
    pub chars: Vec<StyledChar>,
    pub style: ParagraphStyle,
}

/// A collage unit with the pixels of each of its images, in
/// [`LayoutUnit::placements`] order.
#[derive(Debug, Clone)]
pub struct PlacedUnit {
    pub unit: LayoutUnit,
    pub images: Vec<Arc<LoadedImage>>,
}

#[derive(Debug, Clone)]
pub enum Block {
    Paragraph(Paragraph),
    /// Vertical space in points.
    Spacer(f64),
    Collage(PlacedUnit),
}

/// A fully laid-out page ready for PDF serialization.
#[derive(Debug, Clone)]
pub struct LayoutPage {
    pub width: f64,
    pub height: f64,
    pub elements: Vec<LayoutElement>,
}

impl LayoutPage {
    /// All text on the page, one entry per line.
    pub fn text_lines(&self) -> Vec<String> {
        self.elements
            .iter()
            .filter_map(|el| match &el.draw {
                DrawCommand::Text { line, .. } => Some(line.text()),
                _ => None,
            })
            .collect()
    }

    pub fn image_count(&self) -> usize {
        self.elements
            .iter()
            .filter(|el| matches!(el.draw, DrawCommand::Image { .. }))
            .count()
    }
}

/// A positioned element on a page.
#[derive(Debug, Clone)]
pub struct LayoutElement {
    /// Top-left corner on the page.
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub draw: DrawCommand,
}

#[derive(Debug, Clone)]
pub enum DrawCommand {
    /// A filled rectangle.
    Rect { color: Color },
    Text { line: TextLine, color: Color },
    /// An image scaled to the element's box.
    Image { image: Arc<LoadedImage> },
}

#[derive(Debug, Clone)]
pub struct TextLine {
    pub x: f64,
    /// Baseline, from the top of the page.
    pub y: f64,
    pub glyphs: Vec<PositionedGlyph>,
    pub width: f64,
}

impl TextLine {
    pub fn text(&self) -> String {
        self.glyphs.iter().map(|g| g.ch).collect()
    }
}

#[derive(Debug, Clone)]
pub struct PositionedGlyph {
    pub ch: char,
    /// Offset from the line's x.
    pub x_offset: f64,
    pub font: FontKey,
    pub font_size: f64,
}

/// Text drawn on every page once layout is finished.
#[derive(Debug, Clone)]
pub struct PageDecor {
    /// Top left.
    pub date: String,
    /// Top centre.
    pub title: Option<String>,
    /// Bottom left.
    pub footer_url: Option<String>,
    pub font: FontKey,
    pub cjk_font: FontKey,
    pub font_size: f64,
    pub color: Color,
    pub background: Color,
}

/// Where we are on the current page.
#[derive(Debug)]
struct PageCursor {
    width: f64,
    height: f64,
    content_x: f64,
    content_y: f64,
    content_width: f64,
    content_height: f64,
    /// Distance from the top of the content frame.
    y: f64,
    elements: Vec<LayoutElement>,
}

impl PageCursor {
    fn new(setup: &PageSetup) -> Self {
        let (width, height) = setup.dimensions();
        Self {
            width,
            height,
            content_x: setup.margin.left,
            content_y: setup.margin.top,
            content_width: setup.content_width(),
            content_height: setup.content_height(),
            y: 0.0,
            elements: Vec::new(),
        }
    }

    fn at_top(&self) -> bool {
        self.y <= f64::EPSILON
    }

    fn remaining_height(&self) -> f64 {
        (self.content_height - self.y).max(0.0)
    }

    /// Close the current page and continue on a fresh one.
    fn break_page(&mut self, pages: &mut Vec<LayoutPage>) {
        pages.push(LayoutPage {
            width: self.width,
            height: self.height,
            elements: std::mem::take(&mut self.elements),
        });
        self.y = 0.0;
    }
}

pub struct LayoutEngine {
    setup: PageSetup,
    /// Space emitted after every collage unit.
    unit_spacing: f64,
}

impl LayoutEngine {
    pub fn new(setup: &PageSetup, unit_spacing: f64) -> Self {
        Self {
            setup: setup.clone(),
            unit_spacing,
        }
    }

    /// Flow `blocks` onto pages. Always yields at least one page.
    pub fn layout(&self, blocks: &[Block], font_context: &FontContext) -> Vec<LayoutPage> {
        let mut pages = Vec::new();
        let mut cursor = PageCursor::new(&self.setup);

        for block in blocks {
            match block {
                Block::Paragraph(paragraph) => {
                    self.layout_paragraph(paragraph, &mut cursor, &mut pages, font_context)
                }
                Block::Spacer(height) => Self::layout_spacer(*height, &mut cursor),
                Block::Collage(placed) => self.layout_collage(placed, &mut cursor, &mut pages),
            }
        }

        if !cursor.elements.is_empty() || pages.is_empty() {
            cursor.break_page(&mut pages);
        }
        debug!(pages = pages.len(), blocks = blocks.len(), "layout finished");
        pages
    }

    fn layout_spacer(height: f64, cursor: &mut PageCursor) {
        if cursor.at_top() {
            return;
        }
        cursor.y = (cursor.y + height).min(cursor.content_height);
    }

    fn layout_collage(&self, placed: &PlacedUnit, cursor: &mut PageCursor, pages: &mut Vec<LayoutPage>) {
        let unit = &placed.unit;
        let height = unit.height();
        if decide_break(cursor.remaining_height(), &[height], false, 0, 0)
            == BreakDecision::MoveToNextPage
            && !cursor.at_top()
        {
            cursor.break_page(pages);
        }

        let left = cursor.content_x + ((cursor.content_width - unit.width()) / 2.0).max(0.0);
        let top = cursor.content_y + cursor.y;
        for (placement, image) in unit.placements().iter().zip(&placed.images) {
            cursor.elements.push(LayoutElement {
                x: left + placement.x,
                y: top + placement.y,
                width: placement.width,
                height: placement.height,
                draw: DrawCommand::Image {
                    image: Arc::clone(image),
                },
            });
        }
        cursor.y += height;
        Self::layout_spacer(self.unit_spacing, cursor);
    }

    fn layout_paragraph(
        &self,
        paragraph: &Paragraph,
        cursor: &mut PageCursor,
        pages: &mut Vec<LayoutPage>,
        font_context: &FontContext,
    ) {
        let style = &paragraph.style;
        if !cursor.at_top() {
            cursor.y = (cursor.y + style.space_before).min(cursor.content_height);
        }

        let text_x = cursor.content_x + style.left_indent;
        let text_width = cursor.content_width - style.left_indent;
        let lines = break_lines(&paragraph.chars, text_width, font_context);

        let heights = vec![style.leading; lines.len()];
        let decision = decide_break(
            cursor.remaining_height(),
            &heights,
            true,
            MIN_ORPHAN_LINES,
            MIN_WIDOW_LINES,
        );
        if decision == BreakDecision::MoveToNextPage && !cursor.at_top() {
            cursor.break_page(pages);
        }
        let forced_break_at = match decision {
            BreakDecision::Split {
                lines_on_current_page,
            } => Some(lines_on_current_page),
            _ => None,
        };

        let mut band = Band::start(cursor);
        for (idx, line) in lines.iter().enumerate() {
            let needs_break = forced_break_at == Some(idx)
                || (style.leading > cursor.remaining_height() && !cursor.at_top());
            if needs_break && idx > 0 {
                band.close(style, text_x, text_width, cursor);
                cursor.break_page(pages);
                band = Band::start(cursor);
            }

            let line_x = match style.align {
                TextAlign::Left => text_x,
                TextAlign::Center => text_x + (text_width - line.width) / 2.0,
            };
            let glyphs: Vec<PositionedGlyph> = line
                .chars
                .iter()
                .zip(&line.char_positions)
                .map(|(sc, &x_offset)| PositionedGlyph {
                    ch: sc.ch,
                    x_offset,
                    font: sc.font.clone(),
                    font_size: sc.font_size,
                })
                .collect();

            let top = cursor.content_y + cursor.y;
            if !glyphs.is_empty() {
                cursor.elements.push(LayoutElement {
                    x: line_x,
                    y: top,
                    width: line.width,
                    height: style.leading,
                    draw: DrawCommand::Text {
                        line: TextLine {
                            x: line_x,
                            y: top + style.font_size,
                            glyphs,
                            width: line.width,
                        },
                        color: style.color,
                    },
                });
            }
            cursor.y += style.leading;
        }
        band.close(style, text_x, text_width, cursor);

        cursor.y = (cursor.y + style.space_after).min(cursor.content_height);
    }

    /// Add the black background, header, footer and `n/N` page numbers.
    pub fn decorate(&self, pages: &mut [LayoutPage], decor: &PageDecor, font_context: &FontContext) {
        let total = pages.len();
        let inset = self.setup.margin.left;
        let text = |s: &str| style_text(s, &decor.font, &decor.cjk_font, decor.font_size);

        for (idx, page) in pages.iter_mut().enumerate() {
            page.elements.insert(
                0,
                LayoutElement {
                    x: 0.0,
                    y: 0.0,
                    width: page.width,
                    height: page.height,
                    draw: DrawCommand::Rect {
                        color: decor.background,
                    },
                },
            );

            let header_y = 12.0;
            let footer_y = page.height - 10.0;

            page.elements.push(single_line(
                &text(&decor.date),
                Anchor::Left(inset),
                header_y,
                decor.color,
                font_context,
            ));
            if let Some(title) = decor.title.as_deref().filter(|t| !t.is_empty()) {
                page.elements.push(single_line(
                    &text(title),
                    Anchor::Center(page.width / 2.0),
                    header_y,
                    decor.color,
                    font_context,
                ));
            }
            if let Some(url) = decor.footer_url.as_deref().filter(|u| !u.is_empty()) {
                page.elements.push(single_line(
                    &text(url),
                    Anchor::Left(inset),
                    footer_y,
                    decor.color,
                    font_context,
                ));
            }
            page.elements.push(single_line(
                &text(&format!("{}/{}", idx + 1, total)),
                Anchor::Right(page.width - inset),
                footer_y,
                decor.color,
                font_context,
            ));
        }
    }
}

/// The background band of the part of a paragraph on one page.
struct Band {
    start_y: f64,
    insert_at: usize,
}

impl Band {
    fn start(cursor: &PageCursor) -> Self {
        Self {
            start_y: cursor.y,
            insert_at: cursor.elements.len(),
        }
    }

    fn close(&self, style: &ParagraphStyle, x: f64, width: f64, cursor: &mut PageCursor) {
        let Some(color) = style.background else { return };
        let height = cursor.y - self.start_y;
        if height <= 0.0 {
            return;
        }
        // Behind the lines it covers.
        cursor.elements.insert(
            self.insert_at,
            LayoutElement {
                x,
                y: cursor.content_y + self.start_y,
                width,
                height,
                draw: DrawCommand::Rect { color },
            },
        );
    }
}

#[derive(Debug, Clone, Copy)]
enum Anchor {
    Left(f64),
    Center(f64),
    Right(f64),
}

fn single_line(
    chars: &[StyledChar],
    anchor: Anchor,
    baseline: f64,
    color: Color,
    font_context: &FontContext,
) -> LayoutElement {
    let mut glyphs = Vec::with_capacity(chars.len());
    let mut width = 0.0;
    for sc in chars {
        glyphs.push(PositionedGlyph {
            ch: sc.ch,
            x_offset: width,
            font: sc.font.clone(),
            font_size: sc.font_size,
        });
        width += font_context.char_width(sc.ch, &sc.font, sc.font_size);
    }
    let x = match anchor {
        Anchor::Left(x) => x,
        Anchor::Center(x) => x - width / 2.0,
        Anchor::Right(x) => x - width,
    };
    let font_size = chars.first().map(|sc| sc.font_size).unwrap_or(0.0);

    LayoutElement {
        x,
        y: baseline - font_size,
        width,
        height: font_size,
        draw: DrawCommand::Text {
            line: TextLine {
                x,
                y: baseline,
                glyphs,
                width,
            },
            color,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collage::test_support::image;
    use crate::collage::build_row;
    use crate::font::Typography;
    use crate::image_loader::ImagePixelData;
    use crate::markdown::parse_inline;
    use crate::style::StyleSheet;

    fn pixel() -> Arc<LoadedImage> {
        Arc::new(LoadedImage {
            pixel_data: ImagePixelData::Decoded {
                rgb: vec![0, 0, 0],
                alpha: None,
            },
            width_px: 1,
            height_px: 1,
        })
    }

    fn body(text: &str) -> Block {
        let sheet = StyleSheet::new(&Typography::default());
        Block::Paragraph(Paragraph {
            chars: sheet.style_runs(&parse_inline(text), sheet.body()),
            style: sheet.body().clone(),
        })
    }

    fn collage(aspect_ratios: &[f64], max_height: f64) -> Block {
        let images = aspect_ratios
            .iter()
            .enumerate()
            .map(|(i, &ar)| image(&format!("{}.jpg", i), ar, i))
            .collect();
        let row = build_row(images, 495.28, max_height, 4.0).unwrap();
        Block::Collage(PlacedUnit {
            images: vec![pixel(); row.cells.len()],
            unit: LayoutUnit::Row(row),
        })
    }

    fn engine() -> LayoutEngine {
        LayoutEngine::new(&PageSetup::default(), 10.0)
    }

    #[test]
    fn empty_document_has_one_page() {
        let pages = engine().layout(&[], &FontContext::new());
        assert_eq!(pages.len(), 1);
        assert!(pages[0].elements.is_empty());
    }

    #[test]
    fn first_line_starts_at_top_margin() {
        let pages = engine().layout(&[body("Hello")], &FontContext::new());
        let el = &pages[0].elements[0];
        assert_eq!(el.x, 50.0);
        assert_eq!(el.y, 80.0);
        match &el.draw {
            DrawCommand::Text { line, color } => {
                assert_eq!(line.y, 80.0 + 11.0);
                assert_eq!(*color, Color::WHITE);
            }
            other => panic!("expected text, got {:?}", other),
        }
    }

    #[test]
    fn spacer_at_page_top_is_dropped() {
        let pages = engine().layout(&[Block::Spacer(6.0), body("Hello")], &FontContext::new());
        assert_eq!(pages[0].elements[0].y, 80.0);
    }

    #[test]
    fn collage_is_centered() {
        let pages = engine().layout(&[collage(&[1.0], 300.0)], &FontContext::new());
        let el = &pages[0].elements[0];
        assert!((el.height - 300.0).abs() < 1e-9);
        assert!((el.x - (50.0 + (495.28 - 300.0) / 2.0)).abs() < 1e-9);
        assert_eq!(pages[0].image_count(), 1);
    }

    #[test]
    fn collage_that_does_not_fit_moves_whole() {
        let blocks = vec![collage(&[1.0], 500.0), collage(&[1.0, 1.0], 400.0)];
        let pages = engine().layout(&blocks, &FontContext::new());
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].image_count(), 1);
        assert_eq!(pages[1].image_count(), 2);
        assert_eq!(pages[1].elements[0].y, 80.0);
    }

    #[test]
    fn unit_spacing_follows_every_collage() {
        let blocks = vec![collage(&[1.0], 100.0), collage(&[1.0], 100.0)];
        let pages = engine().layout(&blocks, &FontContext::new());
        assert_eq!(pages.len(), 1);
        let (first, second) = (&pages[0].elements[0], &pages[0].elements[1]);
        assert_eq!(first.y, 80.0);
        assert!((second.y - (first.y + first.height + 10.0)).abs() < 1e-9);
    }

    #[test]
    fn unit_spacing_does_not_carry_onto_a_fresh_page() {
        let blocks = vec![
            collage(&[0.5], 695.0),
            collage(&[1.0], 100.0),
            collage(&[1.0], 100.0),
        ];
        let pages = engine().layout(&blocks, &FontContext::new());
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].image_count(), 1);
        assert_eq!(pages[1].elements[0].y, 80.0);
        assert!((pages[1].elements[1].y - (80.0 + 100.0 + 10.0)).abs() < 1e-9);
    }

    #[test]
    fn long_paragraph_splits_without_losing_lines() {
        let text = "word ".repeat(3000);
        let ctx = FontContext::new();
        let pages = engine().layout(&[body(&text)], &ctx);
        assert!(pages.len() > 1);
        let words: usize = pages
            .iter()
            .flat_map(|p| p.text_lines())
            .map(|l| l.split_whitespace().count())
            .sum();
        assert_eq!(words, 3000);
        for page in &pages {
            for el in &page.elements {
                assert!(el.y + el.height <= 80.0 + 701.89 + 1e-6);
            }
            assert!(page.text_lines().len() >= 2);
        }
    }

    #[test]
    fn code_band_sits_behind_text() {
        let sheet = StyleSheet::new(&Typography::default());
        let block = Block::Paragraph(Paragraph {
            chars: sheet.style_runs(&parse_inline("let x = 1;"), sheet.code()),
            style: sheet.code().clone(),
        });
        let pages = engine().layout(&[block], &FontContext::new());
        assert!(matches!(pages[0].elements[0].draw, DrawCommand::Rect { .. }));
        assert!(matches!(pages[0].elements[1].draw, DrawCommand::Text { .. }));
        assert_eq!(pages[0].elements[0].x, 70.0);
    }

    #[test]
    fn decorations_number_every_page() {
        let blocks = vec![collage(&[1.0], 500.0), collage(&[1.0], 500.0)];
        let ctx = FontContext::new();
        let engine = engine();
        let mut pages = engine.layout(&blocks, &ctx);
        let decor = PageDecor {
            date: "February 2025".to_string(),
            title: Some("Trip".to_string()),
            footer_url: Some("https://example.com/".to_string()),
            font: FontKey::helvetica(),
            cjk_font: FontKey::helvetica(),
            font_size: 6.0,
            color: Color::WHITE,
            background: Color::BLACK,
        };
        engine.decorate(&mut pages, &decor, &ctx);

        assert_eq!(pages.len(), 2);
        for (i, page) in pages.iter().enumerate() {
            assert!(matches!(
                page.elements[0].draw,
                DrawCommand::Rect { color } if color == Color::BLACK
            ));
            let lines = page.text_lines();
            assert!(lines.contains(&"February 2025".to_string()));
            assert!(lines.contains(&"Trip".to_string()));
            assert!(lines.contains(&format!("{}/2", i + 1)));
        }
        let number = pages[0].elements.last().unwrap();
        assert!((number.x + number.width - (595.28 - 50.0)).abs() < 1e-9);
    }
}
