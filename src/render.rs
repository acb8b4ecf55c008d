//! # Document Pipeline
//!
//! Markdown source in, PDF bytes and a run report out.
//!
//! ```text
//! source ──► scan ──► blocks ──► pages ──► decorated pages ──► PDF
//!             │         ▲
//!             └─ image runs: discover → load/optimise → collage engine
//! ```
//!
//! Images that cannot be found or decoded never abort the run: they leave a
//! `[Image not found: …]` line in the document and are listed in
//! [`RenderStats::missing`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::{Local, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::collage::{CollageEngine, ImageRef, LayoutUnit};
use crate::config::{Config, DEFAULT_LAYOUT_SEED};
use crate::discovery::find_image_file;
use crate::error::{ImageError, PortfolioError};
use crate::font::{FontContext, Typography};
use crate::image_loader::{load_image, LoadedImage};
use crate::layout::{Block, LayoutEngine, PageDecor, Paragraph, PlacedUnit};
use crate::markdown::{
    document_word_count, extract_title, parse_inline, scan, ImageLine, InlineRun, Line,
};
use crate::model::{Color, Metadata};
use crate::pdf::PdfWriter;
use crate::report::{RenderReport, RenderStats};
use crate::style::{style_text, ParagraphStyle, StyleSheet};
use crate::text::StyledChar;

/// Size of the date, title, URL and page number on every page.
const DECORATION_FONT_SIZE: f64 = 6.0;
/// Space left by an empty source line.
const BLANK_LINE_SPACE: f64 = 6.0;

/// The units produced for one image section, for `--dump-layout`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionDump {
    /// Source line of the section's first image.
    pub first_line: usize,
    pub units: Vec<LayoutUnit>,
    pub skipped_groups: usize,
}

/// A rendered portfolio.
#[derive(Debug)]
pub struct Rendered {
    pub pdf: Vec<u8>,
    pub report: RenderReport,
    pub sections: Vec<SectionDump>,
}

/// Read a Markdown file and render it.
pub fn render_file(input: &Path, config: &Config) -> Result<Rendered, PortfolioError> {
    let source = std::fs::read_to_string(input).map_err(|e| PortfolioError::io(input, e))?;
    render(&source, config)
}

/// Render Markdown source to a PDF portfolio.
pub fn render(source: &str, config: &Config) -> Result<Rendered, PortfolioError> {
    config.validate()?;
    let processing_start = Instant::now();

    let (seed, seed_was_specified) = match config.layout.seed {
        Some(seed) => (seed, true),
        None => (
            u64::try_from(Utc::now().timestamp()).unwrap_or(DEFAULT_LAYOUT_SEED),
            false,
        ),
    };
    info!(seed, seed_was_specified, "starting layout");

    let mut font_context = FontContext::new();
    let typography = Typography::discover(&config.fonts, &mut font_context);
    let styles = StyleSheet::new(&typography);

    let title = extract_title(source);
    let mut builder = BlockBuilder {
        config,
        styles: &styles,
        engine: CollageEngine::new(config.layout.clone(), seed),
        blocks: Vec::new(),
        sections: Vec::new(),
        stats: RenderStats {
            word_count: document_word_count(source),
            ..RenderStats::default()
        },
        loaded: HashMap::new(),
    };
    for line in scan(source) {
        builder.push_line(line);
    }
    if let Some(author) = config.decor.author.as_deref() {
        builder.ensure_author_first(author);
    }
    let BlockBuilder {
        blocks,
        sections,
        stats,
        ..
    } = builder;
    let processing_time = processing_start.elapsed();

    let build_start = Instant::now();
    let engine = LayoutEngine::new(&config.page, config.layout.unit_spacing);
    let mut pages = engine.layout(&blocks, &font_context);
    let decor = PageDecor {
        date: config
            .decor
            .date
            .clone()
            .unwrap_or_else(|| Local::now().format("%B %Y").to_string()),
        title: title.clone(),
        footer_url: config.decor.footer_url.clone(),
        font: typography.header.clone(),
        cjk_font: typography.cjk.clone(),
        font_size: DECORATION_FONT_SIZE,
        color: Color::WHITE,
        background: Color::BLACK,
    };
    engine.decorate(&mut pages, &decor, &font_context);

    let metadata = Metadata {
        title: title.clone(),
        author: config.decor.author.clone(),
    };
    let pdf = PdfWriter::new().write(&pages, &metadata, &font_context)?;
    let build_time = build_start.elapsed();

    info!(
        pages = pages.len(),
        bytes = pdf.len(),
        images = stats.images_processed(),
        missing = stats.missing.len(),
        "rendered portfolio"
    );

    Ok(Rendered {
        pdf,
        report: RenderReport {
            stats,
            title,
            seed,
            seed_was_specified,
            element_count: blocks.len(),
            page_count: pages.len(),
            processing_time,
            build_time,
        },
        sections,
    })
}

/// Turns scanned lines into layout blocks.
struct BlockBuilder<'a> {
    config: &'a Config,
    styles: &'a StyleSheet,
    engine: CollageEngine,
    blocks: Vec<Block>,
    sections: Vec<SectionDump>,
    stats: RenderStats,
    /// Images already loaded, by resolved path, with their optimisation outcome.
    loaded: HashMap<PathBuf, (Arc<LoadedImage>, bool)>,
}

impl BlockBuilder<'_> {
    fn push_line(&mut self, line: Line) {
        let styles = self.styles;
        match line {
            Line::ImageRun { images } => self.push_section(&images),
            Line::Heading { level, text } => {
                let style = styles.heading(level, &text);
                self.push_plain(&text, style);
            }
            Line::Code { text } => {
                let style = styles.code();
                let chars = style_text(&text, &style.font, &style.font, style.font_size);
                self.push_paragraph(chars, style);
            }
            Line::Bullet { text } => {
                self.push_inline(&format!("\u{2022} {}", text), styles.body());
            }
            Line::Numbered { text } | Line::Paragraph { text } => {
                self.push_inline(&text, styles.body());
            }
            Line::Blank { after_heading } => {
                if !after_heading {
                    self.blocks.push(Block::Spacer(BLANK_LINE_SPACE));
                }
            }
        }
    }

    fn push_plain(&mut self, text: &str, style: &ParagraphStyle) {
        let chars = style_text(text, &style.font, self.styles.cjk_font(), style.font_size);
        self.push_paragraph(chars, style);
    }

    fn push_inline(&mut self, text: &str, style: &ParagraphStyle) {
        let runs: Vec<InlineRun> = parse_inline(text);
        let chars = self.styles.style_runs(&runs, style);
        self.push_paragraph(chars, style);
    }

    fn push_paragraph(&mut self, chars: Vec<StyledChar>, style: &ParagraphStyle) {
        self.blocks.push(Block::Paragraph(Paragraph {
            chars,
            style: style.clone(),
        }));
    }

    /// Find and load one image. A file referenced again reuses the pixels
    /// loaded the first time, so the PDF embeds it once.
    fn load(&mut self, line: &ImageLine) -> Result<(PathBuf, Arc<LoadedImage>), ImageError> {
        let located = find_image_file(&line.path, self.config.fallback_volume.as_deref())
            .ok_or_else(|| ImageError::NotFound(line.path.clone()))?;

        let (image, optimized) = match self.loaded.get(&located.path) {
            Some((image, optimized)) => {
                debug!(path = %located.path.display(), "reusing loaded image");
                (Arc::clone(image), *optimized)
            }
            None => {
                let loaded = load_image(&located.path, &self.config.optimize)?;
                let optimized = loaded.is_optimized();
                debug!(
                    path = %located.path.display(),
                    full_width = line.is_full_width,
                    fallback = located.used_fallback,
                    optimized,
                    "loaded image"
                );
                let image = Arc::new(loaded.image);
                self.loaded
                    .insert(located.path.clone(), (Arc::clone(&image), optimized));
                (image, optimized)
            }
        };

        if optimized {
            self.stats.optimized += 1;
        } else {
            self.stats.unchanged += 1;
        }
        Ok((located.path, image))
    }

    /// Resolve, load and lay out one run of consecutive images.
    fn push_section(&mut self, lines: &[ImageLine]) {
        info!(images = lines.len(), "processing image section");
        let styles = self.styles;
        let mut refs = Vec::with_capacity(lines.len());
        let mut pixels: Vec<Arc<LoadedImage>> = Vec::with_capacity(lines.len());

        for line in lines {
            match self.load(line) {
                Ok((path, image)) => {
                    refs.push(ImageRef::new(
                        path,
                        image.width_px,
                        image.height_px,
                        line.is_full_width,
                        pixels.len(),
                    ));
                    pixels.push(image);
                }
                Err(e) => {
                    warn!(line = line.line_number, "{}", e);
                    let placeholder = format!("[Image not found: {}]", line.path);
                    self.push_inline(&placeholder, styles.body());
                    self.stats.missing.push(line.path.clone());
                }
            }
        }

        if refs.is_empty() {
            return;
        }

        let page = &self.config.page;
        let layout =
            self.engine
                .partition_and_layout(refs, page.content_width(), page.content_height());
        self.stats.collages_created += layout.collages_created;
        debug!(
            units = layout.units.len(),
            collages = layout.collages_created,
            skipped = layout.skipped_groups,
            "laid out section"
        );

        for unit in &layout.units {
            let images = unit
                .placements()
                .iter()
                .map(|p| Arc::clone(&pixels[p.image.slot]))
                .collect();
            self.blocks.push(Block::Collage(PlacedUnit {
                unit: unit.clone(),
                images,
            }));
        }
        self.sections.push(SectionDump {
            first_line: lines.first().map_or(0, |l| l.line_number),
            units: layout.units,
            skipped_groups: layout.skipped_groups,
        });
    }

    /// Put the author's name first as a level-3 heading unless the
    /// document already opens with it.
    fn ensure_author_first(&mut self, author: &str) {
        let already_first = match self.blocks.first() {
            Some(Block::Paragraph(p)) => {
                let text: String = p.chars.iter().map(|sc| sc.ch).collect();
                text.trim() == author
            }
            _ => false,
        };
        if already_first {
            return;
        }
        let style = self.styles.heading(3, author);
        let chars = style_text(author, &style.font, self.styles.cjk_font(), style.font_size);
        self.blocks.insert(
            0,
            Block::Paragraph(Paragraph {
                chars,
                style: style.clone(),
            }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        let mut config = Config::default();
        config.fonts.heading.clear();
        config.fonts.body.clear();
        config.fonts.header.clear();
        config.fonts.cjk.clear();
        config.decor.date = Some("February 2025".to_string());
        config
    }

    fn paragraph_texts(blocks: &[Block]) -> Vec<String> {
        blocks
            .iter()
            .filter_map(|b| match b {
                Block::Paragraph(p) => Some(p.chars.iter().map(|sc| sc.ch).collect()),
                _ => None,
            })
            .collect()
    }

    fn build(source: &str, config: &Config) -> (Vec<Block>, RenderStats) {
        let styles = StyleSheet::new(&Typography::default());
        let mut builder = BlockBuilder {
            config,
            styles: &styles,
            engine: CollageEngine::new(config.layout.clone(), 7),
            blocks: Vec::new(),
            sections: Vec::new(),
            stats: RenderStats::default(),
            loaded: HashMap::new(),
        };
        for line in scan(source) {
            builder.push_line(line);
        }
        if let Some(author) = config.decor.author.as_deref() {
            builder.ensure_author_first(author);
        }
        (builder.blocks, builder.stats)
    }

    #[test]
    fn text_lines_become_paragraphs_and_spacers() {
        let (blocks, _) = build("### Trip\n\nHello **there**\n\n- item\n", &config());
        assert_eq!(paragraph_texts(&blocks), vec!["Trip", "Hello there", "\u{2022} item"]);
        // The blank line after the heading adds nothing; the next one does.
        assert!(matches!(blocks[1], Block::Paragraph(_)));
        assert!(matches!(blocks[2], Block::Spacer(s) if s == 6.0));
    }

    #[test]
    fn missing_image_leaves_placeholder() {
        let (blocks, stats) = build("/nonexistent/dir/DJI_1.jpg\n", &config());
        assert_eq!(
            paragraph_texts(&blocks),
            vec!["[Image not found: /nonexistent/dir/DJI_1.jpg]"]
        );
        assert_eq!(stats.missing, vec!["/nonexistent/dir/DJI_1.jpg"]);
        assert_eq!(stats.images_processed(), 0);
    }

    #[test]
    fn author_heading_inserted_once() {
        let mut config = config();
        config.decor.author = Some("Ryan McLoughlin".to_string());

        let (blocks, _) = build("Hello\n", &config);
        assert_eq!(paragraph_texts(&blocks), vec!["Ryan McLoughlin", "Hello"]);

        let (blocks, _) = build("### Ryan McLoughlin\nHello\n", &config);
        assert_eq!(paragraph_texts(&blocks), vec!["Ryan McLoughlin", "Hello"]);
    }

    #[test]
    fn render_text_only_document() {
        let mut config = config();
        config.layout.seed = Some(42);
        let rendered = render("### Winter\n\nSome words here.\n", &config).unwrap();
        assert!(rendered.pdf.starts_with(b"%PDF-1.7"));
        assert_eq!(rendered.report.title.as_deref(), Some("Winter"));
        assert_eq!(rendered.report.seed, 42);
        assert!(rendered.report.seed_was_specified);
        assert_eq!(rendered.report.stats.word_count, 4);
        assert_eq!(rendered.report.page_count, 1);
        assert!(rendered.sections.is_empty());
    }

    #[test]
    fn unpinned_seed_comes_from_clock() {
        let mut config = config();
        config.layout.seed = None;
        let rendered = render("text\n", &config).unwrap();
        assert!(!rendered.report.seed_was_specified);
        assert!(rendered.report.seed > 1_700_000_000);
    }
}
