//! # Paragraph Styles
//!
//! The fixed stylesheet of the portfolio: white text on black pages, three
//! heading levels, body text and code blocks. Headings containing CJK
//! ideographs or Pinyin switch entirely to the CJK face; body text keeps
//! its face and only the CJK/Pinyin runs use the CJK font.

use crate::font::{FontKey, Typography};
use crate::markdown::{has_cjk_or_pinyin, split_scripts, InlineRun};
use crate::model::Color;
use crate::text::StyledChar;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
}

/// Everything needed to set one paragraph.
#[derive(Debug, Clone, PartialEq)]
pub struct ParagraphStyle {
    pub font: FontKey,
    pub font_size: f64,
    /// Baseline-to-baseline distance.
    pub leading: f64,
    /// Dropped at the top of a page.
    pub space_before: f64,
    pub space_after: f64,
    pub align: TextAlign,
    pub color: Color,
    /// Band drawn behind the paragraph's lines.
    pub background: Option<Color>,
    pub left_indent: f64,
}

impl ParagraphStyle {
    fn new(font: &FontKey, font_size: f64, leading: f64) -> Self {
        Self {
            font: font.clone(),
            font_size,
            leading,
            space_before: 0.0,
            space_after: 0.0,
            align: TextAlign::Left,
            color: Color::WHITE,
            background: None,
            left_indent: 0.0,
        }
    }

    fn before(mut self, space: f64) -> Self {
        self.space_before = space;
        self
    }

    fn after(mut self, space: f64) -> Self {
        self.space_after = space;
        self
    }

    fn centered(mut self) -> Self {
        self.align = TextAlign::Center;
        self
    }
}

#[derive(Debug, Clone)]
pub struct StyleSheet {
    headings: [ParagraphStyle; 3],
    cjk_headings: [ParagraphStyle; 3],
    body: ParagraphStyle,
    code: ParagraphStyle,
    cjk_font: FontKey,
}

impl StyleSheet {
    pub fn new(typography: &Typography) -> Self {
        let heading = &typography.heading;
        let cjk = &typography.cjk;

        Self {
            headings: [
                ParagraphStyle::new(heading, 30.0, 36.0).after(20.0),
                ParagraphStyle::new(heading, 20.0, 30.0).before(12.0).after(6.0),
                ParagraphStyle::new(heading, 25.0, 30.0)
                    .before(12.0)
                    .after(20.0)
                    .centered(),
            ],
            cjk_headings: [
                ParagraphStyle::new(cjk, 30.0, 36.0).after(20.0),
                ParagraphStyle::new(cjk, 24.0, 30.0).before(12.0).after(16.0),
                ParagraphStyle::new(cjk, 25.0, 30.0)
                    .before(12.0)
                    .after(20.0)
                    .centered(),
            ],
            body: ParagraphStyle::new(&typography.body, 11.0, 16.0).before(6.0),
            code: ParagraphStyle {
                background: Some(Color::hex("#333333")),
                left_indent: 20.0,
                ..ParagraphStyle::new(&FontKey::courier(), 10.0, 14.0)
                    .before(6.0)
                    .after(6.0)
            },
            cjk_font: cjk.clone(),
        }
    }

    /// Style for a heading of `level` (clamped to 1..=3), switching to the
    /// CJK variant when the text needs it.
    pub fn heading(&self, level: u8, text: &str) -> &ParagraphStyle {
        let idx = usize::from(level.clamp(1, 3)) - 1;
        if has_cjk_or_pinyin(text) {
            &self.cjk_headings[idx]
        } else {
            &self.headings[idx]
        }
    }

    pub fn body(&self) -> &ParagraphStyle {
        &self.body
    }

    pub fn code(&self) -> &ParagraphStyle {
        &self.code
    }

    pub fn cjk_font(&self) -> &FontKey {
        &self.cjk_font
    }

    /// Styled characters for emphasis runs set in `style`. CJK and Pinyin
    /// characters take the CJK face at the same size.
    pub fn style_runs(&self, runs: &[InlineRun], style: &ParagraphStyle) -> Vec<StyledChar> {
        let mut chars = Vec::new();
        for run in runs {
            let font = style.font.styled(run.bold, run.italic);
            chars.extend(style_text(&run.text, &font, &self.cjk_font, style.font_size));
        }
        chars
    }
}

/// Style plain text in `font`, switching CJK/Pinyin runs to `cjk_font`.
pub fn style_text(text: &str, font: &FontKey, cjk_font: &FontKey, font_size: f64) -> Vec<StyledChar> {
    split_scripts(text)
        .into_iter()
        .flat_map(|(run, is_cjk)| {
            let font = if is_cjk { cjk_font } else { font };
            run.chars()
                .map(|ch| StyledChar {
                    ch,
                    font: font.clone(),
                    font_size,
                })
                .collect::<Vec<_>>()
        })
        .collect()
}
