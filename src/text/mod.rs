//! # Text Layout
//!
//! Greedy line breaking over styled characters.
//!
//! Break opportunities follow UAX#14, so CJK text can wrap between
//! ideographs while Latin text wraps at spaces. A word wider than the line
//! is broken at the last character that fits.

use unicode_linebreak::{linebreaks, BreakOpportunity};

use crate::font::{FontContext, FontKey};

/// A character with the face it is drawn in.
#[derive(Debug, Clone, PartialEq)]
pub struct StyledChar {
    pub ch: char,
    pub font: FontKey,
    pub font_size: f64,
}

/// A line of text after line-breaking.
#[derive(Debug, Clone)]
pub struct BrokenLine {
    pub chars: Vec<StyledChar>,
    /// X position of each character relative to line start.
    pub char_positions: Vec<f64>,
    /// Width without trailing spaces.
    pub width: f64,
}

impl BrokenLine {
    pub fn text(&self) -> String {
        self.chars.iter().map(|sc| sc.ch).collect()
    }
}

fn is_newline(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Compute UAX#14 break opportunities indexed by char position.
///
/// Entry `i` is the opportunity *before* `char[i]`. Index 0 is always
/// `None`.
fn compute_break_opportunities(text: &str) -> Vec<Option<BreakOpportunity>> {
    let char_count = text.chars().count();
    let mut result = vec![None; char_count];

    // linebreaks() yields byte offsets of the start of the next segment.
    let mut byte_to_char = vec![0usize; text.len() + 1];
    for (char_idx, (byte_idx, _)) in text.char_indices().enumerate() {
        byte_to_char[byte_idx] = char_idx;
    }
    byte_to_char[text.len()] = char_count;

    for (byte_offset, opp) in linebreaks(text) {
        let char_idx = byte_to_char[byte_offset];
        if char_idx < char_count {
            result[char_idx] = Some(opp);
        }
    }

    result
}

/// Break styled text into lines no wider than `max_width`.
///
/// Always returns at least one line; empty input yields one empty line.
pub fn break_lines(
    chars: &[StyledChar],
    max_width: f64,
    font_context: &FontContext,
) -> Vec<BrokenLine> {
    if chars.is_empty() {
        return vec![make_line(&[], &[])];
    }

    let widths: Vec<f64> = chars
        .iter()
        .map(|sc| font_context.char_width(sc.ch, &sc.font, sc.font_size))
        .collect();

    let plain: String = chars.iter().map(|sc| sc.ch).collect();
    let opportunities = compute_break_opportunities(&plain);

    let mut lines = Vec::new();
    let mut line_start = 0;
    let mut line_width = 0.0;
    let mut last_break: Option<usize> = None;

    for i in 0..chars.len() {
        if i > 0 {
            match opportunities[i] {
                Some(BreakOpportunity::Mandatory) => {
                    let end = if is_newline(chars[i - 1].ch) { i - 1 } else { i };
                    lines.push(make_line(&chars[line_start..end], &widths[line_start..end]));
                    line_start = i;
                    line_width = 0.0;
                    last_break = None;
                }
                Some(BreakOpportunity::Allowed) => last_break = Some(i - 1),
                None => {}
            }
        }

        if is_newline(chars[i].ch) {
            continue;
        }

        let width = widths[i];
        if line_width + width > max_width && line_start < i {
            match last_break.filter(|&bp| bp >= line_start) {
                Some(bp) => {
                    // UAX#14 break after bp.
                    let end = bp + 1;
                    lines.push(make_line(&chars[line_start..end], &widths[line_start..end]));
                    line_start = end;
                    line_width = widths[line_start..=i].iter().sum();
                }
                None => {
                    lines.push(make_line(&chars[line_start..i], &widths[line_start..i]));
                    line_start = i;
                    line_width = width;
                }
            }
            last_break = None;
            continue;
        }

        line_width += width;
    }

    if line_start < chars.len() {
        let end = if is_newline(chars[chars.len() - 1].ch) {
            chars.len() - 1
        } else {
            chars.len()
        };
        lines.push(make_line(&chars[line_start..end], &widths[line_start..end]));
    }

    lines
}

fn make_line(chars: &[StyledChar], widths: &[f64]) -> BrokenLine {
    let mut positions = Vec::with_capacity(chars.len());
    let mut x = 0.0;
    for &w in widths {
        positions.push(x);
        x += w;
    }

    // Trailing spaces do not count towards the width.
    let mut effective_width = x;
    let mut i = chars.len();
    while i > 0 && chars[i - 1].ch == ' ' {
        i -= 1;
        effective_width -= widths[i];
    }

    BrokenLine {
        chars: chars.to_vec(),
        char_positions: positions,
        width: effective_width,
    }
}

/// Width of a styled string on one line.
pub fn measure(chars: &[StyledChar], font_context: &FontContext) -> f64 {
    chars
        .iter()
        .map(|sc| font_context.char_width(sc.ch, &sc.font, sc.font_size))
        .sum()
}
