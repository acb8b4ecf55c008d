//! # Markdown Line Scanner
//!
//! Portfolio sources are Markdown exported from Google Docs: one image path
//! per line, headings, code spans, bullets and plain paragraphs. This is a
//! line-oriented scanner, not a CommonMark parser. Each source line maps to
//! at most one [`Line`], except that consecutive image lines are gathered
//! into a single [`Line::ImageRun`].
//!
//! Google Docs escapes underscores and punctuation (`DJI\_0042.jpg`), so
//! every line goes through [`clean_markdown_escapes`] before anything else.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static RE_ESCAPED_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\([^\w/\\])").expect("valid escape regex"));
static RE_LIST_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[-*]\s*(?:\[\s*[xX]?\s*\])?\s*").expect("valid list marker regex")
});
static RE_IMAGE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:[A-Za-z]:\\|/|\./|\.?/)?.*?\.(?:jpg|jpeg|png|gif|bmp)(?:\s.*)?$")
        .expect("valid image line regex")
});
static RE_IMAGE_PARTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(.*?\.(?:jpg|jpeg|png|gif|bmp))\s*(\{.*\})?\s*$")
        .expect("valid image parts regex")
});
static RE_IMAGE_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(.*?\.(?:jpg|jpeg|png|gif|bmp))").expect("valid image path regex")
});
static RE_HEADING_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*#+\s*").expect("valid heading regex"));
static RE_EMPHASIS_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*|\*|`").expect("valid emphasis regex"));
static RE_NUMBERED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\s").expect("valid numbered regex"));
static RE_INLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*|\*(.*?)\*").expect("valid inline regex"));

/// Pinyin vowels with tone marks, rendered with the CJK font alongside
/// ideographs.
const PINYIN_CHARS: &str = "āáǎàōóǒòēéěèīíǐìūúǔùǖǘǚǜüĀÁǍÀŌÓǑÒĒÉĚÈĪÍǏÌŪÚǓÙǕǗǙǛÜ";

/// Undo Google Docs escaping while keeping Windows path separators.
///
/// `\_` becomes `_`, `\.` and `\\.` become `.`, and a backslash in front of
/// any other punctuation is dropped. Backslashes before letters, digits,
/// `/` or another backslash are kept.
pub fn clean_markdown_escapes(line: &str) -> String {
    let line = line
        .replace(r"\_", "_")
        .replace(r"\.", ".")
        .replace(r"\\.", ".");
    RE_ESCAPED_PUNCT.replace_all(&line, "$1").into_owned()
}

/// Remove a leading `-` / `*` list marker and an optional `[ ]` / `[x]`
/// checkbox.
pub fn strip_list_markers(line: &str) -> String {
    RE_LIST_MARKER.replace(line, "").into_owned()
}

fn normalize(line: &str) -> String {
    strip_list_markers(&clean_markdown_escapes(line.trim()))
}

/// Whether a source line references an image file.
pub fn is_image_line(line: &str) -> bool {
    RE_IMAGE_LINE.is_match(&normalize(line))
}

/// A parsed image reference line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageLine {
    pub path: String,
    /// Trailing `{layout=full}` attribute.
    pub is_full_width: bool,
    /// 1-based line number in the source.
    pub line_number: usize,
}

/// Split an image line into its path and attributes.
///
/// Text after the extension that is not an attribute block (e.g. a stray
/// `1`) leaves the whole cleaned line as the path, which then fails to
/// resolve and is reported as missing.
pub fn parse_image_line(line: &str, line_number: usize) -> ImageLine {
    let content = normalize(line);
    let (path, is_full_width) = match RE_IMAGE_PARTS.captures(&content) {
        Some(caps) => {
            let path = caps.get(1).map_or("", |m| m.as_str()).trim().to_string();
            let full = caps
                .get(2)
                .is_some_and(|attrs| attrs.as_str().contains("layout=full"));
            (path, full)
        }
        None => (content.clone(), false),
    };
    let path = match path.strip_prefix("./") {
        Some(rest) => rest.to_string(),
        None => path,
    };
    ImageLine {
        path,
        is_full_width,
        line_number,
    }
}

/// The bare path of an image line, without attributes or trailing text.
pub fn image_path(line: &str) -> Option<String> {
    let content = normalize(line);
    RE_IMAGE_PATH
        .captures(&content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// One classified unit of the source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Line {
    /// Consecutive image lines; laid out together as one section.
    ImageRun { images: Vec<ImageLine> },
    Heading { level: u8, text: String },
    Code { text: String },
    Bullet { text: String },
    Numbered { text: String },
    Paragraph { text: String },
    /// An empty line. Blank lines directly below a heading add no space.
    Blank { after_heading: bool },
}

/// Classify every line of a Markdown source.
pub fn scan(source: &str) -> Vec<Line> {
    let raw: Vec<&str> = source.lines().collect();
    let mut out = Vec::new();
    let mut i = 0;

    while i < raw.len() {
        if is_image_line(raw[i]) {
            let mut images = Vec::new();
            while i < raw.len() && is_image_line(raw[i]) {
                images.push(parse_image_line(raw[i], i + 1));
                i += 1;
            }
            out.push(Line::ImageRun { images });
            continue;
        }

        let after_heading = i > 0 && {
            let prev = clean_markdown_escapes(raw[i - 1].trim());
            ["# ", "## ", "### "].iter().any(|h| prev.starts_with(h))
        };
        out.push(classify_text_line(raw[i], after_heading));
        i += 1;
    }

    out
}

fn classify_text_line(line: &str, after_heading: bool) -> Line {
    let trimmed = normalize(line);

    if trimmed.is_empty() {
        return Line::Blank { after_heading };
    }
    for (prefix, level) in [("### ", 3), ("## ", 2), ("# ", 1)] {
        if let Some(text) = trimmed.strip_prefix(prefix) {
            return Line::Heading {
                level,
                text: text.to_string(),
            };
        }
    }
    if trimmed.len() >= 2 && trimmed.starts_with('`') && trimmed.ends_with('`') {
        return Line::Code {
            text: trimmed[1..trimmed.len() - 1].to_string(),
        };
    }
    let lead = line.trim_start();
    if lead.starts_with("- ") || lead.starts_with("* ") {
        return Line::Bullet {
            text: trimmed
                .trim_start_matches(['-', '*', ' '])
                .trim()
                .to_string(),
        };
    }
    if RE_NUMBERED.is_match(&trimmed) {
        return Line::Numbered { text: trimmed };
    }
    Line::Paragraph { text: trimmed }
}

/// Title of the document: the first `### ` heading, cleaned.
pub fn extract_title(source: &str) -> Option<String> {
    source.lines().find_map(|line| {
        line.trim()
            .strip_prefix("### ")
            .map(|title| clean_markdown_escapes(title).trim().to_string())
    })
}

/// Words in a text line once list, heading and emphasis markers are gone.
pub fn word_count(line: &str) -> usize {
    let text = normalize(line);
    let text = RE_HEADING_MARKER.replace(&text, "");
    let text = RE_EMPHASIS_MARKER.replace_all(&text, "");
    text.split_whitespace().count()
}

/// Total words across all non-image lines.
pub fn document_word_count(source: &str) -> usize {
    source
        .lines()
        .filter(|line| !is_image_line(line))
        .map(word_count)
        .sum()
}

/// A run of text sharing one emphasis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineRun {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
}

impl InlineRun {
    fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            bold: false,
            italic: false,
        }
    }
}

/// Split `**bold**` and `*italic*` spans out of a text line. Markers are
/// not nested; an unmatched `*` stays literal.
pub fn parse_inline(text: &str) -> Vec<InlineRun> {
    let mut runs = Vec::new();
    let mut last = 0;

    for caps in RE_INLINE.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > last {
            runs.push(InlineRun::plain(&text[last..whole.start()]));
        }
        if let Some(bold) = caps.get(1) {
            runs.push(InlineRun {
                text: bold.as_str().to_string(),
                bold: true,
                italic: false,
            });
        } else if let Some(italic) = caps.get(2) {
            runs.push(InlineRun {
                text: italic.as_str().to_string(),
                bold: false,
                italic: true,
            });
        }
        last = whole.end();
    }
    if last < text.len() {
        runs.push(InlineRun::plain(&text[last..]));
    }
    runs.retain(|run| !run.text.is_empty());
    runs
}

/// Whether a character is a CJK ideograph or a toned Pinyin vowel.
pub fn is_cjk_or_pinyin(ch: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&ch) || PINYIN_CHARS.contains(ch)
}

pub fn has_cjk_or_pinyin(text: &str) -> bool {
    text.chars().any(is_cjk_or_pinyin)
}

/// Split text into alternating runs; the flag is true for CJK/Pinyin runs.
pub fn split_scripts(text: &str) -> Vec<(String, bool)> {
    let mut runs: Vec<(String, bool)> = Vec::new();
    for ch in text.chars() {
        let cjk = is_cjk_or_pinyin(ch);
        match runs.last_mut() {
            Some((run, flag)) if *flag == cjk => run.push(ch),
            _ => runs.push((ch.to_string(), cjk)),
        }
    }
    runs
}
