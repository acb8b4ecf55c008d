//! Integration tests for the Markdown to PDF pipeline.
//!
//! These tests write real image files into a temporary directory and run the
//! whole path from Markdown source to PDF bytes. They verify:
//! - Text-only documents render to a structurally valid PDF
//! - Image runs become collage units and embedded image objects
//! - Missing images degrade to placeholders instead of failing
//! - A pinned seed reproduces the same layout
//! - Configuration files and duplicate detection work end to end

use std::path::{Path, PathBuf};

use autfolio::collage::LayoutUnit;
use autfolio::model::PageSetup;
use autfolio::{find_duplicate_images, render, render_file, Config, PortfolioError};

// ─── Helpers ────────────────────────────────────────────────────

fn config() -> Config {
    let mut config = Config::default();
    config.fonts.heading.clear();
    config.fonts.body.clear();
    config.fonts.header.clear();
    config.fonts.cjk.clear();
    config.layout.seed = Some(1756844636);
    config.decor.date = Some("February 2025".to_string());
    config
}

/// Write a gradient JPEG of the given size and return its path.
fn write_jpeg(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x * y) % 256) as u8])
    });
    img.save(&path).unwrap();
    path
}

fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([20, 120, 200, 128]));
    img.save(&path).unwrap();
    path
}

fn count(haystack: &[u8], needle: &[u8]) -> usize {
    haystack.windows(needle.len()).filter(|w| *w == needle).count()
}

fn assert_valid_pdf(bytes: &[u8]) {
    assert!(bytes.len() > 50, "PDF too small to be valid");
    assert!(bytes.starts_with(b"%PDF-1.7"), "PDF must start with a header");
    assert!(count(bytes, b"xref") >= 1, "PDF must have a cross-reference table");
    assert!(count(bytes, b"/Root") >= 1, "PDF trailer must name the catalog");
    assert!(
        bytes.ends_with(b"%%EOF\n") || bytes.ends_with(b"%%EOF"),
        "PDF must end with %%EOF"
    );
}

fn unit_images(units: &[LayoutUnit]) -> usize {
    units.iter().map(LayoutUnit::image_count).sum()
}

// ─── Text ───────────────────────────────────────────────────────

#[test]
fn test_text_only_document() {
    let source = "### Winter in Harbin\n\nThe river froze early this year.\n\n- ice lanterns\n- *night* markets\n";
    let rendered = render(source, &config()).unwrap();

    assert_valid_pdf(&rendered.pdf);
    assert_eq!(rendered.report.page_count, 1);
    assert_eq!(rendered.report.title.as_deref(), Some("Winter in Harbin"));
    assert_eq!(rendered.report.stats.images_processed(), 0);
    assert!(rendered.report.stats.missing.is_empty());
    assert!(rendered.sections.is_empty());
    assert_eq!(count(&rendered.pdf, b"/Title (Winter in Harbin)"), 1);
}

#[test]
fn test_long_text_flows_onto_more_pages() {
    let paragraph = "word ".repeat(120);
    let source: String = (0..60).map(|_| format!("{}\n", paragraph)).collect();
    let rendered = render(&source, &config()).unwrap();

    assert_valid_pdf(&rendered.pdf);
    assert!(
        rendered.report.page_count > 3,
        "sixty long paragraphs should need several pages, got {}",
        rendered.report.page_count
    );
    assert_eq!(
        count(&rendered.pdf, b"/Type /Page "),
        rendered.report.page_count
    );
}

#[test]
fn test_author_heading_is_added_once() {
    let mut config = config();
    let without = render("Hello\n", &config).unwrap();

    config.decor.author = Some("Ryan McLoughlin".to_string());
    let with = render("Hello\n", &config).unwrap();
    assert_eq!(with.report.element_count, without.report.element_count + 1);

    let already = render("### Ryan McLoughlin\nHello\n", &config).unwrap();
    assert_eq!(already.report.element_count, with.report.element_count);
    assert_eq!(count(&with.pdf, b"/Author (Ryan McLoughlin)"), 1);
}

// ─── Images ─────────────────────────────────────────────────────

#[test]
fn test_image_run_becomes_collage_units() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_jpeg(dir.path(), "IMG_0001.jpg", 300, 200);
    let b = write_jpeg(dir.path(), "IMG_0002.jpg", 200, 300);
    let c = write_jpeg(dir.path(), "IMG_0003.jpg", 240, 240);
    let source = format!(
        "### Trip\n\n{}\n{}\n{}\n\nAfterwards.\n",
        a.display(),
        b.display(),
        c.display()
    );

    let rendered = render(&source, &config()).unwrap();
    assert_valid_pdf(&rendered.pdf);

    let stats = &rendered.report.stats;
    assert_eq!(stats.images_processed(), 3);
    assert!(stats.missing.is_empty());
    assert_eq!(rendered.sections.len(), 1);
    assert_eq!(unit_images(&rendered.sections[0].units), 3);
    assert_eq!(count(&rendered.pdf, b"/Subtype /Image"), 3);
    assert_eq!(count(&rendered.pdf, b"/Filter /DCTDecode"), 3);
}

#[test]
fn test_full_width_image_spans_content_width() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_jpeg(dir.path(), "IMG_full.jpg", 300, 200);
    let source = format!("{} {{layout=full}}\n", a.display());

    let config = config();
    let rendered = render(&source, &config).unwrap();
    let units = &rendered.sections[0].units;
    assert_eq!(units.len(), 1);
    assert!((units[0].width() - config.page.content_width()).abs() < 1e-6);
    assert!(units[0].height() <= config.page.content_height());
}

#[test]
fn test_png_with_alpha_gets_soft_mask() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_png(dir.path(), "overlay.png", 64, 48);
    let rendered = render(&format!("{}\n", a.display()), &config()).unwrap();

    assert_valid_pdf(&rendered.pdf);
    assert_eq!(rendered.report.stats.images_processed(), 1);
    assert_eq!(count(&rendered.pdf, b"/SMask "), 1);
}

#[test]
fn test_missing_image_is_reported_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let present = write_jpeg(dir.path(), "IMG_here.jpg", 300, 200);
    let absent = dir.path().join("IMG_gone.jpg");
    let source = format!("{}\n{}\n", present.display(), absent.display());

    let rendered = render(&source, &config()).unwrap();
    assert_valid_pdf(&rendered.pdf);

    let stats = &rendered.report.stats;
    assert_eq!(stats.images_processed(), 1);
    assert_eq!(stats.missing, vec![absent.display().to_string()]);
    assert_eq!(unit_images(&rendered.sections[0].units), 1);
}

#[test]
fn test_undecodable_image_counts_as_missing() {
    let dir = tempfile::tempdir().unwrap();
    let broken = dir.path().join("IMG_broken.jpg");
    std::fs::write(&broken, b"definitely not a jpeg").unwrap();

    let rendered = render(&format!("{}\n", broken.display()), &config()).unwrap();
    assert_eq!(rendered.report.stats.missing.len(), 1);
    assert!(rendered.sections.is_empty());
}

#[test]
fn test_pinned_seed_reproduces_layout() {
    let dir = tempfile::tempdir().unwrap();
    let sizes = [(300, 200), (200, 300), (320, 240), (240, 320), (300, 300), (330, 220), (220, 330)];
    let source: String = sizes
        .iter()
        .enumerate()
        .map(|(i, &(w, h))| {
            let path = write_jpeg(dir.path(), &format!("IMG_{:04}.jpg", i), w, h);
            format!("{}\n", path.display())
        })
        .collect();

    let first = render(&source, &config()).unwrap();
    let second = render(&source, &config()).unwrap();

    let dump = |r: &autfolio::Rendered| serde_json::to_string(&r.sections).unwrap();
    assert_eq!(dump(&first), dump(&second));
    assert_eq!(unit_images(&first.sections[0].units), sizes.len());
    assert_eq!(first.report.seed, 1756844636);
    assert!(first.report.seed_was_specified);
}

#[test]
fn test_repeated_image_is_embedded_once() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_jpeg(dir.path(), "IMG_again.jpg", 300, 200);
    let source = format!("{}\nSeen once more below.\n{}\n", a.display(), a.display());

    let rendered = render(&source, &config()).unwrap();
    assert_valid_pdf(&rendered.pdf);
    assert_eq!(rendered.sections.len(), 2);
    assert_eq!(rendered.report.stats.images_processed(), 2);
    assert_eq!(count(&rendered.pdf, b"/Subtype /Image"), 1);
}

#[test]
fn test_text_splits_image_sections() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_jpeg(dir.path(), "IMG_a.jpg", 300, 200);
    let b = write_jpeg(dir.path(), "IMG_b.jpg", 300, 200);
    let source = format!("{}\nBetween the two.\n{}\n", a.display(), b.display());

    let rendered = render(&source, &config()).unwrap();
    assert_eq!(rendered.sections.len(), 2);
    assert_eq!(rendered.sections[0].first_line, 1);
    assert_eq!(rendered.sections[1].first_line, 3);
}

// ─── Configuration and files ────────────────────────────────────

#[test]
fn test_config_file_drives_page_setup() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("portfolio.json");
    std::fs::write(
        &config_path,
        r#"{
  "layout": { "seed": 7 },
  "page": { "size": "A4", "landscape": true },
  "fonts": { "heading": [], "body": [], "header": [], "cjk": [] },
  "decor": { "date": "May 2025", "footerUrl": "https://example.com" }
}"#,
    )
    .unwrap();

    let config = Config::load(&config_path).unwrap();
    assert!(config.page.landscape);
    assert_eq!(config.layout.seed, Some(7));

    let md = dir.path().join("trip.md");
    std::fs::write(&md, "### Landscape\n\nWide pages.\n").unwrap();
    let rendered = render_file(&md, &config).unwrap();
    assert_eq!(rendered.report.seed, 7);
    assert_eq!(count(&rendered.pdf, b"/MediaBox [0 0 841.89 595.28]"), 1);
}

#[test]
fn test_page_spec_parsing() {
    let setup = PageSetup::parse("a4-landscape").unwrap();
    assert!(setup.landscape);
    assert!(PageSetup::parse("170x240mm").is_ok());
    assert!(PageSetup::parse("tabloid").is_err());
}

#[test]
fn test_missing_markdown_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = render_file(&dir.path().join("nope.md"), &config());
    assert!(matches!(result, Err(PortfolioError::Io { .. })));
}

#[test]
fn test_duplicate_precheck() {
    let source = "/p/IMG_1.jpg\ntext\n/p/IMG_2.jpg\n/p/IMG_1.jpg\n";
    let dups = find_duplicate_images(source);
    assert_eq!(dups.len(), 1);
    assert_eq!(dups[0].file_name(), "IMG_1.jpg");
    assert_eq!(dups[0].line_numbers, vec![1, 4]);
}
