//! # Autfolio CLI
//!
//! Usage:
//!   autfolio "China 2025.md"
//!   autfolio trip.md -o trip.pdf --page a4-landscape --seed 1756844636
//!   autfolio trip.md --config portfolio.json --dump-layout layout.json

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use autfolio::model::PageSetup;
use autfolio::report::{format_duration, format_file_size, RenderReport};
use autfolio::{find_duplicate_images, Config, PortfolioError};

#[derive(Parser, Debug)]
#[command(name = "autfolio", version, about = "Markdown to photography portfolio PDF")]
struct Cli {
    /// Markdown file to convert
    input: PathBuf,

    /// Output PDF (default: <input>_<page>.pdf next to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Date shown in the page header (default: current month and year)
    #[arg(long)]
    date: Option<String>,

    /// Seed for the collage row packer
    #[arg(long, conflicts_with = "random_seed")]
    seed: Option<u64>,

    /// Generate a new layout from the clock, ignoring any configured seed
    #[arg(long)]
    random_seed: bool,

    /// Page size: a4, a4-landscape, letter, a3, a5 or WxHmm
    #[arg(long, value_parser = PageSetup::parse)]
    page: Option<PageSetup>,

    /// Name placed as the first heading of the document
    #[arg(long)]
    author: Option<String>,

    /// Write the collage units of every image section as JSON
    #[arg(long)]
    dump_layout: Option<PathBuf>,

    /// Continue without asking when duplicate images are found
    #[arg(short, long)]
    yes: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("autfolio=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => {
            println!("\n❌ User aborted the process.");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Returns `Ok(false)` when the user declines to continue past duplicates.
fn run(cli: &Cli) -> Result<bool, PortfolioError> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    apply_overrides(&mut config, cli);

    let source =
        std::fs::read_to_string(&cli.input).map_err(|e| PortfolioError::io(&cli.input, e))?;
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output(&cli.input, &config.page));

    println!("=== Markdown to PDF Portfolio with Smart Collaging ===");
    if !precheck(&source, cli.yes) {
        return Ok(false);
    }

    println!("Converting '{}' to '{}'...", cli.input.display(), output.display());
    if let Some(date) = &config.decor.date {
        println!("Date: {}", date);
    }
    println!();

    let rendered = autfolio::render(&source, &config)?;
    let report = &rendered.report;
    print_processing_summary(report);

    std::fs::write(&output, &rendered.pdf).map_err(|e| PortfolioError::io(&output, e))?;
    println!("✓ PDF successfully created: {}", output.display());
    println!("📁 Final file size: {}", format_file_size(rendered.pdf.len() as u64));

    if let Some(path) = &cli.dump_layout {
        let json = serde_json::to_string_pretty(&rendered.sections)?;
        std::fs::write(path, json).map_err(|e| PortfolioError::io(path, e))?;
        println!("🧩 Layout written to {}", path.display());
    }

    print_final_summary(report);
    Ok(true)
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(date) = &cli.date {
        config.decor.date = Some(date.clone());
    }
    if let Some(author) = &cli.author {
        config.decor.author = Some(author.clone());
    }
    if let Some(page) = &cli.page {
        config.page = page.clone();
    }
    if cli.random_seed {
        config.layout.seed = None;
    } else if let Some(seed) = cli.seed {
        config.layout.seed = Some(seed);
    }
}

/// `<dir>/<stem>_<page name>.pdf`
fn default_output(input: &Path, page: &PageSetup) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "portfolio".to_string());
    input.with_file_name(format!("{}_{}.pdf", stem, page.name()))
}

/// Warn about duplicate image paths and wait for Enter. Returns `false`
/// when stdin closes before the user confirms.
fn precheck(source: &str, assume_yes: bool) -> bool {
    println!("--- Pre-check: Scanning for duplicate image paths ---");
    let duplicates = find_duplicate_images(source);
    if duplicates.is_empty() {
        println!("✓ No duplicate image paths found. Proceeding...\n");
        return true;
    }

    println!("⚠️  Warning: {} duplicate image path(s) found.", duplicates.len());
    println!("   This may be intentional, but please review the list below.");
    for dup in &duplicates {
        let lines: Vec<String> = dup.line_numbers.iter().map(|n| n.to_string()).collect();
        println!("   - Path: {}", dup.file_name());
        println!("     Found on lines: {}", lines.join(", "));
    }
    if assume_yes {
        println!();
        return true;
    }

    print!("\nPress Enter to continue with the PDF generation, or Ctrl+C to abort...");
    let _ = io::stdout().flush();
    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(0) | Err(_) => false,
        Ok(_) => {
            println!();
            true
        }
    }
}

fn print_processing_summary(report: &RenderReport) {
    let stats = &report.stats;
    let total_images = stats.images_processed();
    if total_images > 0 || stats.word_count > 0 {
        println!("📊 CONTENT PROCESSING SUMMARY:");
        if total_images > 0 {
            println!("   📸 Total images processed: {}", total_images);
            println!("   ✅ Images optimized: {}", stats.optimized);
            println!("   ➖ Images unchanged: {}", stats.unchanged);
            if stats.collages_created > 0 {
                println!("   🎨 Collage/grid layouts created: {}", stats.collages_created);
            }
        }
        if stats.word_count > 0 {
            println!("   ✍️  Text content word count: {} words", stats.word_count);
        }
    }

    println!();
    if stats.missing.is_empty() {
        println!("✅ All referenced files were found!");
    } else {
        println!("⚠️  {} missing files found:", stats.missing.len());
        for path in &stats.missing {
            println!("   ❌ {}", path);
        }
    }
    println!();
}

fn print_final_summary(report: &RenderReport) {
    let stats = &report.stats;
    println!();
    println!("=== FINAL SUMMARY ===");
    match &report.title {
        Some(title) => println!("📖 Title: {}", title),
        None => println!("📖 Title: Not specified"),
    }
    println!(
        "📄 PDF created with {} elements on {} pages",
        report.element_count, report.page_count
    );
    let total_images = stats.images_processed();
    if total_images > 0 {
        println!("📸 {} images processed ({} optimized)", total_images, stats.optimized);
        if stats.collages_created > 0 {
            println!("🎨 {} image collage/grid layouts created", stats.collages_created);
        }
    }
    println!("⏱️  Processing time: {}", format_duration(report.processing_time));
    println!("⏱️  PDF build time: {}", format_duration(report.build_time));
    println!("⏱️  Total execution time: {}", format_duration(report.total_time()));

    println!();
    if report.seed_was_specified {
        println!("🌱 The layout was generated using the specified seed: {}", report.seed);
    } else {
        println!("🌱 A new random layout was generated using seed: {}", report.seed);
        println!(
            "   To reuse this exact layout, pass --seed {} or set layout.seed in the config file.",
            report.seed
        );
    }
    if stats.word_count > 0 {
        println!("✍️  Document word count: {} words", stats.word_count);
    }
}
