//! # Autfolio
//!
//! Turns an annotated Markdown file into a dark, photography-first portfolio
//! PDF.
//!
//! A line that is nothing but an image path is a photo. Runs of consecutive
//! photos become a *section*, and every section is split into collage units:
//! justified rows, DJI drone diptychs, vertical grids, full-width singles.
//! The row packer is seeded, so a layout that looks right can be pinned and
//! reproduced exactly.
//!
//! ## Architecture
//!
//! ```text
//! Markdown file
//!       ↓
//!   [markdown]      — Line scanner: headings, lists, code, image runs
//!       ↓
//!   [discovery]     — Find each image, with a fallback volume
//!   [image_loader]  — Decode, downscale, re-encode
//!       ↓
//!   [collage]       — Classify, partition and pack images into units
//!       ↓
//!   [style]/[text]  — Paragraph styles, UAX#14 line breaking
//!       ↓
//!   [layout]        — Flow blocks into pages, header and footer
//!       ↓
//!   [pdf]           — Serialize to PDF bytes
//! ```

pub mod collage;
pub mod config;
pub mod discovery;
pub mod error;
pub mod font;
pub mod image_loader;
pub mod layout;
pub mod markdown;
pub mod model;
pub mod pdf;
pub mod precheck;
pub mod render;
pub mod report;
pub mod style;
pub mod text;

pub use config::Config;
pub use error::{ImageError, PortfolioError};
pub use precheck::{find_duplicate_images, DuplicateImage};
pub use render::{render, render_file, Rendered, SectionDump};
pub use report::RenderReport;
