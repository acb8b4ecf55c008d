//! Structured error types for autfolio.
//!
//! Errors that abort a run (unreadable input, bad configuration, fonts that
//! fail to embed) are [`PortfolioError`]. Per-image failures are
//! [`ImageError`] values which the document pipeline turns into a "missing"
//! placeholder instead of stopping.

use std::path::PathBuf;

use thiserror::Error;

/// The unified error type returned by the public autfolio API.
#[derive(Debug, Error)]
pub enum PortfolioError {
    /// Reading the input document or writing the PDF failed.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The JSON configuration failed to parse.
    #[error("Failed to parse configuration: {source}{}", hint_suffix(.hint))]
    ConfigParse {
        #[source]
        source: serde_json::Error,
        hint: String,
    },

    /// The configuration parsed but holds values the layout engine cannot use.
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    /// A font could not be loaded, parsed, or embedded.
    #[error("Font error: {0}")]
    Font(String),

    /// Layout or PDF generation failed.
    #[error("Render error: {0}")]
    Render(String),
}

impl PortfolioError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PortfolioError::Io {
            path: path.into(),
            source,
        }
    }
}

fn hint_suffix(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for PortfolioError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the configuration schema. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the file truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        PortfolioError::ConfigParse { source: e, hint }
    }
}

/// Why a single image could not be used.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("image file not found: {0}")]
    NotFound(String),

    #[error("failed to read image file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode '{path}': {message}")]
    Decode { path: PathBuf, message: String },

    #[error("unsupported image format for '{0}' (expected JPEG, PNG, GIF or BMP)")]
    Unsupported(PathBuf),

    #[error("image '{0}' has zero width or height")]
    Degenerate(PathBuf),
}
