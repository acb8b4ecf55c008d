//! Image path resolution.
//!
//! Source documents reference photos on external drives. When a drive is
//! mounted under a different volume name than the one in the document, the
//! same relative path is tried under the configured fallback volume.

use std::path::{Path, PathBuf};

use tracing::debug;

/// A resolved image file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    pub path: PathBuf,
    /// The file was found under the fallback volume, not the original path.
    pub used_fallback: bool,
}

/// Rewrite `/Volumes/<Name>/rest` to `/Volumes/<fallback>/rest`.
///
/// Returns `None` for paths outside `/Volumes/` and for paths with nothing
/// after the volume name.
pub fn fallback_path(original: &str, fallback_volume: &str) -> Option<PathBuf> {
    if !original.starts_with("/Volumes/") {
        return None;
    }
    // ["", "Volumes", "<Name>", "rest", ...]
    let parts: Vec<&str> = original.split('/').collect();
    if parts.len() < 4 {
        return None;
    }
    let rest = parts[3..].join("/");
    Some(PathBuf::from(format!("/Volumes/{}/{}", fallback_volume, rest)))
}

/// Find an image at its original path, then under the fallback volume.
pub fn find_image_file(original: &str, fallback_volume: Option<&str>) -> Option<Located> {
    let path = Path::new(original);
    if path.exists() {
        return Some(Located {
            path: path.to_path_buf(),
            used_fallback: false,
        });
    }

    let fallback = fallback_path(original, fallback_volume?)?;
    if fallback.exists() {
        debug!(original, fallback = %fallback.display(), "using fallback volume");
        return Some(Located {
            path: fallback,
            used_fallback: true,
        });
    }
    None
}
