//! Counters and timings collected during a run, and the human-readable
//! formatting used in the summaries.

use std::time::Duration;

/// What happened to the document's content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Images that were resized or re-compressed.
    pub optimized: usize,
    /// Images embedded from their original data.
    pub unchanged: usize,
    /// Rows of more than one image plus DJI diptychs and grids.
    pub collages_created: usize,
    /// Words of text, excluding image lines.
    pub word_count: usize,
    /// Image paths that could not be found or decoded, in document order.
    pub missing: Vec<String>,
}

impl RenderStats {
    /// Images that made it into the document.
    pub fn images_processed(&self) -> usize {
        self.optimized + self.unchanged
    }
}

/// Outcome of rendering one document.
#[derive(Debug, Clone)]
pub struct RenderReport {
    pub stats: RenderStats,
    /// First `### ` heading of the document.
    pub title: Option<String>,
    /// Seed the row packer was started with.
    pub seed: u64,
    /// The seed came from the configuration or command line rather than
    /// the clock.
    pub seed_was_specified: bool,
    /// Blocks placed into the flow (paragraphs, spacers, collage units).
    pub element_count: usize,
    pub page_count: usize,
    /// Reading, scanning and image processing.
    pub processing_time: Duration,
    /// Page layout and PDF serialization.
    pub build_time: Duration,
}

impl RenderReport {
    pub fn total_time(&self) -> Duration {
        self.processing_time + self.build_time
    }
}

/// `850ms`, `12.3s`, `2m 5.0s`.
pub fn format_duration(duration: Duration) -> String {
    let seconds = duration.as_secs_f64();
    if seconds < 1.0 {
        format!("{:.0}ms", seconds * 1000.0)
    } else if seconds < 60.0 {
        format!("{:.1}s", seconds)
    } else {
        let minutes = (seconds / 60.0).floor();
        format!("{}m {:.1}s", minutes as u64, seconds - minutes * 60.0)
    }
}

/// `512B`, `1.5KB`, `12.0MB`, `1.2GB`.
pub fn format_file_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let size = bytes as f64;
    if size < KB {
        format!("{}B", bytes)
    } else if size < MB {
        format!("{:.1}KB", size / KB)
    } else if size < GB {
        format!("{:.1}MB", size / MB)
    } else {
        format!("{:.1}GB", size / GB)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations() {
        assert_eq!(format_duration(Duration::from_millis(850)), "850ms");
        assert_eq!(format_duration(Duration::from_millis(12_340)), "12.3s");
        assert_eq!(format_duration(Duration::from_millis(125_000)), "2m 5.0s");
        assert_eq!(format_duration(Duration::ZERO), "0ms");
    }

    #[test]
    fn file_sizes() {
        assert_eq!(format_file_size(512), "512B");
        assert_eq!(format_file_size(1536), "1.5KB");
        assert_eq!(format_file_size(12 * 1024 * 1024), "12.0MB");
        assert_eq!(format_file_size(1288490189), "1.2GB");
    }

    #[test]
    fn missing_images_are_not_processed() {
        let stats = RenderStats {
            optimized: 3,
            unchanged: 2,
            missing: vec!["/p/gone.jpg".to_string()],
            ..RenderStats::default()
        };
        assert_eq!(stats.images_processed(), 5);
    }
}
